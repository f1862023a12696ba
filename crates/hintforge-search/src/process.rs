//! Subprocess transport for the coordination queues.
//!
//! The manager spawns one worker subprocess per slot and speaks the
//! codec from [`crate::message`] over the children's pipes. A worker
//! asks for work by writing a notify frame and then blocking on its
//! stdin; a reader thread per child demultiplexes its output, pushing
//! response frames into the shared response queue and answering each
//! notify frame by forwarding the next backlog task to that child.
//! Dispatch only appends to the backlog and never waits on a worker,
//! so the manager keeps draining responses while every worker is busy.
//!
//! Each side of the transport only uses one direction of each queue
//! trait; the unused direction panics. Transport failures also panic,
//! taking the whole run down rather than continuing with lost workers.

use std::io::{self, BufReader, ErrorKind, Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use log::debug;

use crate::message::{KIND_NOTIFY, KIND_RESPONSE, Response, Task, WorkerInit};
use crate::queue::{BoundedQueue, ResponseQueue, TaskQueue};

/// Manager-side pool of worker subprocesses.
pub struct ProcessPool {
    children: Vec<Child>,
    readers: Vec<JoinHandle<()>>,
    backlog: Arc<BoundedQueue<Task>>,
    responses: Arc<BoundedQueue<Response>>,
}

impl ProcessPool {
    /// Spawns `workers` children from `command` and sends each the
    /// startup payload.
    ///
    /// # Errors
    ///
    /// Returns any error from spawning a child or writing its payload.
    pub fn spawn(
        workers: usize,
        init: &WorkerInit,
        mut command: impl FnMut() -> Command,
    ) -> io::Result<Self> {
        assert!(workers > 0, "process pool requires at least one worker");
        // Dispatch must never block behind worker responses; the backlog
        // holds at most the caller's task count plus one end marker per
        // worker.
        let backlog = Arc::new(BoundedQueue::new(usize::MAX));
        let responses = Arc::new(BoundedQueue::new(workers * 10));
        let mut children = Vec::with_capacity(workers);
        let mut readers = Vec::with_capacity(workers);

        for slot in 0..workers {
            let mut child = command()
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .spawn()?;
            let mut stdin = child.stdin.take().ok_or_else(|| {
                io::Error::other("worker stdin not piped")
            })?;
            let stdout = child.stdout.take().ok_or_else(|| {
                io::Error::other("worker stdout not piped")
            })?;
            init.write_to(&mut stdin)?;
            stdin.flush()?;

            let backlog = Arc::clone(&backlog);
            let responses = Arc::clone(&responses);
            readers.push(thread::spawn(move || {
                read_worker_frames(slot, stdout, stdin, &backlog, &responses);
            }));
            children.push(child);
        }

        Ok(Self {
            children,
            readers,
            backlog,
            responses,
        })
    }

    /// The manager-side task queue.
    #[must_use]
    pub fn task_queue(&self) -> ProcessTaskQueue {
        ProcessTaskQueue {
            backlog: Arc::clone(&self.backlog),
        }
    }

    /// The manager-side response queue.
    #[must_use]
    pub fn response_queue(&self) -> ProcessResponseQueue {
        ProcessResponseQueue {
            responses: Arc::clone(&self.responses),
        }
    }

    /// Waits for every child to exit and every reader thread to drain.
    ///
    /// # Errors
    ///
    /// Returns an error if a child exits with a failure status.
    ///
    /// # Panics
    ///
    /// Panics if a reader thread panicked.
    pub fn wait(mut self) -> io::Result<()> {
        for mut child in self.children.drain(..) {
            let status = child.wait()?;
            if !status.success() {
                return Err(io::Error::other(format!("worker exited with {status}")));
            }
        }
        for reader in self.readers.drain(..) {
            if reader.join().is_err() {
                panic!("worker reader thread panicked");
            }
        }
        Ok(())
    }
}

/// Demultiplexes one child's output, forwarding a backlog task per
/// notify frame.
fn read_worker_frames(
    slot: usize,
    stdout: impl Read,
    mut stdin: impl Write,
    backlog: &BoundedQueue<Task>,
    responses: &BoundedQueue<Response>,
) {
    let mut reader = BufReader::new(stdout);
    loop {
        let mut kind = [0; 4];
        match reader.read_exact(&mut kind) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
                debug!("worker {slot} closed its output");
                return;
            }
            Err(err) => panic!("worker {slot} transport failed: {err}"),
        }
        match u32::from_le_bytes(kind) {
            KIND_NOTIFY => {
                let task = backlog.dequeue();
                if let Err(err) = task.write_to(&mut stdin).and_then(|()| stdin.flush()) {
                    panic!("dispatch to worker {slot} failed: {err}");
                }
            }
            KIND_RESPONSE => match Response::read_from(&mut reader) {
                Ok(response) => responses.enqueue(response),
                Err(err) => panic!("worker {slot} sent a bad response: {err}"),
            },
            other => panic!("worker {slot} sent unknown frame kind {other}"),
        }
    }
}

/// Manager-side task dispatch: tasks wait in the backlog until some
/// worker notifies it is ready to receive.
pub struct ProcessTaskQueue {
    backlog: Arc<BoundedQueue<Task>>,
}

impl TaskQueue for ProcessTaskQueue {
    fn enqueue(&mut self, task: Task) {
        self.backlog.enqueue(task);
    }

    fn dequeue(&mut self) -> Task {
        unreachable!("the manager does not receive tasks");
    }
}

/// Manager-side view of the merged worker responses.
pub struct ProcessResponseQueue {
    responses: Arc<BoundedQueue<Response>>,
}

impl ResponseQueue for ProcessResponseQueue {
    fn enqueue(&mut self, _response: Response) {
        unreachable!("the manager does not send responses");
    }

    fn dequeue(&mut self) -> Response {
        self.responses.dequeue()
    }
}

/// Builds the worker-side queue pair over the process pipes. `output`
/// carries both notify and response frames, so the two halves share it.
pub fn worker_endpoints<R: Read, W: Write>(
    input: R,
    output: W,
) -> (WorkerTaskQueue<R, W>, WorkerResponseQueue<W>) {
    let output = Arc::new(Mutex::new(output));
    (
        WorkerTaskQueue {
            input,
            output: Arc::clone(&output),
        },
        WorkerResponseQueue { output },
    )
}

/// Worker-side task source: notify, then block on the next task.
pub struct WorkerTaskQueue<R, W> {
    input: R,
    output: Arc<Mutex<W>>,
}

impl<R: Read, W: Write> TaskQueue for WorkerTaskQueue<R, W> {
    fn enqueue(&mut self, _task: Task) {
        unreachable!("workers do not send tasks");
    }

    fn dequeue(&mut self) -> Task {
        {
            let mut output = self.output.lock().expect("worker output poisoned");
            let notify = output
                .write_all(&KIND_NOTIFY.to_le_bytes())
                .and_then(|()| output.flush());
            if let Err(err) = notify {
                panic!("worker notify failed: {err}");
            }
        }
        match Task::read_from(&mut self.input) {
            Ok(task) => task,
            Err(err) => panic!("worker task receive failed: {err}"),
        }
    }
}

/// Worker-side response sink.
pub struct WorkerResponseQueue<W> {
    output: Arc<Mutex<W>>,
}

impl<W: Write> ResponseQueue for WorkerResponseQueue<W> {
    fn enqueue(&mut self, response: Response) {
        let mut output = self.output.lock().expect("worker output poisoned");
        let sent = output
            .write_all(&KIND_RESPONSE.to_le_bytes())
            .and_then(|()| response.write_to(&mut *output))
            .and_then(|()| output.flush());
        if let Err(err) = sent {
            panic!("worker response send failed: {err}");
        }
    }

    fn dequeue(&mut self) -> Response {
        unreachable!("workers do not receive responses");
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn worker_dequeue_notifies_then_reads() {
        let mut encoded = Vec::new();
        Task::End.write_to(&mut encoded).unwrap();
        let (mut tasks, _responses) = worker_endpoints(Cursor::new(encoded), Vec::new());
        assert_eq!(tasks.dequeue(), Task::End);
        let output = tasks.output.lock().unwrap();
        assert_eq!(&output[..], KIND_NOTIFY.to_le_bytes());
    }

    #[test]
    fn worker_responses_are_framed() {
        let (_tasks, mut responses) = worker_endpoints(Cursor::new(Vec::new()), Vec::new());
        responses.enqueue(Response::WorkerEnded);
        let output = responses.output.lock().unwrap();
        let mut reader = &output[..];
        let mut kind = [0; 4];
        reader.read_exact(&mut kind).unwrap();
        assert_eq!(u32::from_le_bytes(kind), KIND_RESPONSE);
        assert_eq!(
            Response::read_from(&mut reader).unwrap(),
            Response::WorkerEnded
        );
    }

    #[test]
    fn frame_reader_answers_notify_from_the_backlog() {
        let mut stream = Vec::new();
        stream.extend_from_slice(&KIND_NOTIFY.to_le_bytes());
        stream.extend_from_slice(&KIND_RESPONSE.to_le_bytes());
        Response::WorkerEnded.write_to(&mut stream).unwrap();
        let backlog = BoundedQueue::new(4);
        backlog.enqueue(Task::End);
        let responses = BoundedQueue::new(4);
        let mut stdin = Vec::new();
        read_worker_frames(7, Cursor::new(stream), &mut stdin, &backlog, &responses);
        assert_eq!(Task::read_from(&mut &stdin[..]).unwrap(), Task::End);
        assert_eq!(responses.dequeue(), Response::WorkerEnded);
    }

    #[test]
    fn dispatch_does_not_wait_for_an_idle_worker() {
        // A busy worker streams results while the backlog already holds
        // its end marker; the reader must keep draining responses and
        // deliver the task only on the notify frame.
        let mut stream = Vec::new();
        for _ in 0..3 {
            stream.extend_from_slice(&KIND_RESPONSE.to_le_bytes());
            Response::WorkerEnded.write_to(&mut stream).unwrap();
        }
        stream.extend_from_slice(&KIND_NOTIFY.to_le_bytes());
        let backlog = Arc::new(BoundedQueue::new(usize::MAX));
        let mut queue = ProcessTaskQueue {
            backlog: Arc::clone(&backlog),
        };
        queue.enqueue(Task::End);
        let responses = BoundedQueue::new(8);
        let mut stdin = Vec::new();
        read_worker_frames(0, Cursor::new(stream), &mut stdin, &backlog, &responses);
        for _ in 0..3 {
            assert_eq!(responses.dequeue(), Response::WorkerEnded);
        }
        assert_eq!(Task::read_from(&mut &stdin[..]).unwrap(), Task::End);
    }
}
