//! Blocking queues connecting the manager and its workers.
//!
//! The coordination loop only ever enqueues and dequeues whole
//! messages, so the transports behind it are abstracted as two small
//! traits. The in-process implementations share one [`BoundedQueue`]
//! between threads; [`crate::process`] provides implementations backed
//! by subprocess pipes.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

use crate::message::{Response, Task};

/// Source of tasks for workers, sink for the manager.
pub trait TaskQueue {
    /// Blocks until the task is accepted.
    fn enqueue(&mut self, task: Task);
    /// Blocks until a task is available.
    fn dequeue(&mut self) -> Task;
}

/// Source of responses for the manager, sink for workers.
pub trait ResponseQueue {
    /// Blocks until the response is accepted.
    fn enqueue(&mut self, response: Response);
    /// Blocks until a response is available.
    fn dequeue(&mut self) -> Response;
}

impl<T: TaskQueue + ?Sized> TaskQueue for &mut T {
    fn enqueue(&mut self, task: Task) {
        (**self).enqueue(task);
    }

    fn dequeue(&mut self) -> Task {
        (**self).dequeue()
    }
}

impl<R: ResponseQueue + ?Sized> ResponseQueue for &mut R {
    fn enqueue(&mut self, response: Response) {
        (**self).enqueue(response);
    }

    fn dequeue(&mut self) -> Response {
        (**self).dequeue()
    }
}

/// A bounded FIFO queue; enqueue blocks when full, dequeue when empty.
pub struct BoundedQueue<T> {
    items: Mutex<VecDeque<T>>,
    capacity: usize,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T> BoundedQueue<T> {
    /// Creates a queue holding at most `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be positive");
        // Very large capacities mean "never full" and are not preallocated.
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    /// Appends `item`, blocking while the queue is full.
    pub fn enqueue(&self, item: T) {
        let mut items = self.items.lock().expect("queue mutex poisoned");
        while items.len() == self.capacity {
            items = self.not_full.wait(items).expect("queue mutex poisoned");
        }
        items.push_back(item);
        drop(items);
        self.not_empty.notify_one();
    }

    /// Removes the oldest item, blocking while the queue is empty.
    pub fn dequeue(&self) -> T {
        let mut items = self.items.lock().expect("queue mutex poisoned");
        let item = loop {
            if let Some(item) = items.pop_front() {
                break item;
            }
            items = self.not_empty.wait(items).expect("queue mutex poisoned");
        };
        drop(items);
        self.not_full.notify_one();
        item
    }
}

/// Shared in-process task queue.
#[derive(Clone)]
pub struct InProcessTaskQueue(Arc<BoundedQueue<Task>>);

impl InProcessTaskQueue {
    /// Creates a queue holding at most `capacity` tasks.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self(Arc::new(BoundedQueue::new(capacity)))
    }
}

impl TaskQueue for InProcessTaskQueue {
    fn enqueue(&mut self, task: Task) {
        self.0.enqueue(task);
    }

    fn dequeue(&mut self) -> Task {
        self.0.dequeue()
    }
}

/// Shared in-process response queue.
#[derive(Clone)]
pub struct InProcessResponseQueue(Arc<BoundedQueue<Response>>);

impl InProcessResponseQueue {
    /// Creates a queue holding at most `capacity` responses.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self(Arc::new(BoundedQueue::new(capacity)))
    }
}

impl ResponseQueue for InProcessResponseQueue {
    fn enqueue(&mut self, response: Response) {
        self.0.enqueue(response);
    }

    fn dequeue(&mut self) -> Response {
        self.0.dequeue()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn preserves_fifo_order() {
        let queue = BoundedQueue::new(4);
        for i in 0..4 {
            queue.enqueue(i);
        }
        for i in 0..4 {
            assert_eq!(queue.dequeue(), i);
        }
    }

    #[test]
    fn blocks_producer_at_capacity() {
        let queue = Arc::new(BoundedQueue::new(1));
        let producer = Arc::clone(&queue);
        let handle = thread::spawn(move || {
            for i in 0..100 {
                producer.enqueue(i);
            }
        });
        for i in 0..100 {
            assert_eq!(queue.dequeue(), i);
        }
        handle.join().unwrap();
    }

    #[test]
    fn many_producers_single_consumer() {
        let queue = Arc::new(BoundedQueue::new(3));
        let handles: Vec<_> = (0..4)
            .map(|p| {
                let producer = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..25 {
                        producer.enqueue(p * 100 + i);
                    }
                })
            })
            .collect();
        let mut seen = Vec::new();
        for _ in 0..100 {
            seen.push(queue.dequeue());
        }
        for handle in handles {
            handle.join().unwrap();
        }
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 100);
    }

    #[test]
    fn task_queue_trait_round_trips() {
        let mut queue = InProcessTaskQueue::new(2);
        queue.enqueue(Task::End);
        assert_eq!(queue.dequeue(), Task::End);
    }
}
