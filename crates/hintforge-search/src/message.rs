//! Coordination messages and their wire encoding.
//!
//! The manager hands [`Task`]s to workers and collects [`Response`]s.
//! In-process queues move the values directly; the subprocess transport
//! in [`crate::process`] writes them through the fixed-layout codec
//! defined here. Integers are little endian, grids travel as 81 ASCII
//! digits, and masks as 81-character bit strings.

use std::io::{self, Read, Write};

use hintforge_core::{CellSet, Puzzle, SolvedGrid};

use crate::searcher::DigitCountBounds;

/// Frame kind for a worker asking for its next task.
pub const KIND_NOTIFY: u32 = 0;
/// Frame kind preceding an encoded [`Response`].
pub const KIND_RESPONSE: u32 = 1;

const TASK_END: u32 = 0;
const TASK_SEARCH: u32 = 1;

const RESPONSE_IDLE: u32 = 0;
const RESPONSE_PROBLEM: u32 = 1;
const RESPONSE_LOG: u32 = 2;
const RESPONSE_COUNTS: u32 = 3;
const RESPONSE_ENDED: u32 = 4;

/// Worker-side search parameters, broadcast once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    /// Minimum rate a found problem must reach to be reported.
    pub rate_threshold: i64,
    /// Size limit for unavoidable set discovery per solution.
    pub ua_size: usize,
    /// Uniqueness checker memo size.
    pub memo_size: usize,
    /// Per-digit hint count limits for the symmetry search.
    pub digit_count_bounds: DigitCountBounds,
    /// Search self-generated random solutions instead of a task list.
    pub random_solutions: bool,
}

/// Work handed to a worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Task {
    /// Shut down after reporting accumulated counts.
    End,
    /// Search every registered pattern against one solution grid.
    Search {
        /// The solution to search.
        solution: SolvedGrid,
    },
}

/// Worker output consumed by the manager.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// The worker is ready for another task.
    WorkerIdle,
    /// A uniquely solvable problem at or above the rate threshold.
    FoundProblem {
        /// The problem, already in canonical form.
        problem: Puzzle,
        /// Its unsquashed difficulty rate.
        rate: i64,
    },
    /// A line the manager should log on the worker's behalf.
    LogInfo {
        /// The log line.
        text: String,
    },
    /// Per-pattern counts of valid problems seen by the worker.
    AddValidCounts {
        /// One count per registered pattern.
        counts: Vec<u64>,
    },
    /// The worker has shut down.
    WorkerEnded,
}

/// Startup payload for a worker subprocess: its configuration and the
/// hint patterns to build the search diagram from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerInit {
    /// Search parameters.
    pub config: SearchConfig,
    /// Canonical hint patterns.
    pub hint_masks: Vec<CellSet>,
}

fn malformed(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, format!("malformed {what}"))
}

fn write_u32<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn write_u64<W: Write>(writer: &mut W, value: u64) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

fn read_u64<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut buf = [0; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn write_i64<W: Write>(writer: &mut W, value: i64) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

fn read_i64<R: Read>(reader: &mut R) -> io::Result<i64> {
    let mut buf = [0; 8];
    reader.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

fn write_grid<W: Write>(writer: &mut W, text: &str) -> io::Result<()> {
    debug_assert_eq!(text.len(), 81);
    writer.write_all(text.as_bytes())
}

fn read_grid<R: Read>(reader: &mut R, what: &str) -> io::Result<String> {
    let mut buf = [0; 81];
    reader.read_exact(&mut buf)?;
    String::from_utf8(buf.to_vec()).map_err(|_| malformed(what))
}

fn write_text<W: Write>(writer: &mut W, text: &str) -> io::Result<()> {
    let len = u32::try_from(text.len()).map_err(|_| malformed("text length"))?;
    write_u32(writer, len)?;
    writer.write_all(text.as_bytes())
}

fn read_text<R: Read>(reader: &mut R) -> io::Result<String> {
    let len = read_u32(reader)? as usize;
    let mut buf = vec![0; len];
    reader.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|_| malformed("text"))
}

impl Task {
    /// Writes one task frame.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        match self {
            Self::End => write_u32(writer, TASK_END),
            Self::Search { solution } => {
                write_u32(writer, TASK_SEARCH)?;
                write_grid(writer, &solution.to_string())
            }
        }
    }

    /// Reads one task frame.
    ///
    /// # Errors
    ///
    /// Returns an [`io::ErrorKind::InvalidData`] error on an unknown tag
    /// or an unparsable grid, or any I/O error from `reader`.
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        match read_u32(reader)? {
            TASK_END => Ok(Self::End),
            TASK_SEARCH => {
                let text = read_grid(reader, "solution")?;
                let solution = text.parse().map_err(|_| malformed("solution"))?;
                Ok(Self::Search { solution })
            }
            _ => Err(malformed("task tag")),
        }
    }
}

impl Response {
    /// Writes one response frame.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        match self {
            Self::WorkerIdle => write_u32(writer, RESPONSE_IDLE),
            Self::FoundProblem { problem, rate } => {
                write_u32(writer, RESPONSE_PROBLEM)?;
                write_grid(writer, &problem.to_string())?;
                write_i64(writer, *rate)
            }
            Self::LogInfo { text } => {
                write_u32(writer, RESPONSE_LOG)?;
                write_text(writer, text)
            }
            Self::AddValidCounts { counts } => {
                write_u32(writer, RESPONSE_COUNTS)?;
                let len = u32::try_from(counts.len()).map_err(|_| malformed("count length"))?;
                write_u32(writer, len)?;
                for &count in counts {
                    write_u64(writer, count)?;
                }
                Ok(())
            }
            Self::WorkerEnded => write_u32(writer, RESPONSE_ENDED),
        }
    }

    /// Reads one response frame.
    ///
    /// # Errors
    ///
    /// Returns an [`io::ErrorKind::InvalidData`] error on an unknown tag
    /// or an unparsable payload, or any I/O error from `reader`.
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        match read_u32(reader)? {
            RESPONSE_IDLE => Ok(Self::WorkerIdle),
            RESPONSE_PROBLEM => {
                let text = read_grid(reader, "problem")?;
                let problem = text.parse().map_err(|_| malformed("problem"))?;
                let rate = read_i64(reader)?;
                Ok(Self::FoundProblem { problem, rate })
            }
            RESPONSE_LOG => Ok(Self::LogInfo {
                text: read_text(reader)?,
            }),
            RESPONSE_COUNTS => {
                let len = read_u32(reader)? as usize;
                let mut counts = Vec::with_capacity(len);
                for _ in 0..len {
                    counts.push(read_u64(reader)?);
                }
                Ok(Self::AddValidCounts { counts })
            }
            RESPONSE_ENDED => Ok(Self::WorkerEnded),
            _ => Err(malformed("response tag")),
        }
    }
}

impl WorkerInit {
    /// Writes the startup payload.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_i64(writer, self.config.rate_threshold)?;
        write_u64(writer, self.config.ua_size as u64)?;
        write_u64(writer, self.config.memo_size as u64)?;
        write_u64(writer, self.config.digit_count_bounds.lower as u64)?;
        write_u64(writer, self.config.digit_count_bounds.upper as u64)?;
        write_u32(writer, u32::from(self.config.random_solutions))?;
        let len = u32::try_from(self.hint_masks.len()).map_err(|_| malformed("mask count"))?;
        write_u32(writer, len)?;
        for mask in &self.hint_masks {
            write_grid(writer, &mask.to_bit_string())?;
        }
        Ok(())
    }

    /// Reads the startup payload.
    ///
    /// # Errors
    ///
    /// Returns an [`io::ErrorKind::InvalidData`] error on an unparsable
    /// payload, or any I/O error from `reader`.
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let rate_threshold = read_i64(reader)?;
        let ua_size = read_u64(reader)? as usize;
        let memo_size = read_u64(reader)? as usize;
        let lower = read_u64(reader)? as usize;
        let upper = read_u64(reader)? as usize;
        let random_solutions = match read_u32(reader)? {
            0 => false,
            1 => true,
            _ => return Err(malformed("random solution flag")),
        };
        let len = read_u32(reader)? as usize;
        let mut hint_masks = Vec::with_capacity(len);
        for _ in 0..len {
            let text = read_grid(reader, "hint mask")?;
            let mask = CellSet::from_bit_string(&text).map_err(|_| malformed("hint mask"))?;
            hint_masks.push(mask);
        }
        Ok(Self {
            config: SearchConfig {
                rate_threshold,
                ua_size,
                memo_size,
                digit_count_bounds: DigitCountBounds { lower, upper },
                random_solutions,
            },
            hint_masks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOLUTION: &str =
        "123456789456789123789123456214365897365897214897214365531642978642978531978531642";

    fn round_trip_task(task: &Task) -> Task {
        let mut buf = Vec::new();
        task.write_to(&mut buf).unwrap();
        Task::read_from(&mut buf.as_slice()).unwrap()
    }

    fn round_trip_response(response: &Response) -> Response {
        let mut buf = Vec::new();
        response.write_to(&mut buf).unwrap();
        Response::read_from(&mut buf.as_slice()).unwrap()
    }

    #[test]
    fn task_frames_round_trip() {
        let solution: SolvedGrid = SOLUTION.parse().unwrap();
        assert_eq!(round_trip_task(&Task::End), Task::End);
        assert_eq!(
            round_trip_task(&Task::Search { solution }),
            Task::Search { solution }
        );
    }

    #[test]
    fn response_frames_round_trip() {
        let solution: SolvedGrid = SOLUTION.parse().unwrap();
        let problem = solution.restrict([0, 5, 40, 80].into_iter().collect());
        let responses = [
            Response::WorkerIdle,
            Response::FoundProblem { problem, rate: 12_345 },
            Response::LogInfo {
                text: "worker 3: 7 hits".to_owned(),
            },
            Response::AddValidCounts {
                counts: vec![0, 4, 17],
            },
            Response::WorkerEnded,
        ];
        for response in responses {
            assert_eq!(round_trip_response(&response), response);
        }
    }

    #[test]
    fn init_payload_round_trips() {
        let init = WorkerInit {
            config: SearchConfig {
                rate_threshold: 1_000,
                ua_size: 14,
                memo_size: 100_000,
                digit_count_bounds: DigitCountBounds { lower: 1, upper: 8 },
                random_solutions: true,
            },
            hint_masks: vec![
                [0, 1, 2, 40].into_iter().collect(),
                [10, 20, 30, 70, 80].into_iter().collect(),
            ],
        };
        let mut buf = Vec::new();
        init.write_to(&mut buf).unwrap();
        assert_eq!(WorkerInit::read_from(&mut buf.as_slice()).unwrap(), init);
    }

    #[test]
    fn unknown_tags_are_rejected() {
        let buf = 99_u32.to_le_bytes();
        assert_eq!(
            Task::read_from(&mut buf.as_slice()).unwrap_err().kind(),
            io::ErrorKind::InvalidData
        );
        assert_eq!(
            Response::read_from(&mut buf.as_slice()).unwrap_err().kind(),
            io::ErrorKind::InvalidData
        );
    }

    #[test]
    fn truncated_frames_are_errors() {
        let solution: SolvedGrid = SOLUTION.parse().unwrap();
        let mut buf = Vec::new();
        Task::Search { solution }.write_to(&mut buf).unwrap();
        buf.truncate(buf.len() - 1);
        assert!(Task::read_from(&mut buf.as_slice()).is_err());
    }
}
