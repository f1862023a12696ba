//! Symmetry-reduced puzzle discovery and its coordination layer.
//!
//! [`RowPermutationDiagram`] compresses the row and band rearrangements
//! of a batch of hint patterns into one shared graph; a
//! [`SymmetrySearcher`] walks it against a solution grid, pruning with
//! that solution's unavoidable sets, and emits every uniquely solvable
//! hint mask. [`SubsetSearcher`] answers the complementary question of
//! the fewest hints needed inside a fixed superset of cells.
//!
//! The coordination half distributes the search: a manager feeds
//! solutions to [`SearchWorker`]s over [`TaskQueue`]/[`ResponseQueue`]
//! pairs, which are backed either by in-process bounded queues or by
//! worker subprocesses speaking the codec in [`message`].

pub mod diagram;
pub mod manager;
pub mod message;
pub mod process;
pub mod queue;
pub mod searcher;
pub mod subset;
pub mod worker;

pub use self::diagram::{DiagramEdge, RowPermutationDiagram, Target};
pub use self::manager::{CombineSummary, combine_multithreaded, run_manager};
pub use self::message::{Response, SearchConfig, Task, WorkerInit};
pub use self::process::{ProcessPool, worker_endpoints};
pub use self::queue::{
    BoundedQueue, InProcessResponseQueue, InProcessTaskQueue, ResponseQueue, TaskQueue,
};
pub use self::searcher::{DigitCountBounds, SearchHit, SymmetrySearcher};
pub use self::subset::SubsetSearcher;
pub use self::worker::SearchWorker;
