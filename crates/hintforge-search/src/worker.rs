//! Search worker loop.
//!
//! A worker announces itself as idle, receives solution grids one at a
//! time, runs the symmetry search over the shared pattern diagram, and
//! reports every canonical problem rating at or above the configured
//! threshold. In random-solution mode it generates its own solutions
//! instead and never terminates on its own.

use hintforge_core::{Canonicalizer, Puzzle, SolvedGrid};
use hintforge_solver::{Solver, rate};
use log::debug;

use crate::diagram::RowPermutationDiagram;
use crate::message::{Response, SearchConfig, Task};
use crate::queue::{ResponseQueue, TaskQueue};
use crate::searcher::SymmetrySearcher;

/// One search worker bound to a task source and a response sink.
pub struct SearchWorker<'a, T, R> {
    id: usize,
    searcher: SymmetrySearcher,
    canonicalizer: Canonicalizer,
    diagram: &'a RowPermutationDiagram,
    pattern_count: usize,
    config: SearchConfig,
    tasks: T,
    responses: R,
    valid_counts: Vec<u64>,
}

impl<'a, T: TaskQueue, R: ResponseQueue> SearchWorker<'a, T, R> {
    /// Creates a worker searching `pattern_count` patterns through
    /// `diagram`.
    pub fn new(
        id: usize,
        diagram: &'a RowPermutationDiagram,
        pattern_count: usize,
        config: SearchConfig,
        tasks: T,
        responses: R,
    ) -> Self {
        Self {
            id,
            searcher: SymmetrySearcher::new(config.memo_size),
            canonicalizer: Canonicalizer::new(),
            diagram,
            pattern_count,
            config,
            tasks,
            responses,
            valid_counts: Vec::new(),
        }
    }

    /// Runs the worker until an end task arrives. In random-solution
    /// mode this never returns.
    pub fn run(&mut self) {
        debug!("worker {} started", self.id);
        if self.id <= 1 {
            let config = self.config;
            self.responses.enqueue(Response::LogInfo {
                text: format!(
                    "config: rateThreshold={} uaSize={} memoSize={} \
                     digitCountBounds=[{}, {}] randomSolutions={}",
                    config.rate_threshold,
                    config.ua_size,
                    config.memo_size,
                    config.digit_count_bounds.lower,
                    config.digit_count_bounds.upper,
                    config.random_solutions,
                ),
            });
        }
        self.valid_counts = vec![0; self.pattern_count];

        let mut searches = 0_u64;
        if self.config.random_solutions {
            let mut solver = Solver::new(self.config.memo_size);
            loop {
                if let Some(solution) = solver.find_solution(&Puzzle::EMPTY, true) {
                    self.search_solution(&solution);
                    searches += 1;
                }
            }
        }
        loop {
            self.responses.enqueue(Response::WorkerIdle);
            match self.tasks.dequeue() {
                Task::End => break,
                Task::Search { solution } => {
                    self.search_solution(&solution);
                    searches += 1;
                }
            }
        }
        if searches > 0 {
            self.responses.enqueue(Response::AddValidCounts {
                counts: std::mem::take(&mut self.valid_counts),
            });
        }
        self.responses.enqueue(Response::WorkerEnded);
        debug!("worker {} ended after {searches} searches", self.id);
    }

    /// Searches one solution and reports its qualifying problems.
    fn search_solution(&mut self, solution: &SolvedGrid) {
        self.searcher
            .set_solution(solution, self.config.ua_size);
        let hits = self
            .searcher
            .search(self.diagram, self.config.digit_count_bounds);
        let total = hits.len();

        for hit in hits {
            self.valid_counts[hit.pattern_index] += 1;
            let problem = solution.restrict(hit.mask);
            let (canonical, _) = self.canonicalizer.canonicalize_problem(&problem);
            let problem_rate = rate(&canonical);
            if self.config.rate_threshold <= problem_rate {
                self.responses.enqueue(Response::FoundProblem {
                    problem: canonical,
                    rate: problem_rate,
                });
            }
        }
        debug!(
            "worker {}: solution {solution} done, {total} valid problems",
            self.id
        );
    }
}
