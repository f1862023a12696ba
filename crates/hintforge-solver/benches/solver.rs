use criterion::{Criterion, criterion_group, criterion_main};
use hintforge_core::{CellSet, Puzzle, SolvedGrid};
use hintforge_solver::{Solver, UaFinder, UniquenessChecker, rate};
use std::hint::black_box;

const SOLUTION: &str = "123456789456789123789123456214365897365897214897214365531642978642978531978531642";

fn solution() -> SolvedGrid {
    SOLUTION.parse().unwrap()
}

fn sparse_problem() -> Puzzle {
    let solution = solution();
    let blank = solution.cells_with_digit(1)
        | solution.cells_with_digit(5)
        | solution.cells_with_digit(9);
    solution.restrict(!blank)
}

fn bench_solve(c: &mut Criterion) {
    let problem = sparse_problem();
    let mut solver = Solver::new(1 << 16);
    c.bench_function("solve_sparse", |b| {
        b.iter(|| solver.solve(black_box(&problem)));
    });
}

fn bench_uniqueness(c: &mut Criterion) {
    let solution = solution();
    let mut checker = UniquenessChecker::new(1 << 16);
    checker.set_solution(&solution);
    let mask = !solution.cells_with_digit(7);
    c.bench_function("uniqueness_masked", |b| {
        b.iter(|| checker.is_solution_unique(black_box(mask)));
    });
    c.bench_function("uniqueness_empty", |b| {
        b.iter(|| checker.is_solution_unique(black_box(CellSet::EMPTY)));
    });
}

fn bench_rate(c: &mut Criterion) {
    let problem = sparse_problem();
    c.bench_function("rate_sparse", |b| {
        b.iter(|| rate(black_box(&problem)));
    });
}

fn bench_ua(c: &mut Criterion) {
    let solution = solution();
    c.bench_function("ua_size_4", |b| {
        b.iter(|| UaFinder::find_all(black_box(&solution), 4));
    });
}

criterion_group!(benches, bench_solve, bench_uniqueness, bench_rate, bench_ua);
criterion_main!(benches);
