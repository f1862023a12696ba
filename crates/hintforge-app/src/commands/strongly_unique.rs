//! `strongly-unique`: canonical digit assignments of a hint mask.
//!
//! An assignment is strongly unique when no digit repeats within a band
//! or a stack and digits are introduced in increasing order along the
//! hint cells. Every assignment of a mask is equivalent to exactly one
//! strongly unique assignment under row, column, and digit relabeling
//! symmetries that keep the mask fixed, so enumerating them covers the
//! assignment space without redundancy.

use std::io::{self, BufWriter, Write};

use clap::Args;

use hintforge_core::CellSet;

use crate::input::{AppError, for_each_token};

const ALL_DIGITS: u32 = (1 << 9) - 1;

/// Enumerates the strongly unique digit assignments of each mask read
/// from standard input.
#[derive(Debug, Args)]
pub struct StronglyUniqueArgs {
    /// Print assignments as concatenated digits instead of full grids.
    #[arg(long)]
    digit_list: bool,

    /// Skip the count line before the assignment list.
    #[arg(long)]
    no_count: bool,

    /// Skip the assignment list and print the count only.
    #[arg(long)]
    no_list: bool,
}

/// Band and stack index of a cell, packed as `band * 3 + stack`.
pub fn box_of(pos: usize) -> usize {
    pos / 27 * 3 + pos % 9 / 3
}

/// Walks every strongly unique assignment of digits to `boxes`, calling
/// `emit` with the zero-based digit per hint in position order.
pub fn for_each_assignment(boxes: &[usize], emit: &mut impl FnMut(&[u8])) {
    let mut digits = Vec::with_capacity(boxes.len());
    let mut band_stack = [0_u32; 6];
    assignment_rec(boxes, 0, &mut digits, &mut band_stack, emit);
}

fn assignment_rec(
    boxes: &[usize],
    used_digits: u32,
    digits: &mut Vec<u8>,
    band_stack: &mut [u32; 6],
    emit: &mut impl FnMut(&[u8]),
) {
    let Some(&cell_box) = boxes.get(digits.len()) else {
        emit(digits);
        return;
    };
    let (band, stack) = (cell_box / 3, cell_box % 3);
    let mut candidates = ALL_DIGITS & !band_stack[band] & !band_stack[3 + stack];
    candidates &= used_digits << 1 | 1;
    while candidates != 0 {
        let digit = candidates.trailing_zeros();
        let dmask = 1 << digit;
        candidates &= !dmask;

        digits.push(digit as u8);
        band_stack[band] |= dmask;
        band_stack[3 + stack] |= dmask;
        assignment_rec(boxes, used_digits | dmask, digits, band_stack, emit);
        band_stack[3 + stack] &= !dmask;
        band_stack[band] &= !dmask;
        digits.pop();
    }
}

/// Runs the command against standard input and output.
///
/// # Errors
///
/// Returns the first input parse error or output write error.
pub fn run(args: &StronglyUniqueArgs) -> Result<(), AppError> {
    let stdin = io::stdin().lock();
    let mut out = BufWriter::new(io::stdout().lock());
    for_each_token(stdin, |token| {
        let mask: CellSet = token.parse()?;
        let poses: Vec<usize> = mask.iter().collect();
        let boxes: Vec<usize> = poses.iter().map(|&pos| box_of(pos)).collect();

        if !args.no_count {
            let mut count = 0_u64;
            for_each_assignment(&boxes, &mut |_| count += 1);
            writeln!(out, "{count}")?;
        }

        if !args.no_list {
            let mut write_error = None;
            for_each_assignment(&boxes, &mut |digits| {
                if write_error.is_some() {
                    return;
                }
                let result = if args.digit_list {
                    let line: String =
                        digits.iter().map(|&d| char::from(b'1' + d)).collect();
                    writeln!(out, "{line}")
                } else {
                    let mut grid = [b'0'; 81];
                    for (&pos, &digit) in poses.iter().zip(digits) {
                        grid[pos] = b'1' + digit;
                    }
                    writeln!(out, "{}", String::from_utf8_lossy(&grid))
                };
                if let Err(err) = result {
                    write_error = Some(err);
                }
            });
            if let Some(err) = write_error {
                return Err(err.into());
            }
        }
        Ok(())
    })?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(boxes: &[usize]) -> u64 {
        let mut n = 0;
        for_each_assignment(boxes, &mut |_| n += 1);
        n
    }

    #[test]
    fn empty_mask_has_one_assignment() {
        assert_eq!(count(&[]), 1);
    }

    #[test]
    fn single_cell_takes_only_the_first_digit() {
        let mut assignments = Vec::new();
        for_each_assignment(&[box_of(40)], &mut |digits| {
            assignments.push(digits.to_vec());
        });
        assert_eq!(assignments, [[0]]);
    }

    #[test]
    fn same_band_cells_take_distinct_digits() {
        // Cells 0 and 3 share a band but not a stack or box.
        let boxes = [box_of(0), box_of(3)];
        let mut assignments = Vec::new();
        for_each_assignment(&boxes, &mut |digits| {
            assignments.push(digits.to_vec());
        });
        assert_eq!(assignments, [[0, 1]]);
    }

    #[test]
    fn unrelated_cells_allow_digit_reuse() {
        // Cells 0 and 40 share neither band nor stack.
        let boxes = [box_of(0), box_of(40)];
        let mut assignments = Vec::new();
        for_each_assignment(&boxes, &mut |digits| {
            assignments.push(digits.to_vec());
        });
        assert_eq!(assignments, [vec![0, 0], vec![0, 1]]);
    }
}
