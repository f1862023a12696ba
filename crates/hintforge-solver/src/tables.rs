//! Shared lookup tables.
//!
//! Unit geometry, adjacency masks, claim patterns, and the random hash
//! coefficients used for memo keys. Everything here is process-wide immutable
//! state behind [`LazyLock`] initializers; consumers take shared references
//! and never observe partial initialization. Hash coefficients come from a
//! fixed-seed PCG stream so memo keys are reproducible across runs and
//! processes.

use std::sync::LazyLock;

use hintforge_core::CellSet;
use rand::{RngExt, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// 9-bit candidate mask with every digit live.
pub const FULL_MASK: u16 = (1 << 9) - 1;

/// Returns the cell at `index` within `unit` (rows 0..9, columns 9..18,
/// blocks 18..27).
#[must_use]
pub const fn unit_cell(unit: usize, index: usize) -> usize {
    if unit < 9 {
        unit * 9 + index
    } else if unit < 18 {
        index * 9 + (unit - 9)
    } else {
        let t = unit - 18;
        (t / 3 * 3 + index / 3) * 9 + (t % 3 * 3 + index % 3)
    }
}

/// Returns the unit of `cell` for `unit_type` 0 (row), 1 (column), 2 (block).
#[must_use]
pub const fn cell_unit(cell: usize, unit_type: usize) -> usize {
    match unit_type {
        0 => cell / 9,
        1 => 9 + cell % 9,
        _ => 18 + cell / 9 / 3 * 3 + cell % 9 / 3,
    }
}

/// Returns the index of `cell` within its `unit_type` unit.
#[must_use]
pub const fn cell_unit_index(cell: usize, unit_type: usize) -> usize {
    match unit_type {
        0 => cell % 9,
        1 => cell / 9,
        _ => cell / 9 % 3 * 3 + cell % 9 % 3,
    }
}

/// Claim patterns for box-line reduction.
///
/// Indexed by a 9-bit unit candidate mask. The low 2 bits hold `1 + j` when
/// every candidate lies in consecutive triple `j` (a box row, or a box seen
/// along a line); bits 2.. hold `1 + j` when every candidate lies in column
/// triple `j` of a box. Zero means no claim.
pub static CLAIM_PATTERNS: LazyLock<[u8; 512]> = LazyLock::new(|| {
    let mut table = [0u8; 512];
    for j in 0..3 {
        let a = 1usize << (j * 3);
        let (b, c) = (a << 1, a << 2);
        for mask in [a | b, a | c, b | c, a | b | c] {
            table[mask] |= j as u8 + 1;
        }
    }
    for j in 0..3 {
        let a = 1usize << j;
        let (b, c) = (a << 3, a << 6);
        for mask in [a | b, a | c, b | c, a | b | c] {
            table[mask] |= (j as u8 + 1) << 2;
        }
    }
    table
});

/// Cell masks of the 27 units.
pub static UNIT_MASKS: LazyLock<[CellSet; 27]> = LazyLock::new(|| {
    std::array::from_fn(|unit| (0..9).map(|index| unit_cell(unit, index)).collect())
});

/// For each cell, the cells sharing none of its units.
pub static NONADJACENCY_MASKS: LazyLock<[CellSet; 81]> = LazyLock::new(|| {
    std::array::from_fn(|cell| {
        let adjacent = UNIT_MASKS[cell_unit(cell, 0)]
            | UNIT_MASKS[cell_unit(cell, 1)]
            | UNIT_MASKS[cell_unit(cell, 2)];
        !adjacent
    })
});

/// Hash coefficients for the propagation board: one word per (cell, digit),
/// plus the empty-board hash (the XOR of them all).
pub struct BoardHashCoeffs {
    /// `coeffs[cell][digit]`.
    pub coeffs: [[u64; 9]; 81],
    /// Hash of a board with every candidate live.
    pub initial: u64,
}

/// Board hash coefficients, fixed across runs.
pub static BOARD_HASH_COEFFS: LazyLock<BoardHashCoeffs> = LazyLock::new(|| {
    let mut rng = Pcg64Mcg::seed_from_u64(0x9e37_79b9_7f4a_7c15);
    let mut coeffs = [[0u64; 9]; 81];
    let mut initial = 0;
    for cell in coeffs.iter_mut() {
        for coeff in cell.iter_mut() {
            *coeff = rng.random();
            initial ^= *coeff;
        }
    }
    BoardHashCoeffs { coeffs, initial }
});

/// Hash coefficients for the uniqueness oracle.
pub struct OracleHashCoeffs {
    /// Multipliers for the 18 packed words of the nine digit boards, plus a
    /// leading additive constant.
    pub word_coeffs: [u64; 19],
    /// `cell_coeffs[cell][digit]`, XORed into the key per assignment.
    pub cell_coeffs: [[u64; 9]; 81],
}

/// Oracle hash coefficients, fixed across runs.
pub static ORACLE_HASH_COEFFS: LazyLock<OracleHashCoeffs> = LazyLock::new(|| {
    let mut rng = Pcg64Mcg::seed_from_u64(0xc2b2_ae3d_27d4_eb4f);
    let mut word_coeffs = [0u64; 19];
    for coeff in &mut word_coeffs {
        *coeff = rng.random();
    }
    let mut cell_coeffs = [[0u64; 9]; 81];
    for cell in cell_coeffs.iter_mut() {
        for coeff in cell.iter_mut() {
            *coeff = rng.random();
        }
    }
    OracleHashCoeffs { word_coeffs, cell_coeffs }
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_cell_round_trip() {
        for unit in 0..27 {
            for index in 0..9 {
                let cell = unit_cell(unit, index);
                let unit_type = match unit {
                    0..9 => 0,
                    9..18 => 1,
                    _ => 2,
                };
                assert_eq!(cell_unit(cell, unit_type), unit);
                assert_eq!(cell_unit_index(cell, unit_type), index);
            }
        }
    }

    #[test]
    fn test_unit_masks_cover_the_board_thrice() {
        for unit_type in 0..3 {
            let mut all = CellSet::EMPTY;
            for unit in (unit_type * 9)..(unit_type * 9 + 9) {
                assert_eq!(UNIT_MASKS[unit].len(), 9);
                assert!(!all.intersects(UNIT_MASKS[unit]));
                all |= UNIT_MASKS[unit];
            }
            assert_eq!(all, CellSet::FULL);
        }
    }

    #[test]
    fn test_nonadjacency_excludes_own_units() {
        let mask = NONADJACENCY_MASKS[40];
        assert!(!mask.contains(40));
        // Row 4, column 4, and the center block are all excluded.
        assert!(!mask.contains(36));
        assert!(!mask.contains(4));
        assert!(!mask.contains(30));
        assert!(mask.contains(0));
        assert_eq!(mask.len(), 81 - 21);
    }

    #[test]
    fn test_claim_patterns() {
        let table = &*CLAIM_PATTERNS;
        assert_eq!(table[0b000_000_011] & 3, 1);
        assert_eq!(table[0b000_111_000] & 3, 2);
        assert_eq!(table[0b100_100_100] >> 2, 3);
        assert_eq!(table[0b000_001_001] >> 2, 1);
        // Spanning two triples claims nothing.
        assert_eq!(table[0b000_001_010], 0);
    }
}
