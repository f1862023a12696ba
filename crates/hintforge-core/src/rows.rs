//! Row-structured view of a cell mask.
//!
//! A [`RowView`] reinterprets a [`CellSet`] as nine 9-bit row patterns
//! grouped into three bands. Row and band swaps become `u16` swaps, the
//! canonical (sorted) form is a handful of comparisons, and equal rows or
//! bands reveal which permutations act trivially on the pattern. The orbit
//! enumeration here drives both the canonicalizer tests and the
//! row-permutation diagram.
//!
//! Bit layout: `(row, col)` is bit `8 - col` of row `row`, so comparing rows
//! as integers is the lexicographic order of their bit strings.

use std::collections::HashSet;

use crate::cell_set::CellSet;

/// Swap sequences enumerating the distinct arrangements of three slots,
/// indexed by the equality pattern (bit 0: slots 0 and 1 equal, bit 1:
/// slots 1 and 2 equal). Each swap is applied after visiting; a full pass
/// restores the starting arrangement.
pub const UNIQUE_PERMUTATION_SWAPS: [&[(usize, usize)]; 4] = [
    &[(1, 2), (0, 2), (1, 2), (0, 2), (1, 2), (0, 2)],
    &[(1, 2), (0, 1), (0, 2)],
    &[(0, 1), (1, 2), (0, 2)],
    &[(0, 1)],
];

/// Number of distinct arrangements per equality pattern.
pub const UNIQUE_PERMUTATION_ORDERS: [usize; 4] = [6, 3, 3, 1];

/// One band: three 9-bit row patterns.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct BandRows {
    /// Row patterns, column 0 at bit 8.
    pub rows: [u16; 3],
}

impl BandRows {
    /// Packs the three rows into a 27-bit key.
    #[must_use]
    pub const fn to_key(self) -> u32 {
        self.rows[0] as u32 | (self.rows[1] as u32) << 9 | (self.rows[2] as u32) << 18
    }

    /// Inverse of [`to_key`](Self::to_key).
    #[must_use]
    pub const fn from_key(key: u32) -> Self {
        const MASK: u32 = (1 << 9) - 1;
        Self {
            rows: [(key & MASK) as u16, (key >> 9 & MASK) as u16, (key >> 18) as u16],
        }
    }

    /// Equality pattern of the rows within this band.
    #[must_use]
    pub const fn unique_row_pattern(self) -> usize {
        (self.rows[0] == self.rows[1]) as usize | ((self.rows[1] == self.rows[2]) as usize) << 1
    }

    /// Sorts the three rows ascending.
    pub fn canonicalize(&mut self) {
        if self.rows[1] < self.rows[0] {
            self.rows.swap(0, 1);
        }
        if self.rows[2] < self.rows[1] {
            self.rows.swap(1, 2);
        }
        if self.rows[1] < self.rows[0] {
            self.rows.swap(0, 1);
        }
    }
}

/// Equality patterns of a whole [`RowView`]: one pattern for the bands and
/// one per band for its rows. Determines the pattern's row/band
/// symmetry-class order.
#[derive(Clone, Copy, Debug)]
pub struct UniquePermutationPatterns {
    /// Equality pattern of the three bands.
    pub band_pattern: usize,
    /// Equality pattern of the rows within each band.
    pub row_patterns: [usize; 3],
}

impl UniquePermutationPatterns {
    /// Number of distinct row/band rearrangements of the pattern.
    #[must_use]
    pub const fn symmetry_order(self) -> usize {
        UNIQUE_PERMUTATION_ORDERS[self.band_pattern]
            * UNIQUE_PERMUTATION_ORDERS[self.row_patterns[0]]
            * UNIQUE_PERMUTATION_ORDERS[self.row_patterns[1]]
            * UNIQUE_PERMUTATION_ORDERS[self.row_patterns[2]]
    }
}

/// Nine 9-bit row patterns grouped into three bands.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct RowView {
    rows: [u16; 9],
}

impl RowView {
    /// Builds the view from a cell mask.
    #[must_use]
    pub fn from_set(mask: CellSet) -> Self {
        let mut rows = [0; 9];
        for pos in mask {
            rows[pos / 9] |= 1 << (8 - pos % 9);
        }
        Self { rows }
    }

    /// Converts back to a cell mask.
    #[must_use]
    pub fn to_set(self) -> CellSet {
        let mut mask = CellSet::EMPTY;
        for (row, &bits) in self.rows.iter().enumerate() {
            let mut bits = bits;
            while bits != 0 {
                let col = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                mask.insert(row * 9 + (8 - col));
            }
        }
        mask
    }

    /// Returns row `i`, column 0 at bit 8.
    #[must_use]
    pub const fn row(self, i: usize) -> u16 {
        self.rows[i]
    }

    /// Replaces row `i`.
    pub const fn set_row(&mut self, i: usize, bits: u16) {
        self.rows[i] = bits;
    }

    /// Returns band `i`.
    #[must_use]
    pub const fn band(self, i: usize) -> BandRows {
        BandRows { rows: [self.rows[i * 3], self.rows[i * 3 + 1], self.rows[i * 3 + 2]] }
    }

    /// Replaces band `i`.
    pub const fn set_band(&mut self, i: usize, band: BandRows) {
        self.rows[i * 3] = band.rows[0];
        self.rows[i * 3 + 1] = band.rows[1];
        self.rows[i * 3 + 2] = band.rows[2];
    }

    /// Exchanges two rows.
    pub fn swap_rows(&mut self, i: usize, j: usize) {
        self.rows.swap(i, j);
    }

    /// Exchanges two bands.
    pub fn swap_bands(&mut self, i: usize, j: usize) {
        for k in 0..3 {
            self.rows.swap(i * 3 + k, j * 3 + k);
        }
    }

    /// Mirrors the pattern across the main diagonal.
    #[must_use]
    pub fn transpose(self) -> Self {
        let mut res = Self::default();
        for (row, &bits) in self.rows.iter().enumerate() {
            let mut bits = bits;
            while bits != 0 {
                let col = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                res.rows[8 - col] |= 1 << (8 - row);
            }
        }
        res
    }

    /// Sorts rows within each band, then bands, yielding the minimal
    /// row/band rearrangement.
    pub fn canonicalize(&mut self) {
        for i in 0..3 {
            let mut band = self.band(i);
            band.canonicalize();
            self.set_band(i, band);
        }
        self.sort_two_bands(0, 1);
        self.sort_two_bands(1, 2);
        self.sort_two_bands(0, 1);
    }

    fn sort_two_bands(&mut self, i: usize, j: usize) {
        if self.band(j).rows < self.band(i).rows {
            self.swap_bands(i, j);
        }
    }

    /// Equality pattern of the three bands.
    #[must_use]
    pub fn unique_band_pattern(self) -> usize {
        (self.band(0) == self.band(1)) as usize | ((self.band(1) == self.band(2)) as usize) << 1
    }

    /// All equality patterns of the view.
    #[must_use]
    pub fn unique_permutation_patterns(self) -> UniquePermutationPatterns {
        UniquePermutationPatterns {
            band_pattern: self.unique_band_pattern(),
            row_patterns: [
                self.band(0).unique_row_pattern(),
                self.band(1).unique_row_pattern(),
                self.band(2).unique_row_pattern(),
            ],
        }
    }
}

/// Visits every distinct row/band rearrangement of `rows` exactly once.
pub fn for_each_row_permutation(mut rows: RowView, mut f: impl FnMut(&RowView)) {
    rows.canonicalize();
    let patterns = rows.unique_permutation_patterns();
    let band_swaps = UNIQUE_PERMUTATION_SWAPS[patterns.band_pattern];
    let mut row_swaps = [
        UNIQUE_PERMUTATION_SWAPS[patterns.row_patterns[0]],
        UNIQUE_PERMUTATION_SWAPS[patterns.row_patterns[1]],
        UNIQUE_PERMUTATION_SWAPS[patterns.row_patterns[2]],
    ];

    // Each swap is applied after its visit; a full pass through a swap list
    // returns the rows to their starting arrangement.
    for &(a, b) in band_swaps {
        for &(r0a, r0b) in row_swaps[0] {
            for &(r1a, r1b) in row_swaps[1] {
                for &(r2a, r2b) in row_swaps[2] {
                    f(&rows);
                    rows.swap_rows(6 + r2a, 6 + r2b);
                }
                rows.swap_rows(3 + r1a, 3 + r1b);
            }
            rows.swap_rows(r0a, r0b);
        }
        rows.swap_bands(a, b);
        row_swaps.swap(a, b);
    }
}

/// Visits one representative per distinct column/stack/transpose image of
/// `rows`, each canonicalized in its row/band class.
pub fn for_each_unique_column_permutation(rows: RowView, mut f: impl FnMut(&RowView)) {
    let mut rows = rows;
    rows.canonicalize();
    let mut cols = rows.transpose();
    cols.canonicalize();
    let mut visited = HashSet::new();
    for _ in 0..2 {
        for_each_row_permutation(cols, |r| {
            let mut t = r.transpose();
            t.canonicalize();
            if visited.insert(t) {
                f(&t);
            }
        });
        if rows == cols {
            break;
        }
        std::mem::swap(&mut cols, &mut rows);
    }
}

/// Visits every element of the full symmetry orbit of `rows` exactly once.
pub fn for_each_unique_permutation(rows: RowView, mut f: impl FnMut(&RowView)) {
    for_each_unique_column_permutation(rows, |r| {
        for_each_row_permutation(*r, &mut f);
    });
}

/// Returns the whole symmetry orbit of `mask`, without duplicates.
#[must_use]
pub fn enumerate_orbit(mask: CellSet) -> Vec<CellSet> {
    let mut res = Vec::new();
    for_each_unique_permutation(RowView::from_set(mask), |rows| {
        res.push(rows.to_set());
    });
    res
}

/// Size of the symmetry orbit of `mask`.
#[must_use]
pub fn symmetry_order(mask: CellSet) -> usize {
    let mut res = 0;
    for_each_unique_column_permutation(RowView::from_set(mask), |rows| {
        res += rows.unique_permutation_patterns().symmetry_order();
    });
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_mask(rows: &[usize]) -> CellSet {
        let mut mask = CellSet::EMPTY;
        for &row in rows {
            for col in 0..9 {
                mask.insert(row * 9 + col);
            }
        }
        mask
    }

    #[test]
    fn test_round_trip() {
        let mask = CellSet::from_iter([0, 8, 40, 72, 80]);
        let rows = RowView::from_set(mask);
        assert_eq!(rows.to_set(), mask);
    }

    #[test]
    fn test_bit_layout_has_column_zero_at_msb() {
        let rows = RowView::from_set(CellSet::from_iter([0]));
        assert_eq!(rows.row(0), 1 << 8);
        let rows = RowView::from_set(CellSet::from_iter([8]));
        assert_eq!(rows.row(0), 1);
    }

    #[test]
    fn test_transpose_involution() {
        let mask = CellSet::from_iter([1, 9, 20, 35, 46, 60, 77]);
        let rows = RowView::from_set(mask);
        assert_eq!(rows.transpose().transpose(), rows);
    }

    #[test]
    fn test_band_key_round_trip() {
        let band = BandRows { rows: [0b1_0110_0101, 0, 0b1_1111_1111] };
        assert_eq!(BandRows::from_key(band.to_key()), band);
    }

    #[test]
    fn test_row_permutation_counts() {
        // Three distinct rows in one band: 6 row orders, bands 2 and 3 empty
        // and equal, so band order 3. Total 18 distinct arrangements.
        let mask = CellSet::from_iter([0, 10, 20]);
        let mut count = 0;
        let mut seen = HashSet::new();
        for_each_row_permutation(RowView::from_set(mask), |rows| {
            count += 1;
            assert!(seen.insert(*rows));
        });
        assert_eq!(count, 18);
    }

    #[test]
    fn test_row_permutation_degenerate_band() {
        // Full rows are equal under any order within their band.
        let mask = row_mask(&[0, 1, 2]);
        let mut count = 0;
        for_each_row_permutation(RowView::from_set(mask), |_| count += 1);
        // One full band, two empty bands: 3 distinct band orders only.
        assert_eq!(count, 3);
    }

    #[test]
    fn test_orbit_has_no_duplicates() {
        let mask = CellSet::from_iter([0, 1, 12, 30]);
        let orbit = enumerate_orbit(mask);
        let unique: HashSet<_> = orbit.iter().copied().collect();
        assert_eq!(unique.len(), orbit.len());
        assert_eq!(orbit.len(), symmetry_order(mask));
        assert!(unique.contains(&mask));
    }

    #[test]
    fn test_orbit_of_single_cell() {
        // Rows and columns move independently, so one cell reaches all 81
        // positions.
        let orbit = enumerate_orbit(CellSet::from_iter([40]));
        assert_eq!(orbit.len(), 81);
    }

    #[test]
    fn test_full_and_empty_orbits_are_trivial() {
        assert_eq!(enumerate_orbit(CellSet::EMPTY), vec![CellSet::EMPTY]);
        assert_eq!(enumerate_orbit(CellSet::FULL), vec![CellSet::FULL]);
        assert_eq!(symmetry_order(CellSet::EMPTY), 1);
        assert_eq!(symmetry_order(CellSet::FULL), 1);
    }
}
