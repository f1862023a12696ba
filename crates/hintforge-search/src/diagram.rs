//! Compressed row-permutation diagram.
//!
//! For a batch of canonical hint patterns, the diagram encodes every
//! row and band rearrangement of every unique column image of every
//! pattern as a root-to-leaf path of nine row-pattern edges. Shared
//! prefixes collapse into shared nodes, so the searcher walks each
//! common prefix once for the whole batch.
//!
//! Construction runs twice over the same input: a measurement pass that
//! only counts nodes, leaves, and edges, then an allocation pass that
//! fills fixed-size pools. Downstream references are `u32` offsets into
//! those pools; build aborts before overflowing them.

use std::collections::HashMap;

use hintforge_core::{
    CellSet,
    rows::{BandRows, RowView, for_each_unique_column_permutation},
};
use log::{debug, info};

/// Reference to a diagram node or leaf.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Target {
    /// Interior node index.
    Node(u32),
    /// Leaf index.
    Leaf(u32),
}

/// One outgoing edge: a 9-bit row pattern and where it leads.
#[derive(Clone, Copy, Debug)]
pub struct DiagramEdge {
    row_mask: u16,
    to_leaf: bool,
    target: u32,
}

impl DiagramEdge {
    /// The row pattern consumed by following this edge.
    #[must_use]
    pub fn row_mask(&self) -> u16 {
        self.row_mask
    }

    /// Where the edge leads.
    #[must_use]
    pub fn target(&self) -> Target {
        if self.to_leaf {
            Target::Leaf(self.target)
        } else {
            Target::Node(self.target)
        }
    }
}

impl Default for DiagramEdge {
    fn default() -> Self {
        Self {
            row_mask: 0,
            to_leaf: false,
            target: u32::MAX,
        }
    }
}

#[derive(Clone, Copy, Default)]
struct DiagramNode {
    begin: u32,
    end: u32,
}

/// Read-only diagram shared by all workers.
pub struct RowPermutationDiagram {
    nodes: Vec<DiagramNode>,
    leaves: Vec<u32>,
    edges: Vec<DiagramEdge>,
    root: u32,
}

impl RowPermutationDiagram {
    /// Builds the diagram for `patterns`.
    ///
    /// # Panics
    ///
    /// Panics if the edge pool would overflow its `u32` index range.
    #[must_use]
    pub fn build(patterns: &[CellSet]) -> Self {
        let mut entries = Vec::new();
        let mut total_symmetries: u64 = 0;
        for (index, &pattern) in patterns.iter().enumerate() {
            for_each_unique_column_permutation(RowView::from_set(pattern), |rows| {
                total_symmetries += rows.unique_permutation_patterns().symmetry_order() as u64;
                entries.push(DiagramEntry {
                    rows: *rows,
                    pattern_index: index as u32,
                });
            });
        }
        info!(
            "diagram: {} leaves, {total_symmetries} symmetries",
            entries.len()
        );

        let mut builder = Builder::new(true);
        builder.build(&entries);
        assert_eq!(builder.total_leaves as usize, entries.len());
        assert!(
            builder.total_edges < u64::from(u32::MAX),
            "diagram edge pool exceeds the representable index range"
        );
        info!(
            "diagram: {} nodes, {} edges",
            builder.total_nodes, builder.total_edges
        );

        let mut pools = Builder::new(false);
        pools.nodes = vec![DiagramNode::default(); builder.total_nodes as usize];
        pools.leaves = vec![0; builder.total_leaves as usize];
        pools.edges = vec![DiagramEdge::default(); builder.total_edges as usize];
        let root = pools.build(&entries);
        debug_assert_eq!(u64::from(pools.edge_cursor), builder.total_edges);
        debug!("diagram: built");

        Self {
            nodes: pools.nodes,
            leaves: pools.leaves,
            edges: pools.edges,
            root,
        }
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> u32 {
        self.root
    }

    /// Outgoing edges of `node`.
    #[must_use]
    pub fn edges(&self, node: u32) -> &[DiagramEdge] {
        let n = &self.nodes[node as usize];
        &self.edges[n.begin as usize..n.end as usize]
    }

    /// The pattern index tagged on `leaf`.
    #[must_use]
    pub fn leaf_pattern(&self, leaf: u32) -> usize {
        self.leaves[leaf as usize] as usize
    }

    /// Number of leaves.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Total root-to-leaf paths. Equals the summed symmetry orbit sizes
    /// of the registered patterns.
    #[must_use]
    pub fn count_paths(&self) -> u64 {
        let mut memo = vec![u64::MAX; self.nodes.len()];
        self.count_paths_from(self.root, &mut memo)
    }

    fn count_paths_from(&self, node: u32, memo: &mut [u64]) -> u64 {
        if memo[node as usize] != u64::MAX {
            return memo[node as usize];
        }
        let mut total = 0;
        for edge in self.edges(node) {
            total += match edge.target() {
                Target::Leaf(_) => 1,
                Target::Node(child) => self.count_paths_from(child, memo),
            };
        }
        memo[node as usize] = total;
        total
    }
}

struct DiagramEntry {
    rows: RowView,
    pattern_index: u32,
}

struct BandEdge {
    to: Target,
    band: BandRows,
}

struct BandNode {
    node: u32,
    edges: Vec<BandEdge>,
}

/// Key of a band-level node: the keys of the consumed bands, packed in
/// band index order.
fn partial_bands_key(rows: &RowView, mask: usize) -> u64 {
    let mut key = 0;
    let mut bits = mask;
    while bits != 0 {
        let i = bits.trailing_zeros() as usize;
        bits &= bits - 1;
        key = key << 32 | u64::from(rows.band(i).to_key());
    }
    key
}

fn rows_from_partial_key(count: usize, mut key: u64) -> RowView {
    let mut rows = RowView::default();
    for i in (0..count).rev() {
        rows.set_band(i, BandRows::from_key(key as u32 & 0x7ff_ffff));
        key >>= 32;
    }
    rows
}

/// Key of a row-level node: the consumed rows of the band, compacted in
/// row index order.
fn partial_band_key(band: BandRows, mask: usize) -> u32 {
    let mut t = BandRows::default();
    let mut k = 0;
    let mut bits = mask;
    while bits != 0 {
        let i = bits.trailing_zeros() as usize;
        bits &= bits - 1;
        t.rows[k] = band.rows[i];
        k += 1;
    }
    t.to_key()
}

/// Two-pass pool builder. The measurement pass and the allocation pass
/// allocate node and leaf indices with identical counter arithmetic, so
/// the totals of the first pass size the pools of the second exactly.
struct Builder {
    measure: bool,
    total_nodes: u64,
    total_leaves: u64,
    total_edges: u64,
    edge_cursor: u32,
    nodes: Vec<DiagramNode>,
    leaves: Vec<u32>,
    edges: Vec<DiagramEdge>,
}

impl Builder {
    fn new(measure: bool) -> Self {
        Self {
            measure,
            total_nodes: 0,
            total_leaves: 0,
            total_edges: 0,
            edge_cursor: 0,
            nodes: Vec::new(),
            leaves: Vec::new(),
            edges: Vec::new(),
        }
    }

    fn new_node(&mut self) -> u32 {
        let index = self.total_nodes as u32;
        self.total_nodes += 1;
        index
    }

    fn new_leaf(&mut self, pattern_index: u32) -> u32 {
        let index = self.total_leaves as u32;
        self.total_leaves += 1;
        if !self.measure {
            self.leaves[index as usize] = pattern_index;
        }
        index
    }

    fn make_edge(row_mask: u16, target: Target) -> DiagramEdge {
        match target {
            Target::Leaf(i) => DiagramEdge {
                row_mask,
                to_leaf: true,
                target: i,
            },
            Target::Node(i) => DiagramEdge {
                row_mask,
                to_leaf: false,
                target: i,
            },
        }
    }

    /// Builds the band-level skeleton and expands every band node into
    /// row-pattern edges; returns the root node index.
    fn build(&mut self, entries: &[DiagramEntry]) -> u32 {
        let mut node_maps: [HashMap<u64, BandNode>; 3] =
            [HashMap::new(), HashMap::new(), HashMap::new()];

        let root = self.new_node();
        node_maps[0].insert(
            0,
            BandNode {
                node: root,
                edges: Vec::new(),
            },
        );

        for entry in entries {
            let rows = &entry.rows;
            let pattern = rows.unique_band_pattern();
            let leaf = self.new_leaf(entry.pattern_index);

            for mask in [0b001_usize, 0b010, 0b100] {
                if (mask == 0b010 && pattern & 1 != 0) || (mask == 0b100 && pattern & 2 != 0) {
                    continue;
                }
                let key = partial_bands_key(rows, mask);
                if !node_maps[1].contains_key(&key) {
                    let node = self.new_node();
                    node_maps[1].insert(
                        key,
                        BandNode {
                            node,
                            edges: Vec::new(),
                        },
                    );
                }
            }

            // The pair node missing band `i` gets a band edge labeled with
            // that band, leading to the leaf.
            for (mask, band) in [(0b011_usize, 2_usize), (0b101, 1), (0b110, 0)] {
                if (band == 1 && pattern & 2 != 0) || (band == 0 && pattern & 1 != 0) {
                    continue;
                }
                let key = partial_bands_key(rows, mask);
                if !node_maps[2].contains_key(&key) {
                    let node = self.new_node();
                    node_maps[2].insert(
                        key,
                        BandNode {
                            node,
                            edges: Vec::new(),
                        },
                    );
                }
                let pair = node_maps[2]
                    .get_mut(&key)
                    .expect("inserted above when absent");
                pair.edges.push(BandEdge {
                    to: Target::Leaf(leaf),
                    band: rows.band(band),
                });
            }
        }

        // Link each level to its parents, deduplicating equal bands.
        for k in (1..=2).rev() {
            let keys: Vec<u64> = node_maps[k].keys().copied().collect();
            for key in keys {
                let rows = rows_from_partial_key(k, key);
                let node = node_maps[k][&key].node;
                let unique_bands: &[usize] = if k == 2 {
                    if rows.band(0) == rows.band(1) {
                        &[1]
                    } else {
                        &[0, 1]
                    }
                } else {
                    &[0]
                };
                for &i in unique_bands {
                    let parent_mask = ((1 << k) - 1) & !(1 << i);
                    let parent_key = partial_bands_key(&rows, parent_mask);
                    let parent = node_maps[k - 1]
                        .get_mut(&parent_key)
                        .expect("band prefixes are inserted before linking");
                    parent.edges.push(BandEdge {
                        to: Target::Node(node),
                        band: rows.band(i),
                    });
                }
            }
        }

        for level in &node_maps {
            for band_node in level.values() {
                self.build_band_rows(band_node.node, &band_node.edges);
            }
        }

        root
    }

    /// Expands one band node's outgoing band edges into three levels of
    /// row-pattern edges and writes its edge lists into the shared pool.
    fn build_band_rows(&mut self, band_root: u32, band_edges: &[BandEdge]) {
        let mut node_maps: [HashMap<u32, (u32, Vec<DiagramEdge>)>; 3] =
            [HashMap::new(), HashMap::new(), HashMap::new()];
        node_maps[0].insert(
            partial_band_key(BandRows::default(), 0),
            (band_root, Vec::new()),
        );

        for edge in band_edges {
            let band = edge.band;
            let pattern = band.unique_row_pattern();

            for mask in [0b001_usize, 0b010, 0b100] {
                if (mask == 0b010 && pattern & 1 != 0) || (mask == 0b100 && pattern & 2 != 0) {
                    continue;
                }
                let key = partial_band_key(band, mask);
                if !node_maps[1].contains_key(&key) {
                    let node = self.new_node();
                    node_maps[1].insert(key, (node, Vec::new()));
                }
            }

            let mut unique_indices = 0b100_usize;
            if pattern & 2 == 0 {
                unique_indices |= 0b010;
            }
            if pattern & 1 == 0 {
                unique_indices |= 0b001;
            }
            while unique_indices != 0 {
                let i = unique_indices.trailing_zeros() as usize;
                unique_indices &= unique_indices - 1;
                let key = partial_band_key(band, 0b111 & !(1 << i));
                if !node_maps[2].contains_key(&key) {
                    let node = self.new_node();
                    node_maps[2].insert(key, (node, Vec::new()));
                }
                self.total_edges += 1;
                if !self.measure {
                    let pair = node_maps[2]
                        .get_mut(&key)
                        .expect("inserted above when absent");
                    pair.1.push(Self::make_edge(band.rows[i], edge.to));
                }
            }
        }

        for k in (1..=2).rev() {
            let keys: Vec<u32> = node_maps[k].keys().copied().collect();
            for key in keys {
                let band = BandRows::from_key(key);
                let node = node_maps[k][&key].0;
                let unique_indices: &[usize] = if k == 2 {
                    if band.rows[0] == band.rows[1] {
                        &[1]
                    } else {
                        &[0, 1]
                    }
                } else {
                    &[0]
                };
                for &i in unique_indices {
                    let parent_key = partial_band_key(band, ((1 << k) - 1) & !(1 << i));
                    self.total_edges += 1;
                    if !self.measure {
                        let parent = node_maps[k - 1]
                            .get_mut(&parent_key)
                            .expect("row prefixes are inserted before linking");
                        parent
                            .1
                            .push(Self::make_edge(band.rows[i], Target::Node(node)));
                    }
                }
            }
        }

        if !self.measure {
            for level in &node_maps {
                for (node, edge_list) in level.values() {
                    let begin = self.edge_cursor;
                    for &edge in edge_list {
                        self.edges[self.edge_cursor as usize] = edge;
                        self.edge_cursor += 1;
                    }
                    let n = &mut self.nodes[*node as usize];
                    n.begin = begin;
                    n.end = self.edge_cursor;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use hintforge_core::rows::symmetry_order;

    use super::*;

    fn pattern(bits: &[usize]) -> CellSet {
        bits.iter().copied().collect()
    }

    #[test]
    fn single_pattern_paths_match_symmetry_order() {
        let mask = pattern(&[0, 1, 9, 10, 40, 60, 77]);
        let diagram = RowPermutationDiagram::build(&[mask]);
        assert_eq!(diagram.count_paths(), symmetry_order(mask) as u64);
    }

    #[test]
    fn shared_patterns_paths_add_up() {
        let masks = [
            pattern(&[0, 1, 2, 3, 4]),
            pattern(&[0, 10, 20, 30, 40, 50, 60, 70, 80]),
            pattern(&[4, 13, 22, 40, 58, 67, 76]),
        ];
        let diagram = RowPermutationDiagram::build(&masks);
        let expected: u64 = masks.iter().map(|&m| symmetry_order(m) as u64).sum();
        assert_eq!(diagram.count_paths(), expected);
    }

    #[test]
    fn leaf_tags_stay_in_range() {
        let masks = [pattern(&[0, 1, 2]), pattern(&[40, 41, 50])];
        let diagram = RowPermutationDiagram::build(&masks);
        assert!(diagram.leaf_count() > 0);
        for leaf in 0..diagram.leaf_count() {
            assert!(diagram.leaf_pattern(leaf as u32) < masks.len());
        }
    }

    #[test]
    fn empty_mask_has_one_path() {
        let diagram = RowPermutationDiagram::build(&[CellSet::default()]);
        assert_eq!(diagram.leaf_count(), 1);
        assert_eq!(diagram.count_paths(), 1);
    }

    #[test]
    fn root_edges_cover_first_rows() {
        let mask = pattern(&[0, 1, 9, 10]);
        let diagram = RowPermutationDiagram::build(&[mask]);
        assert!(!diagram.edges(diagram.root()).is_empty());
        for edge in diagram.edges(diagram.root()) {
            assert!(edge.row_mask() < 1 << 9);
        }
    }
}
