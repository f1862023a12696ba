//! Fixed-size memo table.
//!
//! Closed addressing with a single slot per bucket; a colliding insert
//! overwrites. Lookups are exact on the full 64-bit key, so a hit is only
//! wrong if two states share a key, which the random coefficients make
//! vanishingly unlikely. A zero-capacity table is valid and remembers
//! nothing.

const EMPTY_KEY: u64 = u64::MAX;

/// Overwrite-on-collision memo table keyed by 64-bit state hashes.
#[derive(Clone, Debug)]
pub struct MemoTable<V> {
    table: Vec<(u64, V)>,
    elements: usize,
}

impl<V: Copy + Default> MemoTable<V> {
    /// Creates a table with `size` buckets.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self { table: vec![(EMPTY_KEY, V::default()); size], elements: 0 }
    }

    /// Empties the table, keeping its capacity.
    pub fn clear(&mut self) {
        self.table.fill((EMPTY_KEY, V::default()));
        self.elements = 0;
    }

    /// Number of buckets.
    #[must_use]
    pub fn size(&self) -> usize {
        self.table.len()
    }

    /// Number of occupied buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements
    }

    /// Returns `true` if no entry is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements == 0
    }

    /// Looks up `key`, returning the stored value on an exact match.
    #[must_use]
    pub fn find(&self, key: u64) -> Option<V> {
        if self.table.is_empty() {
            return None;
        }
        let (stored_key, value) = self.table[(key % self.table.len() as u64) as usize];
        (stored_key == key).then_some(value)
    }

    /// Stores `value` under `key`, overwriting whatever occupied the bucket.
    pub fn insert(&mut self, key: u64, value: V) {
        if self.table.is_empty() {
            return;
        }
        let index = (key % self.table.len() as u64) as usize;
        let slot = &mut self.table[index];
        if slot.0 == EMPTY_KEY {
            self.elements += 1;
        }
        *slot = (key, value);
    }
}
