//! Unclustered sorted-array index.

use crate::btree::search_key;
use pillar_common::{PillarError, Result};

/// Parallel key and position arrays kept sorted by key.
///
/// Inserts and removes shift the arrays, so the index is meant to be built in
/// bulk with [`SortedIndex::from_pairs`] and maintained row by row only for
/// occasional changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortedIndex {
    keys: Vec<i32>,
    positions: Vec<usize>,
}

impl SortedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the index from unordered `(key, position)` pairs.
    ///
    /// The sort is stable, so equal keys keep their input order.
    pub fn from_pairs(mut pairs: Vec<(i32, usize)>) -> Self {
        pairs.sort_by_key(|&(key, _)| key);
        let (keys, positions) = pairs.into_iter().unzip();
        Self { keys, positions }
    }

    pub(crate) fn from_parts(keys: Vec<i32>, positions: Vec<usize>) -> Self {
        Self { keys, positions }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[i32] {
        &self.keys
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// Inserts in front of existing equal keys.
    pub fn insert(&mut self, key: i32, position: usize) {
        let idx = search_key(&self.keys, key);
        self.keys.insert(idx, key);
        self.positions.insert(idx, position);
    }

    /// Inserts for a row placed in the middle of the table, moving every
    /// stored position `>= position` up by one first.
    pub fn insert_and_shift(&mut self, key: i32, position: usize) {
        for pos in self.positions.iter_mut() {
            if *pos >= position {
                *pos += 1;
            }
        }
        self.insert(key, position);
    }

    /// Removes `(key, position)` and moves every stored position above it
    /// down by one.
    pub fn remove(&mut self, key: i32, position: usize) -> Result<()> {
        let start = search_key(&self.keys, key);
        let found = self.keys[start..]
            .iter()
            .zip(&self.positions[start..])
            .take_while(|&(&k, _)| k == key)
            .position(|(_, &pos)| pos == position)
            .map(|offset| start + offset);

        let Some(idx) = found else {
            return Err(PillarError::IndexEntryNotFound { key, position });
        };
        self.keys.remove(idx);
        self.positions.remove(idx);

        for pos in self.positions.iter_mut() {
            if *pos > position {
                *pos -= 1;
            }
        }
        Ok(())
    }

    /// Positions of every key with `lower <= key < upper`, in key order.
    pub fn range(&self, lower: Option<i32>, upper: Option<i32>) -> &[usize] {
        let start = lower.map_or(0, |k| search_key(&self.keys, k));
        let end = upper.map_or(self.keys.len(), |k| search_key(&self.keys, k));
        if start >= end {
            return &[];
        }
        &self.positions[start..end]
    }
}
