//! Column storage and per-column index maintenance.

use crate::btree::BPlusTree;
use crate::sorted::SortedIndex;
use pillar_common::{IndexType, Result};

/// Auxiliary structure owned by a column.
///
/// `None` also covers `SortedClustered`, where the sorted data array is the
/// index.
#[derive(Debug, Clone, Default)]
pub enum ColumnIndex {
    #[default]
    None,
    BTree(BPlusTree),
    Sorted(SortedIndex),
}

#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    data: Vec<i32>,
    index_type: IndexType,
    index: ColumnIndex,
    clustered: bool,
}

impl Column {
    /// Creates an empty column with storage reserved for `capacity` rows.
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            data: Vec::with_capacity(capacity),
            index_type: IndexType::None,
            index: ColumnIndex::None,
            clustered: false,
        }
    }

    pub(crate) fn from_parts(
        name: String,
        data: Vec<i32>,
        index_type: IndexType,
        index: ColumnIndex,
        clustered: bool,
    ) -> Self {
        Self {
            name,
            data,
            index_type,
            index,
            clustered,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn data(&self) -> &[i32] {
        &self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn index(&self) -> &ColumnIndex {
        &self.index
    }

    /// True once any column of the owning table carries a clustered index.
    pub fn is_clustered(&self) -> bool {
        self.clustered
    }

    pub(crate) fn set_clustered(&mut self, clustered: bool) {
        self.clustered = clustered;
    }

    pub(crate) fn data_mut(&mut self) -> &mut Vec<i32> {
        &mut self.data
    }

    pub(crate) fn reserve_rows(&mut self, capacity: usize) {
        self.data.reserve(capacity.saturating_sub(self.data.len()));
    }

    /// Attaches an index of `index_type` built from the current data.
    pub(crate) fn attach_index(&mut self, index_type: IndexType, leaf_capacity: usize, fanout: usize) {
        self.index_type = index_type;
        self.index = match index_type {
            IndexType::None | IndexType::SortedClustered => ColumnIndex::None,
            IndexType::BTreeClustered | IndexType::BTreeUnclustered => {
                ColumnIndex::BTree(BPlusTree::with_node_sizes(leaf_capacity, fanout))
            }
            IndexType::SortedUnclustered => ColumnIndex::Sorted(SortedIndex::new()),
        };
        self.rebuild_index();
    }

    /// Rebuilds the index structure in bulk from the data array.
    pub(crate) fn rebuild_index(&mut self) {
        let mut pairs: Vec<(i32, usize)> = self
            .data
            .iter()
            .enumerate()
            .map(|(pos, &key)| (key, pos))
            .collect();

        match &mut self.index {
            ColumnIndex::None => {}
            ColumnIndex::BTree(tree) => {
                pairs.sort_by_key(|&(key, _)| key);
                *tree = BPlusTree::from_sorted(&pairs, tree.leaf_capacity(), tree.fanout());
            }
            ColumnIndex::Sorted(sorted) => {
                *sorted = SortedIndex::from_pairs(pairs);
            }
        }
    }

    /// Records a new row in the index. `shift` is set when the row landed in
    /// the middle of the table and stored positions at or above it moved.
    pub(crate) fn index_insert(&mut self, key: i32, position: usize, shift: bool) {
        match &mut self.index {
            ColumnIndex::None => {}
            ColumnIndex::BTree(tree) if shift => tree.insert_and_shift(key, position),
            ColumnIndex::BTree(tree) => tree.insert(key, position),
            ColumnIndex::Sorted(sorted) if shift => sorted.insert_and_shift(key, position),
            ColumnIndex::Sorted(sorted) => sorted.insert(key, position),
        }
    }

    /// Drops the row at `position` from the index, shifting later positions down.
    pub(crate) fn index_remove(&mut self, position: usize) -> Result<()> {
        let key = self.data[position];
        match &mut self.index {
            ColumnIndex::None => Ok(()),
            ColumnIndex::BTree(tree) => tree.remove(key, position),
            ColumnIndex::Sorted(sorted) => sorted.remove(key, position),
        }
    }
}
