//! Arena-backed B+tree over (key, row position) pairs.

use std::ops::Range;

use super::node::{InternalNode, LeafNode, Node, NodeId, search_key};
use pillar_common::page::{FANOUT, LEAF_SIZE};
use pillar_common::{PillarError, Result};
use tracing::debug;

/// Location of one entry: a leaf and a slot inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cursor {
    pub(crate) leaf: NodeId,
    pub(crate) idx: usize,
}

#[derive(Debug, Clone, Copy)]
enum Shift {
    /// Positions `>= threshold` move up by one.
    Up,
    /// Positions `> threshold` move down by one.
    Down,
}

/// B+tree index owned by one column.
///
/// Nodes live in an arena and refer to each other by [`NodeId`], including
/// the doubly linked leaf chain. Nodes are never merged or freed; a leaf
/// emptied by deletes stays in the chain.
#[derive(Debug, Clone)]
pub struct BPlusTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    /// Tree height (1 = root is a leaf).
    pub(crate) height: usize,
    pub(crate) len: usize,
    pub(crate) leaf_capacity: usize,
    pub(crate) fanout: usize,
}

impl Default for BPlusTree {
    fn default() -> Self {
        Self::new()
    }
}

impl BPlusTree {
    /// Creates an empty tree with page-sized nodes.
    pub fn new() -> Self {
        Self::with_node_sizes(LEAF_SIZE, FANOUT)
    }

    /// Creates an empty tree with the given leaf capacity and internal fanout.
    pub fn with_node_sizes(leaf_capacity: usize, fanout: usize) -> Self {
        let leaf_capacity = leaf_capacity.max(2);
        Self {
            nodes: vec![Node::Leaf(LeafNode::with_capacity(leaf_capacity))],
            root: NodeId(0),
            height: 1,
            len: 0,
            leaf_capacity,
            fanout: fanout.max(3),
        }
    }

    /// Number of (key, position) entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn leaf_capacity(&self) -> usize {
        self.leaf_capacity
    }

    pub fn fanout(&self) -> usize {
        self.fanout
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // =========================================================================
    // Arena Access
    // =========================================================================

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub(crate) fn leaf(&self, id: NodeId) -> &LeafNode {
        match &self.nodes[id.index()] {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => unreachable!("node {} is not a leaf", id.0),
        }
    }

    fn leaf_mut(&mut self, id: NodeId) -> &mut LeafNode {
        match &mut self.nodes[id.index()] {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => unreachable!("node {} is not a leaf", id.0),
        }
    }

    fn internal_mut(&mut self, id: NodeId) -> &mut InternalNode {
        match &mut self.nodes[id.index()] {
            Node::Internal(node) => node,
            Node::Leaf(_) => unreachable!("node {} is not an internal node", id.0),
        }
    }

    // =========================================================================
    // Read Path
    // =========================================================================

    /// Descends to the leftmost leaf that can hold `key`.
    fn find_leaf(&self, key: i32) -> NodeId {
        let mut current = self.root;
        while let Node::Internal(node) = &self.nodes[current.index()] {
            current = node.children[search_key(&node.keys, key)];
        }
        current
    }

    /// Same descent as [`Self::find_leaf`], recording `(node, child index)` per level.
    fn find_leaf_with_path(&self, key: i32) -> (NodeId, Vec<(NodeId, usize)>) {
        let mut path = Vec::with_capacity(self.height);
        let mut current = self.root;
        while let Node::Internal(node) = &self.nodes[current.index()] {
            let child_idx = search_key(&node.keys, key);
            path.push((current, child_idx));
            current = node.children[child_idx];
        }
        (current, path)
    }

    fn edge_leaf(&self, rightmost: bool) -> NodeId {
        let mut current = self.root;
        while let Node::Internal(node) = &self.nodes[current.index()] {
            current = if rightmost {
                node.children[node.children.len() - 1]
            } else {
                node.children[0]
            };
        }
        current
    }

    /// Moves a cursor that may sit past the end of its leaf onto the next real entry.
    fn settle_forward(&self, mut cursor: Cursor) -> Option<Cursor> {
        loop {
            let leaf = self.leaf(cursor.leaf);
            if cursor.idx < leaf.len() {
                return Some(cursor);
            }
            cursor = Cursor {
                leaf: leaf.next?,
                idx: 0,
            };
        }
    }

    fn next_entry(&self, cursor: Cursor) -> Option<Cursor> {
        self.settle_forward(Cursor {
            leaf: cursor.leaf,
            idx: cursor.idx + 1,
        })
    }

    fn prev_entry(&self, cursor: Cursor) -> Option<Cursor> {
        if cursor.idx > 0 {
            return Some(Cursor {
                leaf: cursor.leaf,
                idx: cursor.idx - 1,
            });
        }
        let mut id = self.leaf(cursor.leaf).prev?;
        loop {
            let leaf = self.leaf(id);
            if !leaf.is_empty() {
                return Some(Cursor {
                    leaf: id,
                    idx: leaf.len() - 1,
                });
            }
            id = leaf.prev?;
        }
    }

    fn first_entry(&self) -> Option<Cursor> {
        self.settle_forward(Cursor {
            leaf: self.edge_leaf(false),
            idx: 0,
        })
    }

    fn last_entry(&self) -> Option<Cursor> {
        let leaf = self.edge_leaf(true);
        match self.leaf(leaf).len() {
            0 => self.prev_entry(Cursor { leaf, idx: 0 }),
            len => Some(Cursor { leaf, idx: len - 1 }),
        }
    }

    /// First entry in chain order with key `>= key`.
    pub(crate) fn lower_bound(&self, key: i32) -> Option<Cursor> {
        let leaf = self.find_leaf(key);
        let idx = search_key(&self.leaf(leaf).keys, key);
        self.settle_forward(Cursor { leaf, idx })
    }

    #[inline]
    fn entry(&self, cursor: Cursor) -> (i32, usize) {
        let leaf = self.leaf(cursor.leaf);
        (leaf.keys[cursor.idx], leaf.positions[cursor.idx])
    }

    /// All positions stored under `key`, in chain order.
    pub fn search(&self, key: i32) -> Vec<usize> {
        let mut out = Vec::new();
        let mut cursor = self.lower_bound(key);
        while let Some(c) = cursor {
            let (k, pos) = self.entry(c);
            if k != key {
                break;
            }
            out.push(pos);
            cursor = self.next_entry(c);
        }
        out
    }

    /// Row-position range `[start, end)` of a clustered tree for `lower <= key < upper`.
    ///
    /// A bound that lies outside the key domain collapses the range to empty.
    pub fn clustered_range(&self, lower: Option<i32>, upper: Option<i32>) -> Range<usize> {
        let boundary = |key: i32| match self.lower_bound(key) {
            Some(c) => self.entry(c).1,
            None => self.len,
        };
        let start = lower.map_or(0, boundary);
        let end = upper.map_or(self.len, boundary);
        start..end.max(start)
    }

    /// Positions of every entry with `lower <= key < upper`.
    ///
    /// With a lower bound the chain is walked forward from it. With only an
    /// upper bound it is walked backward from the entry before the bound.
    pub fn unclustered_range(&self, lower: Option<i32>, upper: Option<i32>) -> Vec<usize> {
        let mut out = Vec::new();
        match (lower, upper) {
            (None, Some(upper)) => {
                let mut cursor = match self.lower_bound(upper) {
                    Some(c) => self.prev_entry(c),
                    None => self.last_entry(),
                };
                while let Some(c) = cursor {
                    out.push(self.entry(c).1);
                    cursor = self.prev_entry(c);
                }
            }
            (lower, upper) => {
                let mut cursor = match lower {
                    Some(lower) => self.lower_bound(lower),
                    None => self.first_entry(),
                };
                while let Some(c) = cursor {
                    let (key, pos) = self.entry(c);
                    if upper.is_some_and(|u| key >= u) {
                        break;
                    }
                    out.push(pos);
                    cursor = self.next_entry(c);
                }
            }
        }
        out
    }

    /// Iterates entries in leaf-chain order.
    pub fn iter(&self) -> Entries<'_> {
        Entries {
            tree: self,
            cursor: self.first_entry(),
        }
    }

    /// Iterates leaves by following the `next` links from the leftmost leaf.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves {
            tree: self,
            next: Some(self.edge_leaf(false)),
        }
    }

    // =========================================================================
    // Write Path
    // =========================================================================

    /// Inserts an entry in front of any existing entries with the same key.
    pub fn insert(&mut self, key: i32, position: usize) {
        let (leaf_id, path) = self.find_leaf_with_path(key);
        let capacity = self.leaf_capacity;

        let leaf = self.leaf_mut(leaf_id);
        let idx = search_key(&leaf.keys, key);
        leaf.keys.insert(idx, key);
        leaf.positions.insert(idx, position);
        let overflow = leaf.len() > capacity;
        self.len += 1;

        if overflow {
            self.split_leaf(leaf_id, path);
        }
    }

    /// Inserts an entry for a row placed in the middle of the table.
    ///
    /// Every stored position `>= position` moves up by one first.
    pub fn insert_and_shift(&mut self, key: i32, position: usize) {
        let leaf = self.find_leaf(key);
        self.shift_positions(leaf, position, Shift::Up);
        self.insert(key, position);
    }

    /// Removes the entry `(key, position)` and moves every stored position
    /// above it down by one.
    pub fn remove(&mut self, key: i32, position: usize) -> Result<()> {
        let mut cursor = self.lower_bound(key);
        while let Some(c) = cursor {
            let (k, pos) = self.entry(c);
            if k != key {
                break;
            }
            if pos == position {
                let leaf = self.leaf_mut(c.leaf);
                leaf.keys.remove(c.idx);
                leaf.positions.remove(c.idx);
                self.len -= 1;
                self.shift_positions(c.leaf, position, Shift::Down);
                return Ok(());
            }
            cursor = self.next_entry(c);
        }
        Err(PillarError::IndexEntryNotFound { key, position })
    }

    /// Adjusts stored positions, walking forward from `from` and then backward.
    fn shift_positions(&mut self, from: NodeId, threshold: usize, shift: Shift) {
        let adjust = |leaf: &mut LeafNode| {
            for pos in leaf.positions.iter_mut() {
                match shift {
                    Shift::Up if *pos >= threshold => *pos += 1,
                    Shift::Down if *pos > threshold => *pos -= 1,
                    _ => {}
                }
            }
        };

        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let leaf = self.leaf_mut(id);
            adjust(leaf);
            cursor = leaf.next;
        }

        let mut cursor = self.leaf(from).prev;
        while let Some(id) = cursor {
            let leaf = self.leaf_mut(id);
            adjust(leaf);
            cursor = leaf.prev;
        }
    }

    /// Splits an overfull leaf at its midpoint into a new right sibling.
    fn split_leaf(&mut self, leaf_id: NodeId, path: Vec<(NodeId, usize)>) {
        let new_id = NodeId(self.nodes.len() as u32);

        let leaf = self.leaf_mut(leaf_id);
        let split_point = leaf.len() / 2;
        let right = LeafNode {
            keys: leaf.keys.split_off(split_point),
            positions: leaf.positions.split_off(split_point),
            prev: Some(leaf_id),
            next: leaf.next,
        };
        leaf.next = Some(new_id);

        let split_key = right.keys[0];
        let old_next = right.next;
        self.nodes.push(Node::Leaf(right));
        if let Some(next) = old_next {
            self.leaf_mut(next).prev = Some(new_id);
        }

        self.propagate_split(split_key, leaf_id, new_id, path);
    }

    /// Places `split_key` and `right` into the parent of `left`, splitting upward.
    fn propagate_split(
        &mut self,
        split_key: i32,
        left: NodeId,
        right: NodeId,
        mut path: Vec<(NodeId, usize)>,
    ) {
        let Some((parent_id, child_idx)) = path.pop() else {
            self.create_new_root(split_key, left, right);
            return;
        };

        let fanout = self.fanout;
        let parent = self.internal_mut(parent_id);
        parent.keys.insert(child_idx, split_key);
        parent.children.insert(child_idx + 1, right);

        if parent.children.len() > fanout {
            let (up_key, new_right) = self.split_internal_node(parent_id);
            self.propagate_split(up_key, parent_id, new_right, path);
        }
    }

    /// Splits an internal node around its middle key, which moves up.
    fn split_internal_node(&mut self, node_id: NodeId) -> (i32, NodeId) {
        let new_id = NodeId(self.nodes.len() as u32);

        let node = self.internal_mut(node_id);
        let mid = node.keys.len() / 2;
        let up_key = node.keys[mid];
        let right_keys = node.keys.split_off(mid + 1);
        node.keys.truncate(mid);
        let right_children = node.children.split_off(mid + 1);

        self.nodes.push(Node::Internal(InternalNode {
            keys: right_keys,
            children: right_children,
        }));
        (up_key, new_id)
    }

    fn create_new_root(&mut self, split_key: i32, left: NodeId, right: NodeId) {
        let root = self.alloc(Node::Internal(InternalNode {
            keys: vec![split_key],
            children: vec![left, right],
        }));
        self.root = root;
        self.height += 1;
        debug!(height = self.height, nodes = self.nodes.len(), "b+tree root split");
    }

    // =========================================================================
    // Bulk Build
    // =========================================================================

    /// Builds a tree bottom-up from entries sorted by key.
    ///
    /// Entries with equal keys keep their given order in the leaf chain.
    pub fn from_sorted(entries: &[(i32, usize)], leaf_capacity: usize, fanout: usize) -> Self {
        let mut tree = Self::with_node_sizes(leaf_capacity, fanout);
        if entries.is_empty() {
            return tree;
        }
        debug_assert!(entries.windows(2).all(|w| w[0].0 <= w[1].0));

        tree.nodes.clear();
        let mut level: Vec<(i32, NodeId)> = Vec::new();
        let mut prev: Option<NodeId> = None;
        let mut offset = 0;
        for size in even_chunks(entries.len(), tree.leaf_capacity) {
            let chunk = &entries[offset..offset + size];
            offset += size;

            let mut leaf = LeafNode::with_capacity(tree.leaf_capacity);
            leaf.keys.extend(chunk.iter().map(|&(key, _)| key));
            leaf.positions.extend(chunk.iter().map(|&(_, pos)| pos));
            leaf.prev = prev;

            let id = tree.alloc(Node::Leaf(leaf));
            if let Some(p) = prev {
                tree.leaf_mut(p).next = Some(id);
            }
            level.push((chunk[0].0, id));
            prev = Some(id);
        }

        while level.len() > 1 {
            let mut parents = Vec::with_capacity(level.len().div_ceil(tree.fanout));
            let mut offset = 0;
            for size in even_chunks(level.len(), tree.fanout) {
                let group = &level[offset..offset + size];
                offset += size;

                let id = tree.alloc(Node::Internal(InternalNode {
                    keys: group[1..].iter().map(|&(key, _)| key).collect(),
                    children: group.iter().map(|&(_, id)| id).collect(),
                }));
                parents.push((group[0].0, id));
            }
            level = parents;
            tree.height += 1;
        }

        tree.root = level[0].1;
        tree.len = entries.len();
        tree
    }
}

/// Splits `n` items into the fewest groups of at most `max`, with sizes
/// differing by at most one.
fn even_chunks(n: usize, max: usize) -> impl Iterator<Item = usize> {
    let count = n.div_ceil(max).max(1);
    let base = n / count;
    let extra = n % count;
    (0..count).map(move |i| base + usize::from(i < extra))
}

/// Iterator over `(key, position)` entries in chain order.
pub struct Entries<'a> {
    tree: &'a BPlusTree,
    cursor: Option<Cursor>,
}

impl Iterator for Entries<'_> {
    type Item = (i32, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor?;
        let entry = self.tree.entry(cursor);
        self.cursor = self.tree.next_entry(cursor);
        Some(entry)
    }
}

/// Iterator over leaves following the `next` links.
pub struct Leaves<'a> {
    tree: &'a BPlusTree,
    next: Option<NodeId>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = &'a LeafNode;

    fn next(&mut self) -> Option<Self::Item> {
        let leaf = self.tree.leaf(self.next?);
        self.next = leaf.next;
        Some(leaf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tree() -> BPlusTree {
        BPlusTree::with_node_sizes(4, 3)
    }

    fn collect(tree: &BPlusTree) -> Vec<(i32, usize)> {
        tree.iter().collect()
    }

    /// Leaf `prev` links must mirror the `next` chain.
    fn assert_chain_consistent(tree: &BPlusTree) {
        let mut ids = Vec::new();
        let mut cursor = Some(tree.edge_leaf(false));
        while let Some(id) = cursor {
            ids.push(id);
            cursor = tree.leaf(id).next;
        }
        assert_eq!(tree.leaf(ids[0]).prev, None);
        for pair in ids.windows(2) {
            assert_eq!(tree.leaf(pair[1]).prev, Some(pair[0]));
        }
        assert_eq!(ids.last().copied(), Some(tree.edge_leaf(true)));
    }

    #[test]
    fn test_empty_tree() {
        let tree = BPlusTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 1);
        assert!(tree.search(5).is_empty());
        assert_eq!(tree.clustered_range(Some(1), Some(10)), 0..0);
        assert!(tree.unclustered_range(None, Some(10)).is_empty());
        assert_eq!(tree.iter().count(), 0);
    }

    #[test]
    fn test_insert_keeps_chain_sorted() {
        let mut tree = small_tree();
        let keys = [50, 10, 40, 20, 30, 60, 5, 45, 15, 25, 35, 55];
        for (pos, key) in keys.iter().enumerate() {
            tree.insert(*key, pos);
        }

        assert_eq!(tree.len(), keys.len());
        assert!(tree.height() >= 2);
        let chain: Vec<i32> = tree.iter().map(|(k, _)| k).collect();
        let mut sorted = keys.to_vec();
        sorted.sort();
        assert_eq!(chain, sorted);
        assert_chain_consistent(&tree);

        for leaf in tree.leaves() {
            assert!(leaf.len() <= tree.leaf_capacity());
        }
    }

    #[test]
    fn test_search_duplicates_across_leaves() {
        let mut tree = small_tree();
        for pos in 0..20 {
            tree.insert(7, pos);
        }
        tree.insert(3, 20);
        tree.insert(9, 21);

        let mut found = tree.search(7);
        found.sort();
        assert_eq!(found, (0..20).collect::<Vec<_>>());
        assert_eq!(tree.search(3), vec![20]);
        assert!(tree.search(8).is_empty());
    }

    #[test]
    fn test_clustered_range_bounds() {
        // Physical rows sorted by key: 10, 20, 20, 30, 40.
        let entries = [(10, 0), (20, 1), (20, 2), (30, 3), (40, 4)];
        let tree = BPlusTree::from_sorted(&entries, 2, 3);

        assert_eq!(tree.clustered_range(Some(20), Some(40)), 1..4);
        assert_eq!(tree.clustered_range(Some(20), None), 1..5);
        assert_eq!(tree.clustered_range(None, Some(20)), 0..1);
        assert_eq!(tree.clustered_range(Some(15), Some(35)), 1..4);
        assert_eq!(tree.clustered_range(None, None), 0..5);
    }

    #[test]
    fn test_clustered_range_out_of_domain_is_empty() {
        let entries = [(10, 0), (20, 1), (30, 2)];
        let tree = BPlusTree::from_sorted(&entries, 2, 3);

        assert!(tree.clustered_range(Some(100), None).is_empty());
        assert!(tree.clustered_range(None, Some(5)).is_empty());
        assert!(tree.clustered_range(Some(30), Some(10)).is_empty());
    }

    #[test]
    fn test_unclustered_range() {
        let mut tree = small_tree();
        let values = [5, 3, 8, 1, 9, 3, 7];
        for (pos, v) in values.iter().enumerate() {
            tree.insert(*v, pos);
        }

        let mut both = tree.unclustered_range(Some(3), Some(8));
        both.sort();
        assert_eq!(both, vec![0, 1, 5, 6]);

        let mut lower = tree.unclustered_range(Some(8), None);
        lower.sort();
        assert_eq!(lower, vec![2, 4]);

        // Upper-only walks backward, so keys come out descending.
        let upper = tree.unclustered_range(None, Some(5));
        let keys: Vec<i32> = upper.iter().map(|&p| values[p]).collect();
        assert_eq!(keys, vec![3, 3, 1]);

        assert!(tree.unclustered_range(Some(10), None).is_empty());
        assert!(tree.unclustered_range(None, Some(1)).is_empty());
        assert_eq!(tree.unclustered_range(None, Some(100)).len(), values.len());
    }

    #[test]
    fn test_remove_shifts_positions_down() {
        let mut tree = small_tree();
        for pos in 0..10 {
            tree.insert(pos as i32 * 10, pos);
        }

        tree.remove(30, 3).unwrap();
        assert_eq!(tree.len(), 9);
        let entries = collect(&tree);
        assert_eq!(
            entries,
            vec![
                (0, 0),
                (10, 1),
                (20, 2),
                (40, 3),
                (50, 4),
                (60, 5),
                (70, 6),
                (80, 7),
                (90, 8)
            ]
        );
    }

    #[test]
    fn test_remove_missing_entry() {
        let mut tree = small_tree();
        tree.insert(1, 0);
        tree.insert(2, 1);

        let err = tree.remove(2, 0).unwrap_err();
        assert!(matches!(
            err,
            PillarError::IndexEntryNotFound {
                key: 2,
                position: 0
            }
        ));
        assert!(tree.remove(5, 0).is_err());
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_remove_all_then_reinsert() {
        let mut tree = small_tree();
        for pos in 0..30 {
            tree.insert((pos % 7) as i32, pos);
        }
        for pos in (0..30).rev() {
            tree.remove((pos % 7) as i32, pos).unwrap();
        }
        assert!(tree.is_empty());
        assert_eq!(tree.iter().count(), 0);
        assert!(tree.unclustered_range(None, Some(100)).is_empty());

        tree.insert(4, 0);
        tree.insert(2, 1);
        assert_eq!(collect(&tree), vec![(2, 1), (4, 0)]);
        assert_chain_consistent(&tree);
    }

    #[test]
    fn test_insert_and_shift_moves_positions_up() {
        let mut tree = small_tree();
        for pos in 0..8 {
            tree.insert(pos as i32, pos);
        }

        tree.insert_and_shift(100, 2);
        let mut positions: Vec<(i32, usize)> = collect(&tree);
        positions.sort_by_key(|&(_, p)| p);
        assert_eq!(positions[2], (100, 2));
        assert_eq!(positions[3], (2, 3));
        assert_eq!(positions[0], (0, 0));
        assert_eq!(positions[8], (7, 8));
    }

    #[test]
    fn test_clustered_insert_tracks_physical_order() {
        // Mirror a clustered column: insert at the leftmost slot among equal keys.
        let mut data: Vec<i32> = Vec::new();
        let mut tree = small_tree();
        for key in [5, 3, 5, 1, 5, 9, 3, 7, 5, 2, 8, 5] {
            let pos = search_key(&data, key);
            data.insert(pos, key);
            tree.insert_and_shift(key, pos);
        }

        let chain = collect(&tree);
        for (i, (key, pos)) in chain.iter().enumerate() {
            assert_eq!(*pos, i);
            assert_eq!(*key, data[i]);
        }
        assert_eq!(tree.clustered_range(Some(5), Some(6)), 4..9);
    }

    #[test]
    fn test_from_sorted_builds_balanced_tree() {
        let entries: Vec<(i32, usize)> = (0..1000).map(|i| (i as i32 / 3, i)).collect();
        let tree = BPlusTree::from_sorted(&entries, 8, 4);

        assert_eq!(tree.len(), 1000);
        assert_eq!(collect(&tree), entries);
        assert_chain_consistent(&tree);
        assert_eq!(tree.search(10), vec![30, 31, 32]);

        // Inserting after a bulk build still splits correctly.
        let mut tree = tree;
        tree.insert(-1, 1000);
        tree.insert(500, 1001);
        assert_eq!(tree.iter().next(), Some((-1, 1000)));
        assert_eq!(tree.len(), 1002);
        assert_chain_consistent(&tree);
    }

    #[test]
    fn test_from_sorted_empty() {
        let tree = BPlusTree::from_sorted(&[], 8, 4);
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 1);
    }

    #[test]
    fn test_even_chunks() {
        assert_eq!(even_chunks(10, 4).collect::<Vec<_>>(), vec![4, 3, 3]);
        assert_eq!(even_chunks(4, 4).collect::<Vec<_>>(), vec![4]);
        assert_eq!(even_chunks(5, 4).collect::<Vec<_>>(), vec![3, 2]);
    }
}
