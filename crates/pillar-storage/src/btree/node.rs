//! Arena node types for the B+tree.

/// Index of a node inside the tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Leaf node: parallel key/position arrays plus neighbour links in key order.
#[derive(Debug, Clone, Default)]
pub struct LeafNode {
    pub(crate) keys: Vec<i32>,
    pub(crate) positions: Vec<usize>,
    pub(crate) prev: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
}

impl LeafNode {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity + 1),
            positions: Vec::with_capacity(capacity + 1),
            prev: None,
            next: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[i32] {
        &self.keys
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }
}

/// Internal node. `children.len() == keys.len() + 1`.
///
/// Every key in `children[i]` is `<= keys[i]` and every key in
/// `children[i + 1]` is `>= keys[i]`.
#[derive(Debug, Clone, Default)]
pub struct InternalNode {
    pub(crate) keys: Vec<i32>,
    pub(crate) children: Vec<NodeId>,
}

impl InternalNode {
    pub fn keys(&self) -> &[i32] {
        &self.keys
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Leaf(LeafNode),
    Internal(InternalNode),
}

/// Lowest index `i` with `keys[i] >= key`, or `keys.len()` if there is none.
///
/// Ties resolve to the leftmost occurrence, so a duplicate run starts exactly
/// at the returned index.
#[inline]
pub fn search_key(keys: &[i32], key: i32) -> usize {
    let mut lo = 0usize;
    let mut hi = keys.len();

    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if keys[mid] < key {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }

    lo
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_key_leftmost_duplicate() {
        let keys = [1, 3, 3, 3, 7, 9];
        assert_eq!(search_key(&keys, 3), 1);
        assert_eq!(search_key(&keys, 7), 4);
    }

    #[test]
    fn test_search_key_insertion_point() {
        let keys = [1, 3, 7, 9];
        assert_eq!(search_key(&keys, 0), 0);
        assert_eq!(search_key(&keys, 4), 2);
        assert_eq!(search_key(&keys, 10), 4);
        assert_eq!(search_key(&[], 5), 0);
    }
}
