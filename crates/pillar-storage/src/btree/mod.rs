//! B+tree index over (key, row position) pairs.
//!
//! Nodes are kept in an arena and addressed by [`NodeId`]:
//!
//! ```text
//!                 [Internal: k0 | k1]
//!                /        |        \
//!   [Leaf] <-> [Leaf] <-> [Leaf] <-> [Leaf]
//! ```
//!
//! - Internal nodes hold up to `fanout - 1` keys and `fanout` children.
//! - Leaves hold up to `leaf_capacity` entries and are doubly linked in key
//!   order, so range scans walk the chain in either direction.
//! - Splits propagate upward along the recorded descent path; deletes never
//!   merge nodes.
//!
//! A clustered tree stores the physical row position of every entry, and its
//! chain order equals row order, which turns a key range into a contiguous
//! row range. An unclustered tree yields explicit position lists.

mod codec;
mod node;
mod tree;

pub use node::{LeafNode, search_key};
pub use tree::{BPlusTree, Entries, Leaves};
