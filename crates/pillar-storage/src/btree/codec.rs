//! Pre-order snapshot encoding of a B+tree.
//!
//! ```text
//! header: leaf_capacity u32 | fanout u32 | height u32 | len u64
//! leaf:     0u8 | count u32 | keys i32 * count | positions u64 * count
//! internal: 1u8 | count u32 | keys i32 * count | (count + 1) child subtrees
//! ```
//!
//! Leaves are read left to right, so their neighbour links are rebuilt from
//! the order in which they are decoded.

use bytes::{BufMut, BytesMut};
use pillar_common::Result;
use pillar_common::page::MAX_TREE_HEIGHT;

use super::node::{InternalNode, LeafNode, Node, NodeId};
use super::tree::BPlusTree;
use crate::snapshot::SnapshotReader;

const LEAF_TAG: u8 = 0;
const INTERNAL_TAG: u8 = 1;

impl BPlusTree {
    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.leaf_capacity as u32);
        buf.put_u32_le(self.fanout as u32);
        buf.put_u32_le(self.height as u32);
        buf.put_u64_le(self.len as u64);
        self.encode_node(self.root, buf);
    }

    fn encode_node(&self, id: NodeId, buf: &mut BytesMut) {
        match &self.nodes[id.index()] {
            Node::Leaf(leaf) => {
                buf.put_u8(LEAF_TAG);
                buf.put_u32_le(leaf.len() as u32);
                for &key in &leaf.keys {
                    buf.put_i32_le(key);
                }
                for &pos in &leaf.positions {
                    buf.put_u64_le(pos as u64);
                }
            }
            Node::Internal(node) => {
                buf.put_u8(INTERNAL_TAG);
                buf.put_u32_le(node.keys.len() as u32);
                for &key in &node.keys {
                    buf.put_i32_le(key);
                }
                for &child in &node.children {
                    self.encode_node(child, buf);
                }
            }
        }
    }

    pub(crate) fn decode(reader: &mut SnapshotReader<'_>) -> Result<Self> {
        let leaf_capacity = reader.u32()? as usize;
        let fanout = reader.u32()? as usize;
        let height = reader.u32()? as usize;
        let len = reader.u64()? as usize;

        if leaf_capacity < 2 || fanout < 3 {
            return Err(reader.corrupted(format!(
                "invalid node sizes: leaf {}, fanout {}",
                leaf_capacity, fanout
            )));
        }
        if height == 0 || height > MAX_TREE_HEIGHT {
            return Err(reader.corrupted(format!("invalid tree height {}", height)));
        }

        let mut tree = BPlusTree {
            nodes: Vec::new(),
            root: NodeId(0),
            height,
            len,
            leaf_capacity,
            fanout,
        };
        let mut leaves = Vec::new();
        tree.root = decode_node(&mut tree, &mut leaves, reader, 1)?;

        for pair in leaves.windows(2) {
            if let Node::Leaf(left) = &mut tree.nodes[pair[0].index()] {
                left.next = Some(pair[1]);
            }
            if let Node::Leaf(right) = &mut tree.nodes[pair[1].index()] {
                right.prev = Some(pair[0]);
            }
        }

        let stored: usize = leaves.iter().map(|&id| tree.leaf(id).len()).sum();
        if stored != len {
            return Err(reader.corrupted(format!(
                "b+tree header claims {} entries, leaves hold {}",
                len, stored
            )));
        }
        Ok(tree)
    }
}

fn decode_node(
    tree: &mut BPlusTree,
    leaves: &mut Vec<NodeId>,
    reader: &mut SnapshotReader<'_>,
    depth: usize,
) -> Result<NodeId> {
    let tag = reader.u8()?;
    let count = reader.u32()? as usize;

    match tag {
        LEAF_TAG => {
            if depth != tree.height {
                return Err(reader.corrupted(format!(
                    "leaf at depth {}, tree height {}",
                    depth, tree.height
                )));
            }
            if count > tree.leaf_capacity {
                return Err(reader.corrupted(format!("leaf holds {} entries", count)));
            }
            let keys = reader.i32s(count)?;
            if !keys.windows(2).all(|w| w[0] <= w[1]) {
                return Err(reader.corrupted("leaf keys out of order"));
            }
            let positions = reader.positions(count)?;

            let id = NodeId(tree.nodes.len() as u32);
            tree.nodes.push(Node::Leaf(LeafNode {
                keys,
                positions,
                prev: None,
                next: None,
            }));
            leaves.push(id);
            Ok(id)
        }
        INTERNAL_TAG => {
            if depth >= tree.height {
                return Err(reader.corrupted(format!(
                    "internal node at depth {}, tree height {}",
                    depth, tree.height
                )));
            }
            if count + 1 > tree.fanout {
                return Err(reader.corrupted(format!("internal node holds {} keys", count)));
            }
            let keys = reader.i32s(count)?;

            let id = NodeId(tree.nodes.len() as u32);
            tree.nodes.push(Node::Internal(InternalNode {
                keys,
                children: Vec::with_capacity(count + 1),
            }));

            let mut children = Vec::with_capacity(count + 1);
            for _ in 0..=count {
                children.push(decode_node(tree, leaves, reader, depth + 1)?);
            }
            if let Node::Internal(node) = &mut tree.nodes[id.index()] {
                node.children = children;
            }
            Ok(id)
        }
        other => Err(reader.corrupted(format!("unknown node tag {}", other))),
    }
}
