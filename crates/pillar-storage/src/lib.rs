//! Storage engine for PillarDB.
//!
//! This crate provides:
//! - The column store: database, tables and integer columns
//! - B+tree index (clustered and unclustered) with a linked leaf chain
//! - Sorted-array unclustered index
//! - Extendible hash table for hash-join build sides
//! - Snapshot persistence of the whole database

mod btree;
mod column;
mod database;
mod hash;
mod sorted;
mod table;

pub mod snapshot;

pub use btree::{BPlusTree, Entries, LeafNode, Leaves, search_key};
pub use column::{Column, ColumnIndex};
pub use database::{ColumnId, Database, TableId};
pub use hash::{BUCKET_SIZE, ExtendibleHashTable, INITIAL_GLOBAL_DEPTH, sdbm_hash};
pub use sorted::SortedIndex;
pub use table::Table;
