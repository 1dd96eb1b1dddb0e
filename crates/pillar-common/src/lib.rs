//! PillarDB common types, errors, and configuration.
//!
//! This crate provides shared definitions used across all PillarDB components.

pub mod config;
pub mod error;
pub mod page;
pub mod types;

pub use config::EngineConfig;
pub use error::{PillarError, Result};
pub use page::{FANOUT, LEAF_SIZE, PAGE_SIZE};
pub use types::{DataType, IndexType};
