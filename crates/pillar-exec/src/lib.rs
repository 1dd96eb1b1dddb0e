//! PillarDB query execution.
//!
//! Operators arrive fully resolved as [`DbOperator`] values and run against
//! the database held by an [`Engine`]. Intermediate results live in the
//! caller's [`Session`] under the names the operators bind.

pub mod aggregate;
pub mod dml;
pub mod fetch;
pub mod join;
pub mod scan;
pub mod shared_scan;

mod engine;
mod operator;
mod print;
mod result;
mod session;

pub use aggregate::AggregateOutput;
pub use engine::{Engine, Outcome};
pub use join::JoinOutput;
pub use operator::{AggregateOp, Comparator, DbOperator, JoinInput, JoinStrategy, ValueSource};
pub use print::ResultSet;
pub use result::{ResultVector, Values};
pub use session::Session;
pub use shared_scan::{BatchState, SharedScan};
