//! Resolved query operators.
//!
//! Every name has already been bound to a storage handle or a result
//! vector by the time an operator reaches the engine.

use std::sync::Arc;

use pillar_common::{IndexType, Result};
use pillar_storage::{ColumnId, Database, TableId};

use crate::result::{ResultVector, Values};

/// Input of a value-consuming operator.
#[derive(Debug, Clone)]
pub enum ValueSource {
    Column(ColumnId),
    Result(Arc<ResultVector>),
}

impl ValueSource {
    pub fn values<'a>(&'a self, db: &'a Database) -> Result<Values<'a>> {
        match self {
            ValueSource::Column(id) => Ok(Values::Int(db.column(*id)?.data())),
            ValueSource::Result(vector) => Ok(vector.values()),
        }
    }

    pub fn is_column(&self) -> bool {
        matches!(self, ValueSource::Column(_))
    }
}

/// Range predicate: `lower <= v < upper`, either side optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Comparator {
    pub lower: Option<i64>,
    pub upper: Option<i64>,
}

impl Comparator {
    pub fn new(lower: Option<i64>, upper: Option<i64>) -> Self {
        Self { lower, upper }
    }

    pub fn between(lower: i64, upper: i64) -> Self {
        Self::new(Some(lower), Some(upper))
    }

    pub fn is_unbounded(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }

    #[inline]
    pub fn matches_i64(&self, value: i64) -> bool {
        self.lower.is_none_or(|l| value >= l) && self.upper.is_none_or(|u| value < u)
    }

    #[inline]
    pub fn matches_f64(&self, value: f64) -> bool {
        self.lower.is_none_or(|l| value >= l as f64) && self.upper.is_none_or(|u| value < u as f64)
    }

    /// Narrows the bounds to the i32 key domain.
    ///
    /// Returns `None` when no i32 key can satisfy the predicate. A bound that
    /// every i32 satisfies is dropped.
    pub fn key_bounds(&self) -> Option<(Option<i32>, Option<i32>)> {
        let min = i64::from(i32::MIN);
        let max = i64::from(i32::MAX);
        let lower = match self.lower {
            Some(l) if l > max => return None,
            Some(l) if l <= min => None,
            Some(l) => Some(l as i32),
            None => None,
        };
        let upper = match self.upper {
            Some(u) if u <= min => return None,
            Some(u) if u > max => None,
            Some(u) => Some(u as i32),
            None => None,
        };
        Some((lower, upper))
    }
}

/// Aggregate and arithmetic operators.
#[derive(Debug, Clone)]
pub enum AggregateOp {
    /// Minimum value, plus its position when a position list is given.
    Min {
        values: ValueSource,
        positions: Option<Arc<ResultVector>>,
    },
    Max {
        values: ValueSource,
        positions: Option<Arc<ResultVector>>,
    },
    Sum(ValueSource),
    Avg(ValueSource),
    Add(ValueSource, ValueSource),
    Sub(ValueSource, ValueSource),
}

impl AggregateOp {
    /// Number of output names the operator binds.
    pub fn output_count(&self) -> usize {
        match self {
            AggregateOp::Min {
                positions: Some(_), ..
            }
            | AggregateOp::Max {
                positions: Some(_), ..
            } => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStrategy {
    NestedLoop,
    Hash,
}

/// One side of a join: fetched values aligned with their row positions.
#[derive(Debug, Clone)]
pub struct JoinInput {
    pub values: Arc<ResultVector>,
    pub positions: Arc<ResultVector>,
}

#[derive(Debug, Clone)]
pub enum DbOperator {
    CreateDatabase {
        name: String,
    },
    CreateTable {
        name: String,
        column_slots: usize,
    },
    CreateColumn {
        table: TableId,
        name: String,
    },
    CreateIndex {
        column: ColumnId,
        index_type: IndexType,
    },
    Insert {
        table: TableId,
        values: Vec<i32>,
    },
    /// Bulk load, one vector per column.
    Load {
        table: TableId,
        columns: Vec<Vec<i32>>,
    },
    Select {
        source: ValueSource,
        positions: Option<Arc<ResultVector>>,
        comparator: Comparator,
        output: String,
    },
    Fetch {
        source: ValueSource,
        positions: Arc<ResultVector>,
        output: String,
    },
    Aggregate {
        op: AggregateOp,
        outputs: Vec<String>,
    },
    Join {
        left: JoinInput,
        right: JoinInput,
        strategy: JoinStrategy,
        outputs: [String; 2],
    },
    Delete {
        table: TableId,
        positions: Arc<ResultVector>,
    },
    Update {
        column: ColumnId,
        positions: Arc<ResultVector>,
        value: i32,
    },
    Print {
        sources: Vec<ValueSource>,
    },
    BatchBegin,
    BatchExecute,
    Shutdown,
}

impl DbOperator {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DbOperator::CreateDatabase { .. } => "create_db",
            DbOperator::CreateTable { .. } => "create_tbl",
            DbOperator::CreateColumn { .. } => "create_col",
            DbOperator::CreateIndex { .. } => "create_idx",
            DbOperator::Insert { .. } => "insert",
            DbOperator::Load { .. } => "load",
            DbOperator::Select { .. } => "select",
            DbOperator::Fetch { .. } => "fetch",
            DbOperator::Aggregate { .. } => "aggregate",
            DbOperator::Join { .. } => "join",
            DbOperator::Delete { .. } => "delete",
            DbOperator::Update { .. } => "update",
            DbOperator::Print { .. } => "print",
            DbOperator::BatchBegin => "batch_queries",
            DbOperator::BatchExecute => "batch_execute",
            DbOperator::Shutdown => "shutdown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparator_is_half_open() {
        let cmp = Comparator::between(3, 9);
        assert!(cmp.matches_i64(3));
        assert!(cmp.matches_i64(8));
        assert!(!cmp.matches_i64(9));
        assert!(!cmp.matches_i64(2));
        assert!(cmp.matches_f64(8.5));
        assert!(!cmp.matches_f64(9.0));

        let open = Comparator::default();
        assert!(open.is_unbounded());
        assert!(open.matches_i64(i64::MIN));
    }

    #[test]
    fn test_key_bounds_clamp_to_i32() {
        assert_eq!(
            Comparator::between(3, 9).key_bounds(),
            Some((Some(3), Some(9)))
        );
        let wide = Comparator::between(i64::MIN, i64::MAX);
        assert_eq!(wide.key_bounds(), Some((None, None)));
        assert_eq!(
            Comparator::new(Some(i64::from(i32::MAX) + 1), None).key_bounds(),
            None
        );
        assert_eq!(
            Comparator::new(None, Some(i64::from(i32::MIN))).key_bounds(),
            None
        );
        assert_eq!(
            Comparator::new(None, Some(i64::from(i32::MIN) + 1)).key_bounds(),
            Some((None, Some(i32::MIN + 1)))
        );
    }

    #[test]
    fn test_output_count() {
        let col = || {
            ValueSource::Column(ColumnId {
                table: TableId(0),
                column: 0,
            })
        };
        let with_positions = AggregateOp::Min {
            values: col(),
            positions: Some(Arc::new(ResultVector::Int(vec![0]))),
        };
        assert_eq!(with_positions.output_count(), 2);
        assert_eq!(AggregateOp::Sum(col()).output_count(), 1);
        assert_eq!(AggregateOp::Add(col(), col()).output_count(), 1);
    }
}
