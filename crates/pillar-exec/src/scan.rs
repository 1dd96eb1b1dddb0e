//! Range selection over columns and result vectors.
//!
//! A bounded full-column select on an indexed column is answered from the
//! index. Everything else falls back to a linear scan in row order.

use pillar_common::{IndexType, PillarError, Result};
use pillar_storage::{Column, ColumnIndex, Database, search_key};
use tracing::trace;

use crate::operator::{Comparator, ValueSource};
use crate::result::{ResultVector, Values};

/// Returns the positions whose value satisfies `comparator`.
///
/// With a position list and a column source, the list names the rows to test.
/// With a result source, values and positions are aligned element-wise and
/// the matching positions are reported.
pub fn select(
    db: &Database,
    source: &ValueSource,
    positions: Option<&ResultVector>,
    comparator: &Comparator,
) -> Result<ResultVector> {
    if let (ValueSource::Column(id), None) = (source, positions) {
        let column = db.column(*id)?;
        if let Some(hits) = index_select(column, comparator) {
            trace!(column = column.name(), hits = hits.len(), "index select");
            return ResultVector::from_positions(&hits);
        }
    }

    let values = source.values(db)?;
    let hits = match positions {
        None => scan_values(values, comparator),
        Some(list) if source.is_column() => {
            let list = list.as_positions(Some(values.len()))?;
            filter_positions(values, &list, comparator)
        }
        Some(list) => {
            let list = list.as_positions(None)?;
            if list.len() != values.len() {
                return Err(PillarError::LengthMismatch {
                    left: list.len(),
                    right: values.len(),
                });
            }
            filter_aligned(values, &list, comparator)
        }
    };
    ResultVector::from_positions(&hits)
}

/// Answers a select from the column's index.
///
/// Returns `None` when the column has no index or the predicate leaves the
/// key range open on both sides; those selects scan in row order.
fn index_select(column: &Column, comparator: &Comparator) -> Option<Vec<usize>> {
    if column.index_type() == IndexType::None || comparator.is_unbounded() {
        return None;
    }
    let (lower, upper) = match comparator.key_bounds() {
        None => return Some(Vec::new()),
        Some((None, None)) => return None,
        Some(bounds) => bounds,
    };
    let hits = match (column.index(), column.index_type()) {
        (ColumnIndex::BTree(tree), IndexType::BTreeClustered) => {
            tree.clustered_range(lower, upper).collect()
        }
        (ColumnIndex::BTree(tree), _) => tree.unclustered_range(lower, upper),
        (ColumnIndex::None, IndexType::SortedClustered) => {
            sorted_data_range(column.data(), lower, upper).collect()
        }
        (ColumnIndex::Sorted(sorted), _) => sorted.range(lower, upper).to_vec(),
        (ColumnIndex::None, _) => return None,
    };
    Some(hits)
}

/// Binary searches a column whose data is physically sorted.
fn sorted_data_range(
    data: &[i32],
    lower: Option<i32>,
    upper: Option<i32>,
) -> std::ops::Range<usize> {
    let start = lower.map_or(0, |l| search_key(data, l));
    let end = upper.map_or(data.len(), |u| search_key(data, u));
    start..end.max(start)
}

pub(crate) fn scan_values(values: Values<'_>, comparator: &Comparator) -> Vec<usize> {
    match values {
        Values::Int(v) => scan_ints(v, 0, comparator),
        Values::Long(v) => v
            .iter()
            .enumerate()
            .filter(|(_, x)| comparator.matches_i64(**x))
            .map(|(i, _)| i)
            .collect(),
        Values::Float(v) => v
            .iter()
            .enumerate()
            .filter(|(_, x)| comparator.matches_f64(**x))
            .map(|(i, _)| i)
            .collect(),
    }
}

/// Linear scan over an int slice, reporting `offset + i` for every hit.
pub(crate) fn scan_ints(data: &[i32], offset: usize, comparator: &Comparator) -> Vec<usize> {
    let mut hits = Vec::new();
    for (i, &v) in data.iter().enumerate() {
        if comparator.matches_i64(i64::from(v)) {
            hits.push(offset + i);
        }
    }
    hits
}

fn matches_at(values: Values<'_>, idx: usize, comparator: &Comparator) -> bool {
    match values {
        Values::Int(v) => comparator.matches_i64(i64::from(v[idx])),
        Values::Long(v) => comparator.matches_i64(v[idx]),
        Values::Float(v) => comparator.matches_f64(v[idx]),
    }
}

fn filter_positions(values: Values<'_>, list: &[usize], comparator: &Comparator) -> Vec<usize> {
    list.iter()
        .copied()
        .filter(|&p| matches_at(values, p, comparator))
        .collect()
}

fn filter_aligned(values: Values<'_>, list: &[usize], comparator: &Comparator) -> Vec<usize> {
    list.iter()
        .enumerate()
        .filter(|(i, _)| matches_at(values, *i, comparator))
        .map(|(_, &p)| p)
        .collect()
}
