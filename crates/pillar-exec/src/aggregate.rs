//! Aggregates and element-wise arithmetic.

use pillar_common::{DataType, PillarError, Result};
use pillar_storage::Database;

use crate::operator::{AggregateOp, ValueSource};
use crate::result::{ResultVector, Values};

/// Output of an aggregate operator.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateOutput {
    Single(ResultVector),
    /// Extremum together with the position it was found at.
    WithPosition {
        position: ResultVector,
        value: ResultVector,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extremum {
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arith {
    Add,
    Sub,
}

pub fn aggregate(db: &Database, op: &AggregateOp) -> Result<AggregateOutput> {
    match op {
        AggregateOp::Min { values, positions } => {
            extremum(db, values, positions.as_deref(), Extremum::Min)
        }
        AggregateOp::Max { values, positions } => {
            extremum(db, values, positions.as_deref(), Extremum::Max)
        }
        AggregateOp::Sum(values) => sum(values.values(db)?).map(AggregateOutput::Single),
        AggregateOp::Avg(values) => Ok(AggregateOutput::Single(avg(values.values(db)?))),
        AggregateOp::Add(a, b) => {
            arithmetic(a.values(db)?, b.values(db)?, Arith::Add).map(AggregateOutput::Single)
        }
        AggregateOp::Sub(a, b) => {
            arithmetic(a.values(db)?, b.values(db)?, Arith::Sub).map(AggregateOutput::Single)
        }
    }
}

/// Index of the first extremal element.
fn find_extreme<T: PartialOrd + Copy>(
    values: impl Iterator<Item = T>,
    kind: Extremum,
) -> Option<(usize, T)> {
    let mut best: Option<(usize, T)> = None;
    for (i, v) in values.enumerate() {
        best = match best {
            None => Some((i, v)),
            Some((_, b)) if kind == Extremum::Min && v < b => Some((i, v)),
            Some((_, b)) if kind == Extremum::Max && v > b => Some((i, v)),
            keep => keep,
        };
    }
    best
}

fn extremum(
    db: &Database,
    source: &ValueSource,
    positions: Option<&ResultVector>,
    kind: Extremum,
) -> Result<AggregateOutput> {
    let values = source.values(db)?;
    let Some(position_list) = positions else {
        let (_, value) = pick(values, kind);
        return Ok(AggregateOutput::Single(value));
    };

    // Column sources are indexed by position; result sources are aligned.
    let list = if source.is_column() {
        position_list.as_positions(Some(values.len()))?
    } else {
        let list = position_list.as_positions(None)?;
        if list.len() != values.len() {
            return Err(PillarError::LengthMismatch {
                left: list.len(),
                right: values.len(),
            });
        }
        list
    };
    let gathered = source.is_column().then(|| values.gather(&list));
    let candidates = gathered.as_ref().map_or(values, ResultVector::values);

    let (winner, value) = pick(candidates, kind);
    let position = match winner {
        Some(i) => ResultVector::from_positions(&[list[i]])?,
        None => ResultVector::Int(Vec::new()),
    };
    Ok(AggregateOutput::WithPosition { position, value })
}

/// Index and value of the extremum, or an empty vector of the input type.
fn pick(candidates: Values<'_>, kind: Extremum) -> (Option<usize>, ResultVector) {
    match candidates {
        Values::Int(v) => split_winner(find_extreme(v.iter().copied(), kind), ResultVector::Int),
        Values::Long(v) => split_winner(find_extreme(v.iter().copied(), kind), ResultVector::Long),
        Values::Float(v) => {
            split_winner(find_extreme(v.iter().copied(), kind), ResultVector::Float)
        }
    }
}

fn split_winner<T>(
    found: Option<(usize, T)>,
    wrap: fn(Vec<T>) -> ResultVector,
) -> (Option<usize>, ResultVector) {
    match found {
        Some((i, v)) => (Some(i), wrap(vec![v])),
        None => (None, wrap(Vec::new())),
    }
}

/// Sum of a vector. Integer inputs produce a long; an empty input sums to 0.
fn sum(values: Values<'_>) -> Result<ResultVector> {
    match values {
        Values::Int(v) => Ok(ResultVector::Long(vec![
            v.iter().map(|&x| i64::from(x)).sum(),
        ])),
        Values::Long(v) => {
            let total: i128 = v.iter().map(|&x| i128::from(x)).sum();
            let total = i64::try_from(total)
                .map_err(|_| PillarError::Overflow(format!("sum {} exceeds long", total)))?;
            Ok(ResultVector::Long(vec![total]))
        }
        Values::Float(v) => Ok(ResultVector::Float(vec![v.iter().sum()])),
    }
}

/// Mean as a float. An empty input averages to 0.
fn avg(values: Values<'_>) -> ResultVector {
    let n = values.len();
    if n == 0 {
        return ResultVector::Float(vec![0.0]);
    }
    let total: f64 = match values {
        Values::Int(v) => v.iter().map(|&x| i64::from(x)).sum::<i64>() as f64,
        Values::Long(v) => v.iter().map(|&x| i128::from(x)).sum::<i128>() as f64,
        Values::Float(v) => v.iter().sum(),
    };
    ResultVector::Float(vec![total / n as f64])
}

/// Element-wise add or subtract in the promoted type of both inputs.
fn arithmetic(a: Values<'_>, b: Values<'_>, op: Arith) -> Result<ResultVector> {
    if a.len() != b.len() {
        return Err(PillarError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    let out = match a.data_type().promote(b.data_type()) {
        DataType::Int => {
            let (Values::Int(x), Values::Int(y)) = (a, b) else {
                return Err(PillarError::Internal("int promotion of non-int input".into()));
            };
            ResultVector::Int(
                x.iter()
                    .zip(y)
                    .map(|(&l, &r)| match op {
                        Arith::Add => l.wrapping_add(r),
                        Arith::Sub => l.wrapping_sub(r),
                    })
                    .collect(),
            )
        }
        DataType::Long => ResultVector::Long(
            a.to_i64()
                .into_iter()
                .zip(b.to_i64())
                .map(|(l, r)| match op {
                    Arith::Add => l.wrapping_add(r),
                    Arith::Sub => l.wrapping_sub(r),
                })
                .collect(),
        ),
        DataType::Float => ResultVector::Float(
            a.to_f64()
                .into_iter()
                .zip(b.to_f64())
                .map(|(l, r)| match op {
                    Arith::Add => l + r,
                    Arith::Sub => l - r,
                })
                .collect(),
        ),
    };
    Ok(out)
}
