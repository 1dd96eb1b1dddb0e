//! Result vectors produced by operators.

use pillar_common::{DataType, PillarError, Result};

/// Owned operator output: a position list or a typed value vector.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultVector {
    Int(Vec<i32>),
    Float(Vec<f64>),
    Long(Vec<i64>),
}

impl ResultVector {
    /// Builds an integer position vector.
    pub fn from_positions(positions: &[usize]) -> Result<Self> {
        positions
            .iter()
            .map(|&pos| {
                i32::try_from(pos)
                    .map_err(|_| PillarError::Overflow(format!("position {} exceeds i32", pos)))
            })
            .collect::<Result<Vec<i32>>>()
            .map(ResultVector::Int)
    }

    pub fn num_tuples(&self) -> usize {
        match self {
            ResultVector::Int(v) => v.len(),
            ResultVector::Float(v) => v.len(),
            ResultVector::Long(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.num_tuples() == 0
    }

    pub fn data_type(&self) -> DataType {
        match self {
            ResultVector::Int(_) => DataType::Int,
            ResultVector::Float(_) => DataType::Float,
            ResultVector::Long(_) => DataType::Long,
        }
    }

    /// Borrowed view of the payload.
    pub fn values(&self) -> Values<'_> {
        match self {
            ResultVector::Int(v) => Values::Int(v),
            ResultVector::Float(v) => Values::Float(v),
            ResultVector::Long(v) => Values::Long(v),
        }
    }

    /// Reads this vector as row positions.
    ///
    /// Fails unless it is an integer vector whose entries are non-negative
    /// and, when `limit` is given, below it.
    pub fn as_positions(&self, limit: Option<usize>) -> Result<Vec<usize>> {
        let ResultVector::Int(raw) = self else {
            return Err(PillarError::TypeMismatch {
                expected: DataType::Int.to_string(),
                actual: self.data_type().to_string(),
            });
        };
        let bound = limit.unwrap_or(usize::MAX);
        raw.iter()
            .map(|&pos| match usize::try_from(pos) {
                Ok(p) if p < bound => Ok(p),
                Ok(_) => Err(PillarError::PositionOutOfRange {
                    position: i64::from(pos),
                    len: bound,
                }),
                Err(_) => Err(PillarError::invalid_argument("position", pos)),
            })
            .collect()
    }
}

/// Borrowed typed values, from a column or a result vector.
#[derive(Debug, Clone, Copy)]
pub enum Values<'a> {
    Int(&'a [i32]),
    Float(&'a [f64]),
    Long(&'a [i64]),
}

impl Values<'_> {
    pub fn len(&self) -> usize {
        match self {
            Values::Int(v) => v.len(),
            Values::Float(v) => v.len(),
            Values::Long(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Values::Int(_) => DataType::Int,
            Values::Float(_) => DataType::Float,
            Values::Long(_) => DataType::Long,
        }
    }

    /// Gathers `values[positions[i]]` in position-list order.
    pub fn gather(&self, positions: &[usize]) -> ResultVector {
        match self {
            Values::Int(v) => ResultVector::Int(positions.iter().map(|&p| v[p]).collect()),
            Values::Float(v) => ResultVector::Float(positions.iter().map(|&p| v[p]).collect()),
            Values::Long(v) => ResultVector::Long(positions.iter().map(|&p| v[p]).collect()),
        }
    }

    /// An empty vector of the same type.
    pub fn empty_like(&self) -> ResultVector {
        match self {
            Values::Int(_) => ResultVector::Int(Vec::new()),
            Values::Float(_) => ResultVector::Float(Vec::new()),
            Values::Long(_) => ResultVector::Long(Vec::new()),
        }
    }

    pub fn to_owned_vector(&self) -> ResultVector {
        match self {
            Values::Int(v) => ResultVector::Int(v.to_vec()),
            Values::Float(v) => ResultVector::Float(v.to_vec()),
            Values::Long(v) => ResultVector::Long(v.to_vec()),
        }
    }

    /// Widens integer values to i64. Float values are truncated.
    pub fn to_i64(&self) -> Vec<i64> {
        match self {
            Values::Int(v) => v.iter().map(|&x| i64::from(x)).collect(),
            Values::Float(v) => v.iter().map(|&x| x as i64).collect(),
            Values::Long(v) => v.to_vec(),
        }
    }

    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            Values::Int(v) => v.iter().map(|&x| f64::from(x)).collect(),
            Values::Float(v) => v.to_vec(),
            Values::Long(v) => v.iter().map(|&x| x as f64).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_positions() {
        let v = ResultVector::from_positions(&[0, 3, 7]).unwrap();
        assert_eq!(v, ResultVector::Int(vec![0, 3, 7]));
        assert_eq!(v.num_tuples(), 3);
        assert_eq!(v.data_type(), DataType::Int);

        let too_big = usize::try_from(i64::from(i32::MAX) + 1).unwrap();
        assert!(matches!(
            ResultVector::from_positions(&[too_big]),
            Err(PillarError::Overflow(_))
        ));
    }

    #[test]
    fn test_as_positions_validates() {
        let v = ResultVector::Int(vec![2, 0, 4]);
        assert_eq!(v.as_positions(Some(5)).unwrap(), vec![2, 0, 4]);
        assert!(matches!(
            v.as_positions(Some(4)),
            Err(PillarError::PositionOutOfRange { position: 4, len: 4 })
        ));

        let negative = ResultVector::Int(vec![-1]);
        assert!(matches!(
            negative.as_positions(None),
            Err(PillarError::InvalidArgument { .. })
        ));

        let floats = ResultVector::Float(vec![1.0]);
        assert!(matches!(
            floats.as_positions(None),
            Err(PillarError::TypeMismatch { ref expected, ref actual })
                if expected == "int" && actual == "float"
        ));
    }

    #[test]
    fn test_values_gather_and_widen() {
        let raw = [10, 20, 30];
        let values = Values::Int(&raw);
        assert_eq!(values.gather(&[2, 2, 0]), ResultVector::Int(vec![30, 30, 10]));
        assert_eq!(values.to_i64(), vec![10, 20, 30]);
        assert_eq!(values.to_f64(), vec![10.0, 20.0, 30.0]);
        assert_eq!(values.empty_like(), ResultVector::Int(vec![]));

        let longs = [5i64, 6];
        assert_eq!(Values::Long(&longs).gather(&[1]), ResultVector::Long(vec![6]));
    }
}
