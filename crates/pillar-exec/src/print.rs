//! Row-aligned result sets returned by `print`.
//!
//! Wire layout, little-endian:
//!
//! ```text
//! +-----------+-----------+----------------------------------------+
//! | rows: u64 | cols: u32 | per column: type tag u8, rows values   |
//! +-----------+-----------+----------------------------------------+
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use pillar_common::{DataType, PillarError, Result};

use crate::result::ResultVector;

#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    rows: usize,
    columns: Vec<ResultVector>,
}

impl ResultSet {
    /// Builds a result set. Every vector must have the same length.
    pub fn new(columns: Vec<ResultVector>) -> Result<Self> {
        let rows = columns.first().map_or(0, ResultVector::num_tuples);
        if let Some(bad) = columns.iter().find(|c| c.num_tuples() != rows) {
            return Err(PillarError::LengthMismatch {
                left: rows,
                right: bad.num_tuples(),
            });
        }
        Ok(Self { rows, columns })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> &[ResultVector] {
        &self.columns
    }

    pub fn encode(&self) -> Bytes {
        let width: usize = self.columns.iter().map(|c| c.data_type().width()).sum();
        let mut buf = BytesMut::with_capacity(12 + self.columns.len() + self.rows * width);
        buf.put_u64_le(self.rows as u64);
        buf.put_u32_le(self.columns.len() as u32);
        for column in &self.columns {
            buf.put_u8(column.data_type() as u8);
            match column {
                ResultVector::Int(v) => v.iter().for_each(|&x| buf.put_i32_le(x)),
                ResultVector::Float(v) => v.iter().for_each(|&x| buf.put_f64_le(x)),
                ResultVector::Long(v) => v.iter().for_each(|&x| buf.put_i64_le(x)),
            }
        }
        buf.freeze()
    }

    pub fn decode(mut data: &[u8]) -> Result<Self> {
        if data.remaining() < 12 {
            return Err(truncated());
        }
        let rows = usize::try_from(data.get_u64_le())
            .map_err(|_| PillarError::IncorrectFormat("row count exceeds usize".to_string()))?;
        let count = data.get_u32_le() as usize;
        let mut columns = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            if !data.has_remaining() {
                return Err(truncated());
            }
            let data_type = DataType::try_from(data.get_u8())?;
            let needed = rows
                .checked_mul(data_type.width())
                .ok_or_else(truncated)?;
            if data.remaining() < needed {
                return Err(truncated());
            }
            let column = match data_type {
                DataType::Int => ResultVector::Int((0..rows).map(|_| data.get_i32_le()).collect()),
                DataType::Float => {
                    ResultVector::Float((0..rows).map(|_| data.get_f64_le()).collect())
                }
                DataType::Long => ResultVector::Long((0..rows).map(|_| data.get_i64_le()).collect()),
            };
            columns.push(column);
        }
        if data.has_remaining() {
            return Err(PillarError::IncorrectFormat(format!(
                "{} trailing bytes in result set",
                data.remaining()
            )));
        }
        Ok(Self { rows, columns })
    }
}

/// Renders rows as comma-separated lines.
impl std::fmt::Display for ResultSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in 0..self.rows {
            for (i, column) in self.columns.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                match column {
                    ResultVector::Int(v) => write!(f, "{}", v[row])?,
                    ResultVector::Float(v) => write!(f, "{:.2}", v[row])?,
                    ResultVector::Long(v) => write!(f, "{}", v[row])?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn truncated() -> PillarError {
    PillarError::IncorrectFormat("truncated result set".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultSet {
        ResultSet::new(vec![
            ResultVector::Int(vec![1, -2]),
            ResultVector::Float(vec![0.5, 2.25]),
            ResultVector::Long(vec![i64::MAX, 0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_encode_decode() {
        let set = sample();
        let bytes = set.encode();
        assert_eq!(bytes.len(), 12 + 3 + 2 * (4 + 8 + 8));
        assert_eq!(ResultSet::decode(&bytes).unwrap(), set);
    }

    #[test]
    fn test_decode_rejects_damage() {
        let bytes = sample().encode();
        assert!(ResultSet::decode(&bytes[..bytes.len() - 1]).is_err());
        assert!(ResultSet::decode(&bytes[..5]).is_err());

        let mut extra = bytes.to_vec();
        extra.push(0);
        assert!(ResultSet::decode(&extra).is_err());

        let mut bad_tag = bytes.to_vec();
        bad_tag[12] = 9;
        assert!(ResultSet::decode(&bad_tag).is_err());
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let err = ResultSet::new(vec![ResultVector::Int(vec![1]), ResultVector::Int(vec![])]);
        assert!(matches!(err, Err(PillarError::LengthMismatch { left: 1, right: 0 })));
    }

    #[test]
    fn test_display() {
        assert_eq!(sample().to_string(), format!("1,0.50,{}\n-2,2.25,0\n", i64::MAX));
        assert_eq!(ResultSet::new(vec![]).unwrap().to_string(), "");
    }
}
