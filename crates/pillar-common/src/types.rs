//! Value type and index type descriptors.

use crate::error::{PillarError, Result};
use serde::{Deserialize, Serialize};

/// Element type of a result vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DataType {
    Int = 0,
    Float = 1,
    Long = 2,
}

impl DataType {
    /// Returns the byte width of one value.
    pub fn width(&self) -> usize {
        match self {
            DataType::Int => 4,
            DataType::Float | DataType::Long => 8,
        }
    }

    /// Result type of an elementwise ADD/SUB over the two operand types.
    ///
    /// Float wins over everything, then Long, otherwise Int.
    pub fn promote(self, other: DataType) -> DataType {
        match (self, other) {
            (DataType::Float, _) | (_, DataType::Float) => DataType::Float,
            (DataType::Long, _) | (_, DataType::Long) => DataType::Long,
            _ => DataType::Int,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Long => "long",
        };
        f.write_str(name)
    }
}

impl TryFrom<u8> for DataType {
    type Error = PillarError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(DataType::Int),
            1 => Ok(DataType::Float),
            2 => Ok(DataType::Long),
            _ => Err(PillarError::invalid_argument("data_type", value)),
        }
    }
}

/// Index descriptor attached to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum IndexType {
    #[default]
    None = 0,
    BTreeClustered = 1,
    BTreeUnclustered = 2,
    SortedClustered = 3,
    SortedUnclustered = 4,
}

impl IndexType {
    /// True if the index dictates the physical row order of the table.
    pub fn is_clustered(&self) -> bool {
        matches!(self, IndexType::BTreeClustered | IndexType::SortedClustered)
    }

    /// True for both B+tree variants.
    pub fn is_btree(&self) -> bool {
        matches!(self, IndexType::BTreeClustered | IndexType::BTreeUnclustered)
    }
}

impl TryFrom<u8> for IndexType {
    type Error = PillarError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(IndexType::None),
            1 => Ok(IndexType::BTreeClustered),
            2 => Ok(IndexType::BTreeUnclustered),
            3 => Ok(IndexType::SortedClustered),
            4 => Ok(IndexType::SortedUnclustered),
            _ => Err(PillarError::invalid_argument("index_type", value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_promotion_table() {
        use DataType::*;
        assert_eq!(Int.promote(Int), Int);
        assert_eq!(Int.promote(Long), Long);
        assert_eq!(Long.promote(Int), Long);
        assert_eq!(Long.promote(Long), Long);
        assert_eq!(Int.promote(Float), Float);
        assert_eq!(Float.promote(Long), Float);
        assert_eq!(Float.promote(Float), Float);
    }

    #[test]
    fn test_data_type_from_u8() {
        assert_eq!(DataType::try_from(0).unwrap(), DataType::Int);
        assert_eq!(DataType::try_from(2).unwrap(), DataType::Long);
        assert!(DataType::try_from(9).is_err());
    }

    #[test]
    fn test_index_type_flags() {
        assert!(IndexType::BTreeClustered.is_clustered());
        assert!(IndexType::SortedClustered.is_clustered());
        assert!(!IndexType::BTreeUnclustered.is_clustered());
        assert!(!IndexType::SortedUnclustered.is_clustered());
        assert!(!IndexType::None.is_clustered());

        assert!(IndexType::BTreeUnclustered.is_btree());
        assert!(!IndexType::SortedUnclustered.is_btree());
    }

    #[test]
    fn test_index_type_from_u8() {
        for ty in [
            IndexType::None,
            IndexType::BTreeClustered,
            IndexType::BTreeUnclustered,
            IndexType::SortedClustered,
            IndexType::SortedUnclustered,
        ] {
            assert_eq!(IndexType::try_from(ty as u8).unwrap(), ty);
        }
        assert!(IndexType::try_from(5).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(DataType::Float.to_string(), "float");
        assert_eq!(DataType::Long.width(), 8);
    }
}
