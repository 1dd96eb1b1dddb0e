//! Positional gather.

use pillar_common::Result;
use pillar_storage::Database;

use crate::operator::ValueSource;
use crate::result::ResultVector;

/// Gathers `source[positions[i]]` for every entry of the position list,
/// preserving list order and duplicates.
pub fn fetch(db: &Database, source: &ValueSource, positions: &ResultVector) -> Result<ResultVector> {
    let values = source.values(db)?;
    if positions.is_empty() {
        return Ok(values.empty_like());
    }
    let list = positions.as_positions(Some(values.len()))?;
    Ok(values.gather(&list))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pillar_common::PillarError;
    use pillar_storage::ColumnId;
    use std::sync::Arc;

    #[test]
    fn test_fetch_from_column() {
        let mut db = Database::new("db", 1);
        let t = db.create_table("t", 1, 4);
        let table = db.table_mut(t).unwrap();
        let column = table.add_column("a");
        table.load_columns(vec![vec![10, 20, 30, 40]]).unwrap();
        let source = ValueSource::Column(ColumnId { table: t, column });

        let out = fetch(&db, &source, &ResultVector::Int(vec![3, 0, 3])).unwrap();
        assert_eq!(out, ResultVector::Int(vec![40, 10, 40]));

        let empty = fetch(&db, &source, &ResultVector::Int(vec![])).unwrap();
        assert_eq!(empty, ResultVector::Int(vec![]));

        assert!(matches!(
            fetch(&db, &source, &ResultVector::Int(vec![4])),
            Err(PillarError::PositionOutOfRange { position: 4, len: 4 })
        ));
    }

    #[test]
    fn test_fetch_from_result_keeps_type() {
        let db = Database::new("db", 1);
        let source = ValueSource::Result(Arc::new(ResultVector::Float(vec![0.5, 1.5])));
        let out = fetch(&db, &source, &ResultVector::Int(vec![1])).unwrap();
        assert_eq!(out, ResultVector::Float(vec![1.5]));
        let empty = fetch(&db, &source, &ResultVector::Int(vec![])).unwrap();
        assert_eq!(empty, ResultVector::Float(vec![]));
    }
}
