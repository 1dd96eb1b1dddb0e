//! Row-level writes: insert, bulk load, delete and update.

use pillar_common::{PillarError, Result};
use pillar_storage::Table;
use tracing::debug;

use crate::result::ResultVector;

/// Inserts one row and returns its physical position.
pub fn insert(table: &mut Table, values: &[i32]) -> Result<usize> {
    table.insert_row(values)
}

/// Bulk loads a column-major batch and returns the number of rows added.
pub fn load(table: &mut Table, columns: Vec<Vec<i32>>) -> Result<usize> {
    let rows = table.load_columns(columns)?;
    debug!(table = table.name(), rows, "bulk load complete");
    Ok(rows)
}

/// Sorted, deduplicated row positions taken from a position vector.
fn row_positions(table: &Table, positions: &ResultVector) -> Result<Vec<usize>> {
    let mut list = positions.as_positions(Some(table.row_count()))?;
    list.sort_unstable();
    list.dedup();
    Ok(list)
}

/// Deletes the listed rows in any order, ignoring duplicates.
pub fn delete(table: &mut Table, positions: &ResultVector) -> Result<usize> {
    let list = row_positions(table, positions)?;
    table.delete_rows(&list)?;
    debug!(table = table.name(), rows = list.len(), "rows deleted");
    Ok(list.len())
}

/// Sets `column` to `value` on the listed rows.
///
/// Rows are deleted and reinserted so every index, and the physical order of
/// a clustered table, stays consistent.
pub fn update(
    table: &mut Table,
    column: usize,
    positions: &ResultVector,
    value: i32,
) -> Result<usize> {
    if column >= table.columns().len() {
        return Err(PillarError::ObjectNotFound(format!(
            "{}.#{}",
            table.name(),
            column
        )));
    }
    let list = row_positions(table, positions)?;
    let rows = list
        .iter()
        .map(|&p| {
            let mut row = table.row(p)?;
            row[column] = value;
            Ok(row)
        })
        .collect::<Result<Vec<_>>>()?;

    table.delete_rows(&list)?;
    for row in &rows {
        table.insert_row(row)?;
    }
    debug!(table = table.name(), rows = rows.len(), "rows updated");
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pillar_common::IndexType;

    fn table(index: IndexType) -> Table {
        let mut table = Table::new("t", 2, 4);
        table.add_column("a");
        table.add_column("b");
        if index != IndexType::None {
            table.create_index(0, index, 4, 3).unwrap();
        }
        table
            .load_columns(vec![vec![5, 1, 4, 2, 3], vec![50, 10, 40, 20, 30]])
            .unwrap();
        table
    }

    fn rows(table: &Table) -> Vec<Vec<i32>> {
        (0..table.row_count()).map(|p| table.row(p).unwrap()).collect()
    }

    #[test]
    fn test_delete_accepts_any_order() {
        let mut t = table(IndexType::None);
        let n = delete(&mut t, &ResultVector::Int(vec![3, 0, 3, 1])).unwrap();
        assert_eq!(n, 3);
        assert_eq!(rows(&t), vec![vec![4, 40], vec![3, 30]]);

        assert!(matches!(
            delete(&mut t, &ResultVector::Int(vec![2])),
            Err(PillarError::PositionOutOfRange { .. })
        ));
    }

    #[test]
    fn test_update_unclustered_keeps_row_set() {
        let mut t = table(IndexType::BTreeUnclustered);
        let n = update(&mut t, 1, &ResultVector::Int(vec![0, 2]), 99).unwrap();
        assert_eq!(n, 2);
        let mut got = rows(&t);
        got.sort();
        assert_eq!(
            got,
            vec![vec![1, 10], vec![2, 20], vec![3, 30], vec![4, 99], vec![5, 99]]
        );
    }

    #[test]
    fn test_update_clustered_key_moves_row() {
        let mut t = table(IndexType::SortedClustered);
        // Physical order is by `a`: [1, 2, 3, 4, 5]. Move the 1 to the end.
        update(&mut t, 0, &ResultVector::Int(vec![0]), 9).unwrap();
        assert_eq!(t.column(0).unwrap().data(), &[2, 3, 4, 5, 9]);
        assert_eq!(t.column(1).unwrap().data(), &[20, 30, 40, 50, 10]);
    }

    #[test]
    fn test_update_unknown_column() {
        let mut t = table(IndexType::None);
        assert!(matches!(
            update(&mut t, 7, &ResultVector::Int(vec![0]), 1),
            Err(PillarError::ObjectNotFound(_))
        ));
    }
}
