//! Tables: columns that share one physical row order.

use crate::btree::search_key;
use crate::column::Column;
use pillar_common::{IndexType, PillarError, Result};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    row_count: usize,
    row_capacity: usize,
}

impl Table {
    /// Creates an empty table with room for `column_slots` columns and
    /// `row_capacity` rows per column.
    pub fn new(name: impl Into<String>, column_slots: usize, row_capacity: usize) -> Self {
        Self {
            name: name.into(),
            columns: Vec::with_capacity(column_slots),
            row_count: 0,
            row_capacity: row_capacity.max(1),
        }
    }

    pub(crate) fn from_parts(
        name: String,
        columns: Vec<Column>,
        row_count: usize,
        row_capacity: usize,
    ) -> Self {
        Self {
            name,
            columns,
            row_count,
            row_capacity: row_capacity.max(row_count).max(1),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn row_capacity(&self) -> usize {
        self.row_capacity
    }

    /// Column whose index dictates the physical row order, if any.
    pub fn clustered_column(&self) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.index_type().is_clustered())
    }

    /// Appends a column, zero-filled for the rows the table already holds.
    pub fn add_column(&mut self, name: impl Into<String>) -> usize {
        let mut column = Column::new(name, self.row_capacity);
        column.data_mut().resize(self.row_count, 0);
        column.set_clustered(self.clustered_column().is_some());
        self.columns.push(column);
        self.columns.len() - 1
    }

    /// Attaches an index to column `idx`.
    ///
    /// A clustered request marks every column clustered and reorders any
    /// existing rows by the indexed column.
    pub fn create_index(
        &mut self,
        idx: usize,
        index_type: IndexType,
        leaf_capacity: usize,
        fanout: usize,
    ) -> Result<()> {
        let column = self
            .columns
            .get(idx)
            .ok_or_else(|| PillarError::ObjectNotFound(format!("{}.#{}", self.name, idx)))?;
        if column.index_type() != IndexType::None {
            return Err(PillarError::ObjectAlreadyExists(format!(
                "index on {}.{}",
                self.name,
                column.name()
            )));
        }

        if index_type.is_clustered() {
            if let Some(existing) = self.clustered_column() {
                return Err(PillarError::ObjectAlreadyExists(format!(
                    "clustered index on {}.{}",
                    self.name,
                    self.columns[existing].name()
                )));
            }
            for column in &mut self.columns {
                column.set_clustered(true);
            }
            self.columns[idx].attach_index(index_type, leaf_capacity, fanout);
            self.reorder_by(idx);
        } else {
            self.columns[idx].attach_index(index_type, leaf_capacity, fanout);
        }
        Ok(())
    }

    /// Grows row capacity by doubling until `rows` fills at most half of it.
    fn reserve_rows(&mut self, rows: usize) {
        let mut capacity = self.row_capacity;
        while rows > capacity / 2 {
            capacity *= 2;
        }
        if capacity != self.row_capacity {
            debug!(table = %self.name, from = self.row_capacity, to = capacity, "row capacity grown");
            self.row_capacity = capacity;
            for column in &mut self.columns {
                column.reserve_rows(capacity);
            }
        }
    }

    /// Inserts one row and returns the position it landed at.
    ///
    /// Clustered tables place the row at the leftmost slot for its key in the
    /// clustered column and shift every column in lock-step. Others append.
    pub fn insert_row(&mut self, values: &[i32]) -> Result<usize> {
        if values.len() != self.columns.len() {
            return Err(PillarError::IncorrectFormat(format!(
                "{} expects {} values, got {}",
                self.name,
                self.columns.len(),
                values.len()
            )));
        }
        self.reserve_rows(self.row_count + 1);

        let position = match self.clustered_column() {
            Some(c) => search_key(self.columns[c].data(), values[c]),
            None => self.row_count,
        };
        let middle = position != self.row_count;

        for (column, &value) in self.columns.iter_mut().zip(values) {
            column.data_mut().insert(position, value);
            column.index_insert(value, position, middle);
        }
        self.row_count += 1;
        Ok(position)
    }

    /// Appends a column-major batch of rows and rebuilds every index in bulk.
    ///
    /// Clustered tables are re-sorted by the clustered column afterwards.
    pub fn load_columns(&mut self, batch: Vec<Vec<i32>>) -> Result<usize> {
        if batch.len() != self.columns.len() {
            return Err(PillarError::IncorrectFormat(format!(
                "{} expects {} columns, got {}",
                self.name,
                self.columns.len(),
                batch.len()
            )));
        }
        let rows = batch.first().map_or(0, Vec::len);
        if let Some(bad) = batch.iter().find(|values| values.len() != rows) {
            return Err(PillarError::LengthMismatch {
                left: rows,
                right: bad.len(),
            });
        }

        self.reserve_rows(self.row_count + rows);
        for (column, values) in self.columns.iter_mut().zip(batch) {
            column.data_mut().extend(values);
        }
        self.row_count += rows;

        match self.clustered_column() {
            Some(c) => self.reorder_by(c),
            None => {
                for column in &mut self.columns {
                    column.rebuild_index();
                }
            }
        }
        Ok(rows)
    }

    /// Stable-sorts all rows by column `key_col` and rebuilds every index.
    fn reorder_by(&mut self, key_col: usize) {
        let keys = self.columns[key_col].data();
        if !keys.windows(2).all(|w| w[0] <= w[1]) {
            let mut order: Vec<usize> = (0..self.row_count).collect();
            order.sort_by_key(|&row| keys[row]);

            let capacity = self.row_capacity;
            for column in &mut self.columns {
                let data = column.data_mut();
                let mut sorted = Vec::with_capacity(capacity);
                sorted.extend(order.iter().map(|&row| data[row]));
                *data = sorted;
            }
        }
        for column in &mut self.columns {
            column.rebuild_index();
        }
    }

    /// Copies out the full row at `position`, one value per column.
    pub fn row(&self, position: usize) -> Result<Vec<i32>> {
        if position >= self.row_count {
            return Err(PillarError::PositionOutOfRange {
                position: position as i64,
                len: self.row_count,
            });
        }
        Ok(self.columns.iter().map(|c| c.data()[position]).collect())
    }

    /// Deletes the rows at `positions`, which must be strictly ascending.
    ///
    /// Each column first drops its index entries from the highest position
    /// down, then compacts its data array in one forward pass.
    pub fn delete_rows(&mut self, positions: &[usize]) -> Result<()> {
        if let Some(pair) = positions.windows(2).find(|w| w[0] >= w[1]) {
            return Err(PillarError::invalid_argument(
                "positions",
                format!("not strictly ascending at {} then {}", pair[0], pair[1]),
            ));
        }
        if let Some(&last) = positions.last() {
            if last >= self.row_count {
                return Err(PillarError::PositionOutOfRange {
                    position: last as i64,
                    len: self.row_count,
                });
            }
        }

        for column in &mut self.columns {
            for &position in positions.iter().rev() {
                column.index_remove(position)?;
            }
            compact(column.data_mut(), positions);
        }
        self.row_count -= positions.len();
        Ok(())
    }
}

/// Removes the slots listed in `skip` (strictly ascending) in a single pass.
fn compact(data: &mut Vec<i32>, skip: &[usize]) {
    let mut skip = skip.iter().peekable();
    let mut write = 0;
    for read in 0..data.len() {
        if skip.next_if_eq(&&read).is_some() {
            continue;
        }
        data[write] = data[read];
        write += 1;
    }
    data.truncate(write);
}
