//! The database: root of the table/column ownership hierarchy.

use crate::column::Column;
use crate::table::Table;
use pillar_common::{PillarError, Result};

/// Handle of a table inside its database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(pub usize);

/// Handle of a column: owning table plus column slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnId {
    pub table: TableId,
    pub column: usize,
}

#[derive(Debug, Clone)]
pub struct Database {
    name: String,
    tables: Vec<Table>,
}

impl Database {
    pub fn new(name: impl Into<String>, table_slots: usize) -> Self {
        Self {
            name: name.into(),
            tables: Vec::with_capacity(table_slots.max(1)),
        }
    }

    pub(crate) fn from_parts(name: String, tables: Vec<Table>) -> Self {
        Self { name, tables }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Adds a table, doubling the table array when it is full.
    ///
    /// Name uniqueness is the caller's concern.
    pub fn create_table(
        &mut self,
        name: impl Into<String>,
        column_slots: usize,
        row_capacity: usize,
    ) -> TableId {
        if self.tables.len() == self.tables.capacity() {
            self.tables.reserve_exact(self.tables.capacity().max(1));
        }
        self.tables
            .push(Table::new(name, column_slots, row_capacity));
        TableId(self.tables.len() - 1)
    }

    pub fn table(&self, id: TableId) -> Result<&Table> {
        self.tables
            .get(id.0)
            .ok_or_else(|| PillarError::ObjectNotFound(format!("table #{}", id.0)))
    }

    pub fn table_mut(&mut self, id: TableId) -> Result<&mut Table> {
        self.tables
            .get_mut(id.0)
            .ok_or_else(|| PillarError::ObjectNotFound(format!("table #{}", id.0)))
    }

    pub fn column(&self, id: ColumnId) -> Result<&Column> {
        let table = self.table(id.table)?;
        table.column(id.column).ok_or_else(|| {
            PillarError::ObjectNotFound(format!("{}.#{}", table.name(), id.column))
        })
    }

    pub fn table_id(&self, name: &str) -> Option<TableId> {
        self.tables
            .iter()
            .position(|t| t.name() == name)
            .map(TableId)
    }

    pub fn column_id(&self, table: &str, column: &str) -> Option<ColumnId> {
        let table_id = self.table_id(table)?;
        let column = self.tables[table_id.0].column_index(column)?;
        Some(ColumnId {
            table: table_id,
            column,
        })
    }

    /// Resolves `tbl.col` or `db.tbl.col` to a column handle.
    pub fn resolve_column(&self, path: &str) -> Result<ColumnId> {
        let parts: Vec<&str> = path.split('.').collect();
        let found = match parts.as_slice() {
            [table, column] => self.column_id(table, column),
            [db, table, column] if *db == self.name => self.column_id(table, column),
            _ => None,
        };
        found.ok_or_else(|| PillarError::ObjectNotFound(path.to_string()))
    }

    /// Resolves `tbl` or `db.tbl` to a table handle.
    pub fn resolve_table(&self, path: &str) -> Result<TableId> {
        let found = match path.split_once('.') {
            None => self.table_id(path),
            Some((db, table)) if db == self.name => self.table_id(table),
            Some(_) => None,
        };
        found.ok_or_else(|| PillarError::ObjectNotFound(path.to_string()))
    }
}
