//! Engine context: the active database and its lifecycle.
//!
//! One engine is shared by every session of a server. Operators execute
//! under the database lock, so each runs to completion before the next
//! starts.

use std::time::Instant;

use parking_lot::Mutex;
use pillar_common::{EngineConfig, PillarError, Result};
use pillar_storage::{ColumnId, Database, TableId, snapshot};
use tracing::{debug, error, info, warn};

use crate::aggregate::{self, AggregateOutput};
use crate::dml;
use crate::fetch;
use crate::join;
use crate::operator::{DbOperator, ValueSource};
use crate::print::ResultSet;
use crate::result::ResultVector;
use crate::scan;
use crate::session::Session;
use crate::shared_scan;

/// What an executed operator produced, beyond session bindings.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Done,
    Table(TableId),
    Column(ColumnId),
    /// Rows affected by an insert, load, delete or update.
    Rows(usize),
    Print(ResultSet),
    /// A select was added to the open batch.
    Queued {
        pending: usize,
    },
    Shutdown,
}

pub struct Engine {
    config: EngineConfig,
    db: Mutex<Option<Database>>,
}

impl Engine {
    /// Opens an engine, restoring the snapshot when one is readable.
    ///
    /// A missing or unreadable snapshot yields an engine with no database.
    pub fn open(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let path = config.snapshot_path();
        let db = match snapshot::load(&path) {
            Ok(Some(db)) => {
                info!(path = %path.display(), db = db.name(), tables = db.tables().len(), "snapshot restored");
                Some(db)
            }
            Ok(None) => {
                info!(path = %path.display(), "no snapshot, starting empty");
                None
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "snapshot unreadable, starting empty");
                None
            }
        };
        Ok(Self {
            config,
            db: Mutex::new(db),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn has_database(&self) -> bool {
        self.db.lock().is_some()
    }

    /// Runs `f` against the active database.
    pub fn with_database<R>(&self, f: impl FnOnce(&Database) -> R) -> Result<R> {
        let guard = self.db.lock();
        let db = guard.as_ref().ok_or(PillarError::NoActiveDatabase)?;
        Ok(f(db))
    }

    pub fn resolve_table(&self, path: &str) -> Result<TableId> {
        self.with_database(|db| db.resolve_table(path))?
    }

    pub fn resolve_column(&self, path: &str) -> Result<ColumnId> {
        self.with_database(|db| db.resolve_column(path))?
    }

    /// Writes the active database to the snapshot file, if there is one.
    pub fn shutdown(&self) -> Result<()> {
        let guard = self.db.lock();
        self.persist_locked(guard.as_ref())
    }

    fn persist_locked(&self, db: Option<&Database>) -> Result<()> {
        match db {
            Some(db) => {
                let path = self.config.snapshot_path();
                let written = std::fs::create_dir_all(&self.config.data_dir)
                    .map_err(PillarError::from)
                    .and_then(|()| snapshot::dump(db, &path));
                if let Err(e) = &written {
                    error!(path = %path.display(), error = %e, "snapshot write failed");
                }
                written
            }
            None => {
                debug!("no active database to persist");
                Ok(())
            }
        }
    }

    pub fn execute(&self, session: &mut Session, op: DbOperator) -> Result<Outcome> {
        let kind = op.kind();
        let start = Instant::now();
        let mut guard = self.db.lock();
        let outcome = if session.batch().is_batching() {
            self.execute_batching(guard.as_ref(), session, op)
        } else {
            self.execute_op(&mut guard, session, op)
        };
        debug!(
            op = kind,
            ok = outcome.is_ok(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "operator executed"
        );
        outcome
    }

    fn execute_op(
        &self,
        slot: &mut Option<Database>,
        session: &mut Session,
        op: DbOperator,
    ) -> Result<Outcome> {
        if let DbOperator::CreateDatabase { name } = op {
            if let Some(existing) = slot.as_ref() {
                return Err(PillarError::ObjectAlreadyExists(existing.name().to_string()));
            }
            info!(db = %name, "database created");
            *slot = Some(Database::new(name, self.config.initial_table_slots));
            return Ok(Outcome::Done);
        }
        if let DbOperator::Shutdown = op {
            self.persist_locked(slot.as_ref())?;
            info!("shutdown complete");
            return Ok(Outcome::Shutdown);
        }

        let db = slot.as_mut().ok_or(PillarError::NoActiveDatabase)?;
        match op {
            DbOperator::CreateTable { name, column_slots } => {
                if db.table_id(&name).is_some() {
                    return Err(PillarError::ObjectAlreadyExists(name));
                }
                let id = db.create_table(name, column_slots, self.config.initial_row_capacity);
                Ok(Outcome::Table(id))
            }
            DbOperator::CreateColumn { table, name } => {
                let t = db.table_mut(table)?;
                if t.column_index(&name).is_some() {
                    return Err(PillarError::ObjectAlreadyExists(format!("{}.{}", t.name(), name)));
                }
                let column = t.add_column(name);
                Ok(Outcome::Column(ColumnId { table, column }))
            }
            DbOperator::CreateIndex { column, index_type } => {
                db.table_mut(column.table)?.create_index(
                    column.column,
                    index_type,
                    self.config.btree_leaf_size,
                    self.config.btree_fanout,
                )?;
                Ok(Outcome::Done)
            }
            DbOperator::Insert { table, values } => {
                dml::insert(db.table_mut(table)?, &values)?;
                Ok(Outcome::Rows(1))
            }
            DbOperator::Load { table, columns } => {
                dml::load(db.table_mut(table)?, columns).map(Outcome::Rows)
            }
            DbOperator::Select {
                source,
                positions,
                comparator,
                output,
            } => {
                let hits = scan::select(db, &source, positions.as_deref(), &comparator)?;
                session.bind(output, hits);
                Ok(Outcome::Done)
            }
            DbOperator::Fetch {
                source,
                positions,
                output,
            } => {
                let values = fetch::fetch(db, &source, &positions)?;
                session.bind(output, values);
                Ok(Outcome::Done)
            }
            DbOperator::Aggregate { op, outputs } => {
                if outputs.len() != op.output_count() {
                    return Err(PillarError::IncorrectFormat(format!(
                        "expected {} output names, got {}",
                        op.output_count(),
                        outputs.len()
                    )));
                }
                let mut names = outputs.into_iter();
                match aggregate::aggregate(db, &op)? {
                    AggregateOutput::Single(value) => {
                        session.bind(next_name(&mut names)?, value);
                    }
                    AggregateOutput::WithPosition { position, value } => {
                        session.bind(next_name(&mut names)?, position);
                        session.bind(next_name(&mut names)?, value);
                    }
                }
                Ok(Outcome::Done)
            }
            DbOperator::Join {
                left,
                right,
                strategy,
                outputs: [left_name, right_name],
            } => {
                let out = join::join(&left, &right, strategy)?;
                session.bind(left_name, out.left);
                session.bind(right_name, out.right);
                Ok(Outcome::Done)
            }
            DbOperator::Delete { table, positions } => {
                dml::delete(db.table_mut(table)?, &positions).map(Outcome::Rows)
            }
            DbOperator::Update {
                column,
                positions,
                value,
            } => dml::update(db.table_mut(column.table)?, column.column, &positions, value)
                .map(Outcome::Rows),
            DbOperator::Print { sources } => {
                let columns = sources
                    .iter()
                    .map(|s| s.values(db).map(|v| v.to_owned_vector()))
                    .collect::<Result<Vec<_>>>()?;
                ResultSet::new(columns).map(Outcome::Print)
            }
            DbOperator::BatchBegin => {
                session.batch_mut().begin()?;
                Ok(Outcome::Done)
            }
            DbOperator::BatchExecute => Err(PillarError::QueryUnsupported(
                "batch_execute without an open batch".to_string(),
            )),
            DbOperator::CreateDatabase { .. } | DbOperator::Shutdown => {
                Err(PillarError::Internal("lifecycle operator reached dispatch".to_string()))
            }
        }
    }

    /// While a batch is open only column selects and `batch_execute` run.
    fn execute_batching(
        &self,
        db: Option<&Database>,
        session: &mut Session,
        op: DbOperator,
    ) -> Result<Outcome> {
        match op {
            DbOperator::Select {
                source: ValueSource::Column(column),
                positions: None,
                comparator,
                output,
            } => {
                let pending = session.batch_mut().queue(column, comparator, output)?;
                Ok(Outcome::Queued { pending })
            }
            DbOperator::BatchExecute => {
                let db = db.ok_or(PillarError::NoActiveDatabase)?;
                self.run_batch(db, session)
            }
            other => {
                warn!(op = other.kind(), "operator rejected while batching");
                Err(PillarError::QueryUnsupported(format!(
                    "{} cannot be batched; only column selects without positions are",
                    other.kind()
                )))
            }
        }
    }

    fn run_batch(&self, db: &Database, session: &mut Session) -> Result<Outcome> {
        let Some((column, queued)) = session.batch_mut().take()? else {
            return Ok(Outcome::Done);
        };
        let workers = self.config.scan_workers();
        let comparators: Vec<_> = queued.iter().map(|q| q.comparator).collect();
        let start = Instant::now();
        let results = db
            .column(column)
            .and_then(|c| shared_scan::shared_scan(c.data(), &comparators, workers));
        session.batch_mut().finish();
        let results = results?;
        debug!(
            predicates = comparators.len(),
            workers,
            elapsed_us = start.elapsed().as_micros() as u64,
            "shared scan complete"
        );

        for (select, hits) in queued.into_iter().zip(results) {
            session.bind(select.output, ResultVector::from_positions(&hits)?);
        }
        Ok(Outcome::Done)
    }
}

fn next_name(names: &mut impl Iterator<Item = String>) -> Result<String> {
    names
        .next()
        .ok_or_else(|| PillarError::IncorrectFormat("missing output name".to_string()))
}
