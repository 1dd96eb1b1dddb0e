//! Batched shared scan.
//!
//! Selects queued between `batch_queries` and `batch_execute` are evaluated
//! together in one pass over the column. The column is split into
//! contiguous chunks, one per worker, and every worker tests all predicates
//! against its chunk. Per-predicate hit lists are concatenated in chunk
//! order, so output positions are ascending exactly as in a serial scan.
//!
//! ```text
//!   column: [ chunk 0 | chunk 1 | chunk 2 | chunk 3 ]
//!              |          |         |         |
//!           worker 0   worker 1  worker 2  worker 3   (all predicates)
//!              \__________|_________|_________/
//!                         v
//!            predicate i: hits(0) ++ hits(1) ++ hits(2) ++ hits(3)
//! ```

use std::ops::Range;
use std::thread;

use pillar_common::{PillarError, Result};
use pillar_storage::ColumnId;
use tracing::trace;

use crate::operator::Comparator;
use crate::scan::scan_ints;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchState {
    #[default]
    Idle,
    Batching,
    Executing,
}

/// A queued select and the name its result binds to.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedSelect {
    pub comparator: Comparator,
    pub output: String,
}

/// Per-session batch of queued selects over one column.
#[derive(Debug, Default)]
pub struct SharedScan {
    state: BatchState,
    column: Option<ColumnId>,
    queued: Vec<QueuedSelect>,
}

impl SharedScan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn is_batching(&self) -> bool {
        self.state == BatchState::Batching
    }

    pub fn pending(&self) -> usize {
        self.queued.len()
    }

    pub fn begin(&mut self) -> Result<()> {
        if self.state != BatchState::Idle {
            return Err(PillarError::QueryUnsupported(
                "a batch is already open".to_string(),
            ));
        }
        self.state = BatchState::Batching;
        Ok(())
    }

    /// Queues a select. Every select in a batch must read the same column.
    pub fn queue(&mut self, column: ColumnId, comparator: Comparator, output: String) -> Result<usize> {
        if !self.is_batching() {
            return Err(PillarError::QueryUnsupported("no batch is open".to_string()));
        }
        match self.column {
            Some(existing) if existing != column => {
                return Err(PillarError::QueryUnsupported(
                    "batched selects must share one column".to_string(),
                ));
            }
            _ => self.column = Some(column),
        }
        self.queued.push(QueuedSelect { comparator, output });
        Ok(self.queued.len())
    }

    /// Moves to executing and hands out the queued work.
    ///
    /// Returns `None` for an empty batch, which closes it immediately.
    pub fn take(&mut self) -> Result<Option<(ColumnId, Vec<QueuedSelect>)>> {
        if !self.is_batching() {
            return Err(PillarError::QueryUnsupported("no batch is open".to_string()));
        }
        let queued = std::mem::take(&mut self.queued);
        match self.column.take() {
            Some(column) => {
                self.state = BatchState::Executing;
                Ok(Some((column, queued)))
            }
            None => {
                self.state = BatchState::Idle;
                Ok(None)
            }
        }
    }

    pub fn finish(&mut self) {
        self.state = BatchState::Idle;
        self.column = None;
        self.queued.clear();
    }
}

/// Contiguous chunk bounds covering `len` items split across `workers`.
pub fn chunk_bounds(len: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let chunk = len.div_ceil(workers).max(1);
    (0..len)
        .step_by(chunk)
        .map(|start| start..(start + chunk).min(len))
        .collect()
}

/// Evaluates every predicate over `data`, returning one ascending hit list
/// per predicate.
pub fn shared_scan(
    data: &[i32],
    predicates: &[Comparator],
    workers: usize,
) -> Result<Vec<Vec<usize>>> {
    if workers <= 1 || data.len() < workers {
        return Ok(scan_chunk(data, 0, predicates));
    }

    let bounds = chunk_bounds(data.len(), workers);
    let per_chunk = thread::scope(|s| {
        let handles: Vec<_> = bounds
            .iter()
            .map(|range| {
                let chunk = &data[range.clone()];
                let offset = range.start;
                s.spawn(move || scan_chunk(chunk, offset, predicates))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .map_err(|_| PillarError::Internal("shared scan worker panicked".to_string()))
            })
            .collect::<Result<Vec<_>>>()
    })?;
    trace!(chunks = per_chunk.len(), predicates = predicates.len(), "shared scan merged");

    let mut merged: Vec<Vec<usize>> = vec![Vec::new(); predicates.len()];
    for chunk in per_chunk {
        for (out, hits) in merged.iter_mut().zip(chunk) {
            out.extend(hits);
        }
    }
    Ok(merged)
}

fn scan_chunk(chunk: &[i32], offset: usize, predicates: &[Comparator]) -> Vec<Vec<usize>> {
    predicates
        .iter()
        .map(|cmp| scan_ints(chunk, offset, cmp))
        .collect()
}
