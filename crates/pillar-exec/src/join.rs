//! Equi-joins over fetched value/position pairs.
//!
//! The smaller input is always the build (outer) side. Outputs map back to
//! the caller's left/right order whichever side was built.

use pillar_common::page::tile_len;
use pillar_common::{PillarError, Result};
use pillar_storage::ExtendibleHashTable;
use tracing::debug;

use crate::operator::{JoinInput, JoinStrategy};
use crate::result::ResultVector;

/// Matching row positions, aligned pairwise.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutput {
    pub left: ResultVector,
    pub right: ResultVector,
}

struct Side<'a> {
    values: &'a [i32],
    positions: Vec<usize>,
}

impl<'a> Side<'a> {
    fn new(input: &'a JoinInput) -> Result<Self> {
        let ResultVector::Int(values) = input.values.as_ref() else {
            return Err(PillarError::QueryUnsupported(format!(
                "join on {} values",
                input.values.data_type()
            )));
        };
        let positions = input.positions.as_positions(None)?;
        if positions.len() != values.len() {
            return Err(PillarError::LengthMismatch {
                left: values.len(),
                right: positions.len(),
            });
        }
        Ok(Self { values, positions })
    }

    fn len(&self) -> usize {
        self.values.len()
    }
}

pub fn join(left: &JoinInput, right: &JoinInput, strategy: JoinStrategy) -> Result<JoinOutput> {
    let left = Side::new(left)?;
    let right = Side::new(right)?;
    let swapped = left.len() > right.len();
    let (build, probe) = if swapped {
        (&right, &left)
    } else {
        (&left, &right)
    };

    let (build_out, probe_out) = match strategy {
        JoinStrategy::NestedLoop => nested_loop(build, probe),
        JoinStrategy::Hash => hash_join(build, probe),
    };
    debug!(
        ?strategy,
        build = build.len(),
        probe = probe.len(),
        matches = build_out.len(),
        "join complete"
    );

    let (left_out, right_out) = if swapped {
        (probe_out, build_out)
    } else {
        (build_out, probe_out)
    };
    Ok(JoinOutput {
        left: ResultVector::from_positions(&left_out)?,
        right: ResultVector::from_positions(&right_out)?,
    })
}

/// Block nested loop over page-sized tiles of both inputs.
fn nested_loop(outer: &Side<'_>, inner: &Side<'_>) -> (Vec<usize>, Vec<usize>) {
    let tile = tile_len::<i32>();
    let mut outer_out = Vec::new();
    let mut inner_out = Vec::new();
    for outer_start in (0..outer.len()).step_by(tile) {
        let outer_end = (outer_start + tile).min(outer.len());
        for inner_start in (0..inner.len()).step_by(tile) {
            let inner_end = (inner_start + tile).min(inner.len());
            for i in outer_start..outer_end {
                let key = outer.values[i];
                for j in inner_start..inner_end {
                    if inner.values[j] == key {
                        outer_out.push(outer.positions[i]);
                        inner_out.push(inner.positions[j]);
                    }
                }
            }
        }
    }
    (outer_out, inner_out)
}

fn hash_join(build: &Side<'_>, probe: &Side<'_>) -> (Vec<usize>, Vec<usize>) {
    let mut table = ExtendibleHashTable::new();
    for (&key, &pos) in build.values.iter().zip(&build.positions) {
        table.insert(key, pos);
    }

    let mut build_out = Vec::new();
    let mut probe_out = Vec::new();
    for (&key, &pos) in probe.values.iter().zip(&probe.positions) {
        for &hit in table.probe(key) {
            build_out.push(hit);
            probe_out.push(pos);
        }
    }
    (build_out, probe_out)
}
