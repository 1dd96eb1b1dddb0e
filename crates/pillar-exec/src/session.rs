//! Per-client session state.

use std::collections::HashMap;
use std::sync::Arc;

use pillar_common::{PillarError, Result};

use crate::result::ResultVector;
use crate::shared_scan::SharedScan;

/// Named result variables and the open batch of one client.
#[derive(Debug, Default)]
pub struct Session {
    variables: HashMap<String, Arc<ResultVector>>,
    batch: SharedScan,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name`, replacing any earlier result of the same name.
    pub fn bind(&mut self, name: impl Into<String>, value: ResultVector) -> Arc<ResultVector> {
        let value = Arc::new(value);
        self.variables.insert(name.into(), Arc::clone(&value));
        value
    }

    pub fn get(&self, name: &str) -> Result<Arc<ResultVector>> {
        self.variables
            .get(name)
            .cloned()
            .ok_or_else(|| PillarError::ObjectNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn batch(&self) -> &SharedScan {
        &self.batch
    }

    pub(crate) fn batch_mut(&mut self) -> &mut SharedScan {
        &mut self.batch
    }
}
