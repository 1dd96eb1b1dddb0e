//! Configuration structures for PillarDB.

use crate::error::{PillarError, Result};
use crate::page::{FANOUT, LEAF_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine configuration for a PillarDB server context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding the snapshot file.
    pub data_dir: PathBuf,
    /// File name of the snapshot inside `data_dir`.
    pub snapshot_file: String,
    /// Initial capacity of a database's table array.
    pub initial_table_slots: usize,
    /// Row storage reserved for every new table.
    pub initial_row_capacity: usize,
    /// Worker count for the batched shared scan.
    pub shared_scan_threads: usize,
    /// Run the shared scan on worker threads instead of a single pass.
    pub multi_threaded_scan: bool,
    /// Leaf capacity for newly created B+trees.
    pub btree_leaf_size: usize,
    /// Internal node fanout for newly created B+trees.
    pub btree_fanout: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            snapshot_file: "pillar.snapshot".to_string(),
            initial_table_slots: 10,
            initial_row_capacity: 64 * 1024,
            shared_scan_threads: 4,
            multi_threaded_scan: true,
            btree_leaf_size: LEAF_SIZE,
            btree_fanout: FANOUT,
        }
    }
}

impl EngineConfig {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&raw)
            .map_err(|e| PillarError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the full path of the snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(&self.snapshot_file)
    }

    /// Checks that every sizing parameter is usable.
    pub fn validate(&self) -> Result<()> {
        if self.initial_table_slots == 0 {
            return Err(PillarError::Config(
                "initial_table_slots must be > 0".to_string(),
            ));
        }
        if self.initial_row_capacity == 0 {
            return Err(PillarError::Config(
                "initial_row_capacity must be > 0".to_string(),
            ));
        }
        if self.shared_scan_threads == 0 {
            return Err(PillarError::Config(
                "shared_scan_threads must be > 0".to_string(),
            ));
        }
        if self.btree_leaf_size < 2 {
            return Err(PillarError::Config(
                "btree_leaf_size must be >= 2".to_string(),
            ));
        }
        if self.btree_fanout < 3 {
            return Err(PillarError::Config("btree_fanout must be >= 3".to_string()));
        }
        if self.snapshot_file.is_empty() {
            return Err(PillarError::Config("snapshot_file is empty".to_string()));
        }
        Ok(())
    }

    /// Worker count actually used by the shared scan.
    pub fn scan_workers(&self) -> usize {
        if self.multi_threaded_scan {
            self.shared_scan_threads
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_engine_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.snapshot_file, "pillar.snapshot");
        assert_eq!(config.initial_table_slots, 10);
        assert_eq!(config.shared_scan_threads, 4);
        assert!(config.multi_threaded_scan);
        assert_eq!(config.btree_leaf_size, LEAF_SIZE);
        assert_eq!(config.btree_fanout, FANOUT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_snapshot_path() {
        let config = EngineConfig {
            data_dir: PathBuf::from("/var/lib/pillar"),
            ..Default::default()
        };
        assert_eq!(
            config.snapshot_path(),
            PathBuf::from("/var/lib/pillar/pillar.snapshot")
        );
    }

    #[test]
    fn test_scan_workers() {
        let mut config = EngineConfig::default();
        assert_eq!(config.scan_workers(), 4);
        config.multi_threaded_scan = false;
        assert_eq!(config.scan_workers(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_sizes() {
        let config = EngineConfig {
            shared_scan_threads: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PillarError::Config(_))));

        let config = EngineConfig {
            btree_fanout: 2,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            btree_leaf_size: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            initial_row_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = EngineConfig {
            shared_scan_threads: 8,
            btree_leaf_size: 16,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "shared_scan_threads": 2, "btree_fanout": 8 }}"#).unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.shared_scan_threads, 2);
        assert_eq!(config.btree_fanout, 8);
        assert_eq!(config.btree_leaf_size, LEAF_SIZE);
    }

    #[test]
    fn test_load_rejects_invalid() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "shared_scan_threads": 0 }}"#).unwrap();
        assert!(EngineConfig::load(file.path()).is_err());

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            EngineConfig::load(file.path()),
            Err(PillarError::Config(_))
        ));
    }
}
