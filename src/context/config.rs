//! Execution configuration
//!
//! Loaded from a JSON file. Every field is optional and falls back to its
//! default; present fields are validated before the config is accepted.
//!
//! ```json
//! {
//!   "sort_memory_threshold_rows": 10000,
//!   "sort_run_rows": 65536,
//!   "spill_dir": "/var/tmp/groupqp",
//!   "scan_batch_size": 256
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event, Event};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "GQP_CONFIG_READ",
            ConfigError::Parse(_) => "GQP_CONFIG_PARSE",
            ConfigError::Invalid(_) => "GQP_CONFIG_INVALID",
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Tunables for one execution environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Sorts whose estimated input is below this many rows stay in memory
    #[serde(default = "default_sort_memory_threshold_rows")]
    pub sort_memory_threshold_rows: usize,

    /// Rows per in-memory run before the external sorter spills
    #[serde(default = "default_sort_run_rows")]
    pub sort_run_rows: usize,

    /// Directory for spill files (system temp dir when unset)
    #[serde(default)]
    pub spill_dir: Option<PathBuf>,

    /// Keys fetched per range read by hierarchical scans
    #[serde(default = "default_scan_batch_size")]
    pub scan_batch_size: usize,
}

fn default_sort_memory_threshold_rows() -> usize {
    10_000
}
fn default_sort_run_rows() -> usize {
    65_536
}
fn default_scan_batch_size() -> usize {
    256
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            sort_memory_threshold_rows: default_sort_memory_threshold_rows(),
            sort_run_rows: default_sort_run_rows(),
            spill_dir: None,
            scan_batch_size: default_scan_batch_size(),
        }
    }
}

impl ExecutionConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&content)?;
        let path_field = path.display().to_string();
        log_event(Event::ConfigLoaded, &[("path", &path_field)]);
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: ExecutionConfig = serde_json::from_str(content)?;
        if let Err(e) = config.validate() {
            let reason = e.to_string();
            log_event(Event::ConfigRejected, &[("reason", &reason)]);
            return Err(e);
        }
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.sort_memory_threshold_rows == 0 {
            return Err(ConfigError::Invalid(
                "sort_memory_threshold_rows must be > 0".into(),
            ));
        }
        if self.sort_run_rows == 0 {
            return Err(ConfigError::Invalid("sort_run_rows must be > 0".into()));
        }
        if self.scan_batch_size == 0 {
            return Err(ConfigError::Invalid("scan_batch_size must be > 0".into()));
        }
        if let Some(dir) = &self.spill_dir {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("spill_dir must not be empty".into()));
            }
        }
        Ok(())
    }

    /// Effective spill directory
    pub fn spill_path(&self) -> PathBuf {
        self.spill_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn with_sort_run_rows(mut self, rows: usize) -> Self {
        self.sort_run_rows = rows;
        self
    }

    pub fn with_sort_memory_threshold_rows(mut self, rows: usize) -> Self {
        self.sort_memory_threshold_rows = rows;
        self
    }

    pub fn with_spill_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spill_dir = Some(dir.into());
        self
    }

    pub fn with_scan_batch_size(mut self, size: usize) -> Self {
        self.scan_batch_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ExecutionConfig::from_json("{}").unwrap();
        assert_eq!(config, ExecutionConfig::default());
        assert_eq!(config.sort_run_rows, 65_536);
    }

    #[test]
    fn test_partial_document() {
        let config =
            ExecutionConfig::from_json(r#"{"sort_run_rows": 100, "spill_dir": "/tmp/x"}"#).unwrap();
        assert_eq!(config.sort_run_rows, 100);
        assert_eq!(config.spill_path(), PathBuf::from("/tmp/x"));
        assert_eq!(config.scan_batch_size, 256);
    }

    #[test]
    fn test_zero_rejected() {
        let err = ExecutionConfig::from_json(r#"{"scan_batch_size": 0}"#).unwrap_err();
        assert_eq!(err.code(), "GQP_CONFIG_INVALID");
    }

    #[test]
    fn test_bad_json() {
        let err = ExecutionConfig::from_json("{not json").unwrap_err();
        assert_eq!(err.code(), "GQP_CONFIG_PARSE");
    }

    #[test]
    fn test_load_missing_file() {
        let err = ExecutionConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.code(), "GQP_CONFIG_READ");
    }
}
