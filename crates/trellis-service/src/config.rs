//! Service configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use trellis_storage::{CsvDirSink, JsonFileSink, PersistenceSink};

/// Default embedding dimension
pub const DEFAULT_VECTOR_DIMENSION: usize = 1536;

/// Default budget for a single persistence write (30s)
pub const DEFAULT_PERSIST_TIMEOUT_MS: u64 = 30_000;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("vectorDimension must be greater than zero when vector search is enabled")]
    ZeroDimension,

    #[error("persistTimeoutMs must be greater than zero")]
    ZeroTimeout,

    #[error("persistFilePath cannot be empty when persistToFile is set")]
    MissingPersistPath,
}

impl From<ConfigError> for trellis_core::Error {
    fn from(e: ConfigError) -> Self {
        Self::Validation(e.to_string())
    }
}

/// On-disk layout for the persisted snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PersistFormat {
    /// One JSON document at `persistFilePath`
    #[default]
    Json,
    /// `nodes.csv` and `relationships.csv` inside the `persistFilePath` directory
    Csv,
}

/// Options recognized by [`crate::GraphService`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceConfig {
    pub enable_vector_search: bool,
    pub vector_dimension: usize,
    pub persist_to_file: bool,
    pub persist_file_path: PathBuf,
    pub persist_format: PersistFormat,
    /// 0 disables autosave
    pub auto_save_interval_ms: u64,
    pub persist_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            enable_vector_search: true,
            vector_dimension: DEFAULT_VECTOR_DIMENSION,
            persist_to_file: false,
            persist_file_path: PathBuf::from("data/graph.json"),
            persist_format: PersistFormat::Json,
            auto_save_interval_ms: 0,
            persist_timeout_ms: DEFAULT_PERSIST_TIMEOUT_MS,
        }
    }
}

impl ServiceConfig {
    /// In-memory service with the given embedding dimension
    pub fn in_memory(vector_dimension: usize) -> Self {
        Self {
            vector_dimension,
            ..Self::default()
        }
    }

    /// Persist to `path` in the given layout
    pub fn persisted(path: impl Into<PathBuf>, format: PersistFormat) -> Self {
        Self {
            persist_to_file: true,
            persist_file_path: path.into(),
            persist_format: format,
            ..Self::default()
        }
    }

    pub fn with_auto_save(mut self, interval_ms: u64) -> Self {
        self.auto_save_interval_ms = interval_ms;
        self
    }

    pub fn without_vector_search(mut self) -> Self {
        self.enable_vector_search = false;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enable_vector_search && self.vector_dimension == 0 {
            return Err(ConfigError::ZeroDimension);
        }
        if self.persist_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.persist_to_file && self.persist_file_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingPersistPath);
        }
        Ok(())
    }

    pub fn persist_timeout(&self) -> Duration {
        Duration::from_millis(self.persist_timeout_ms)
    }

    pub fn auto_save_interval(&self) -> Option<Duration> {
        (self.auto_save_interval_ms > 0).then(|| Duration::from_millis(self.auto_save_interval_ms))
    }

    /// Dimension imported vectors must match, when vector search is on
    pub fn import_dimension(&self) -> Option<usize> {
        self.enable_vector_search.then_some(self.vector_dimension)
    }

    /// Sink for the configured layout; `None` when persistence is off
    pub fn sink(&self) -> Option<Arc<dyn PersistenceSink>> {
        if !self.persist_to_file {
            return None;
        }
        let sink: Arc<dyn PersistenceSink> = match self.persist_format {
            PersistFormat::Json => Arc::new(JsonFileSink::new(&self.persist_file_path)),
            PersistFormat::Csv => Arc::new(CsvDirSink::new(&self.persist_file_path)),
        };
        Some(sink)
    }
}
