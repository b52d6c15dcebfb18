//! CLI configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use trellis_service::{PersistFormat, ServiceConfig};

/// Get default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("trellis")
}

/// Get default config file path
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("trellis")
        .join("config.toml")
}

/// Settings stored in the TOML config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_dir: Option<PathBuf>,
    pub persist_format: PersistFormat,
    pub enable_vector_search: bool,
    pub vector_dimension: usize,
    pub persist_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let service = ServiceConfig::default();
        Self {
            data_dir: None,
            persist_format: service.persist_format,
            enable_vector_search: service.enable_vector_search,
            vector_dimension: service.vector_dimension,
            persist_timeout_ms: service.persist_timeout_ms,
        }
    }
}

impl Settings {
    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path.display(), e))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn keys() -> &'static [&'static str] {
        &[
            "data_dir",
            "persist_format",
            "enable_vector_search",
            "vector_dimension",
            "persist_timeout_ms",
        ]
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "data_dir" => Some(
                self.data_dir
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            ),
            "persist_format" => Some(
                match self.persist_format {
                    PersistFormat::Json => "json",
                    PersistFormat::Csv => "csv",
                }
                .to_string(),
            ),
            "enable_vector_search" => Some(self.enable_vector_search.to_string()),
            "vector_dimension" => Some(self.vector_dimension.to_string()),
            "persist_timeout_ms" => Some(self.persist_timeout_ms.to_string()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "data_dir" => {
                self.data_dir = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            "persist_format" => {
                self.persist_format = match value.to_ascii_lowercase().as_str() {
                    "json" => PersistFormat::Json,
                    "csv" => PersistFormat::Csv,
                    other => anyhow::bail!("persist_format must be json or csv, got '{}'", other),
                };
            }
            "enable_vector_search" => {
                self.enable_vector_search = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("enable_vector_search must be true or false"))?;
            }
            "vector_dimension" => {
                self.vector_dimension = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("vector_dimension must be a positive integer"))?;
            }
            "persist_timeout_ms" => {
                self.persist_timeout_ms = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("persist_timeout_ms must be an integer"))?;
            }
            _ => anyhow::bail!(
                "Unknown config key: {}. Available keys: {}",
                key,
                Self::keys().join(", ")
            ),
        }
        Ok(())
    }

    /// Service configuration persisting under `data_dir`
    pub fn service_config(&self, data_dir: &Path) -> ServiceConfig {
        let persist_path = match self.persist_format {
            PersistFormat::Json => data_dir.join("graph.json"),
            PersistFormat::Csv => data_dir.join("graph"),
        };

        ServiceConfig {
            enable_vector_search: self.enable_vector_search,
            vector_dimension: self.vector_dimension,
            persist_timeout_ms: self.persist_timeout_ms,
            ..ServiceConfig::persisted(persist_path, self.persist_format)
        }
    }
}
