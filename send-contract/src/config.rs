//! Configuration for the send contract node

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// RocksDB configuration
    pub rocksdb: RocksDBConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/send"),
            service_name: "send-contract".to_string(),
            rocksdb: RocksDBConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RocksDBConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDBConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            max_background_jobs: 2,
            enable_statistics: false,
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Collect Prometheus metrics
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Could not read the file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Could not parse the file or a variable
    #[error("Failed to parse config: {0}")]
    Parse(String),
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse TOML; missing fields keep their defaults
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("SEND_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(enabled) = std::env::var("SEND_METRICS_ENABLED") {
            config.metrics.enabled = enabled
                .parse()
                .map_err(|_| ConfigError::Parse(format!("SEND_METRICS_ENABLED={}", enabled)))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "send-contract");
        assert_eq!(config.data_dir, PathBuf::from("./data/send"));
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml(
            r#"
            data_dir = "/var/lib/send"

            [rocksdb]
            max_background_jobs = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/send"));
        assert_eq!(config.rocksdb.max_background_jobs, 8);
        assert_eq!(config.rocksdb.write_buffer_size_mb, 64);
        assert_eq!(config.service_name, "send-contract");
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            Config::from_toml("data_dir = ["),
            Err(ConfigError::Parse(_))
        ));
    }
}
