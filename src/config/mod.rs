//! Configuration management for netmeta
//!
//! Loads the TOML configuration file, applies `NETMETA_SECTION__KEY`
//! environment overrides and validates the result.

use crate::error::{NetmetaError, Result};
use crate::filtering::ADMIN_STATUS;
use crate::sink::Compression;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub registry: RegistryConfig,
    pub filter: FilterConfig,
    pub sink: SinkConfig,
    pub pipeline: PipelineConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Trap descriptor locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub descriptor_dir: PathBuf,
}

/// Keep/drop rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Attribute whose mismatch always drops a record
    #[serde(default = "default_gate_attribute")]
    pub gate_attribute: String,
    /// Attribute name (optionally `!`-prefixed) -> regex
    #[serde(default)]
    pub rules: BTreeMap<String, String>,
}

fn default_gate_attribute() -> String {
    ADMIN_STATUS.to_string()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            gate_attribute: default_gate_attribute(),
            rules: BTreeMap::new(),
        }
    }
}

/// HTTP sink settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    pub url: String,
    #[serde(default)]
    pub compression: Compression,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
    #[serde(default)]
    pub tls_insecure: bool,
}

/// Record pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub buffer_size: usize,
    pub batch_size: usize,
    pub flush_interval: String,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(NetmetaError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| NetmetaError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        // Validate configuration
        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| NetmetaError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: NETMETA_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("NETMETA_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "REGISTRY__DESCRIPTOR_DIR" => {
                self.registry.descriptor_dir = PathBuf::from(value);
            }
            "FILTER__GATE_ATTRIBUTE" => {
                self.filter.gate_attribute = value.to_string();
            }
            "SINK__URL" => {
                self.sink.url = value.to_string();
            }
            "SINK__COMPRESSION" => {
                self.sink.compression =
                    value
                        .parse()
                        .map_err(|message| NetmetaError::InvalidConfigValue {
                            path: path.to_string(),
                            message,
                        })?;
            }
            "SINK__TIMEOUT_SECS" => {
                self.sink.timeout_secs =
                    value.parse().map_err(|_| NetmetaError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as seconds", value),
                    })?;
            }
            "PIPELINE__BUFFER_SIZE" => {
                self.pipeline.buffer_size =
                    value.parse().map_err(|_| NetmetaError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as a size", value),
                    })?;
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| NetmetaError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("netmeta").join("config.toml"))
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = PathBuf::from("~/.config/netmeta");

        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            registry: RegistryConfig {
                descriptor_dir: config_dir.join("traps"),
            },
            filter: FilterConfig::default(),
            sink: SinkConfig {
                url: "https://api.datadoghq.com/api/v1/series".to_string(),
                compression: Compression::None,
                api_key_env: "DD_API_KEY".to_string(),
                timeout_secs: 30,
                tls_insecure: false,
            },
            pipeline: PipelineConfig {
                buffer_size: 10000,
                batch_size: 100,
                flush_interval: "5s".to_string(),
            },
        }
    }
}

/// Expand a leading `~/` to the home directory
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| NetmetaError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| NetmetaError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}

/// Parse a duration string such as "5s", "250ms", "2m" or "7" (seconds)
pub fn parse_duration(s: &str) -> Option<std::time::Duration> {
    use std::time::Duration;

    let s = s.trim();
    // "ms" before "s" because "ms" ends with "s"
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else if let Some(hours) = s.strip_suffix('h') {
        hours.parse::<u64>().ok().map(|h| Duration::from_secs(h * 3600))
    } else {
        s.parse().ok().map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("5s"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_duration("7"), Some(Duration::from_secs(7)));
        assert_eq!(parse_duration("soon"), None);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config
            .filter
            .rules
            .insert("!if_Alias".to_string(), "uplink".to_string());
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(
            loaded.filter.rules.get("!if_Alias").map(String::as_str),
            Some("uplink")
        );
        assert_eq!(loaded.filter.gate_attribute, ADMIN_STATUS);
    }

    #[test]
    fn test_filter_default_matches_serde_default() {
        let parsed: FilterConfig = toml::from_str("").unwrap();
        let built = FilterConfig::default();

        assert_eq!(built.gate_attribute, ADMIN_STATUS);
        assert_eq!(built.gate_attribute, parsed.gate_attribute);
        assert!(built.rules.is_empty() && parsed.rules.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, NetmetaError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_env_override_rejects_bad_value() {
        let mut config = Config::default();
        assert!(config.set_value_from_env("SINK__TIMEOUT_SECS", "x").is_err());
        config.set_value_from_env("SINK__URL", "http://localhost:9/").unwrap();
        assert_eq!(config.sink.url, "http://localhost:9/");
    }
}
