use std::path::PathBuf;
use thiserror::Error;

/// Main error type for netmeta
#[derive(Error, Debug)]
pub enum NetmetaError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// A filter rule whose pattern does not compile
    #[error("Invalid pattern for rule '{key}': {source}")]
    InvalidPattern { key: String, source: regex::Error },

    /// Trap descriptor could not be read or parsed
    #[error("Descriptor error in {path}: {message}")]
    Descriptor { path: PathBuf, message: String },

    /// Required environment variable is missing or empty
    #[error("Missing env var {0}")]
    MissingEnv(String),

    /// Sink setup or delivery errors
    #[error("Sink error: {0}")]
    Sink(String),

    /// Pipeline errors
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// YAML errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for netmeta operations
pub type Result<T> = std::result::Result<T, NetmetaError>;
