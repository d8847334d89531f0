use crate::config::{parse_duration, Config};
use crate::error::{NetmetaError, Result, ValidationError};
use regex::Regex;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_registry(config, &mut errors);
        Self::validate_filter(config, &mut errors);
        Self::validate_sink(config, &mut errors);
        Self::validate_pipeline(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(NetmetaError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_registry(config: &Config, errors: &mut Vec<ValidationError>) {
        // Existence is checked by the loader; the directory may be created later
        if config.registry.descriptor_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "registry.descriptor_dir",
                "Descriptor directory cannot be empty",
            ));
        }
    }

    fn validate_filter(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.filter.gate_attribute.is_empty() {
            errors.push(ValidationError::new(
                "filter.gate_attribute",
                "Gate attribute name cannot be empty",
            ));
        }

        for (key, pattern) in &config.filter.rules {
            if key.trim_start_matches('!').is_empty() {
                errors.push(ValidationError::new(
                    format!("filter.rules.{}", key),
                    "Rule attribute name cannot be empty",
                ));
            }
            if let Err(e) = Regex::new(pattern) {
                errors.push(ValidationError::new(
                    format!("filter.rules.{}", key),
                    format!("Invalid pattern '{}': {}", pattern, e),
                ));
            }
        }
    }

    fn validate_sink(config: &Config, errors: &mut Vec<ValidationError>) {
        if let Err(e) = url::Url::parse(&config.sink.url) {
            errors.push(ValidationError::new(
                "sink.url",
                format!("Invalid URL '{}': {}", config.sink.url, e),
            ));
        }

        if config.sink.api_key_env.is_empty() {
            errors.push(ValidationError::new(
                "sink.api_key_env",
                "API key environment variable name cannot be empty",
            ));
        }

        if config.sink.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "sink.timeout_secs",
                "Timeout must be greater than 0",
            ));
        }
    }

    fn validate_pipeline(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.pipeline.buffer_size == 0 {
            errors.push(ValidationError::new(
                "pipeline.buffer_size",
                "Buffer size must be greater than 0",
            ));
        }

        if config.pipeline.batch_size == 0 {
            errors.push(ValidationError::new(
                "pipeline.batch_size",
                "Batch size must be greater than 0",
            ));
        }

        let interval = &config.pipeline.flush_interval;
        match parse_duration(interval) {
            Some(d) if !d.is_zero() => {}
            _ => errors.push(ValidationError::new(
                "pipeline.flush_interval",
                format!("Invalid duration format: {}", interval),
            )),
        }
    }
}
