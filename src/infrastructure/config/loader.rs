use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::EngineConfig;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("branch_prefix cannot be empty or contain whitespace")]
    InvalidBranchPrefix,

    #[error("state_dir cannot be empty or absolute")]
    InvalidStateDir,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .remedy/config.yaml in the target repository
    /// 3. Environment variables (REMEDY_* prefix, highest priority)
    pub fn load(repo_root: &std::path::Path) -> Result<EngineConfig> {
        let config: EngineConfig = Figment::new()
            .merge(Serialized::defaults(EngineConfig::default()))
            .merge(Yaml::file(repo_root.join(".remedy/config.yaml")))
            .merge(Env::prefixed("REMEDY_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.branch_prefix.is_empty()
            || config.branch_prefix.chars().any(char::is_whitespace)
        {
            return Err(ConfigError::InvalidBranchPrefix);
        }

        if config.state_dir.is_empty() || std::path::Path::new(&config.state_dir).is_absolute() {
            return Err(ConfigError::InvalidStateDir);
        }

        Ok(())
    }
}
