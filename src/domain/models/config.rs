//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Main configuration structure for Remedy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Advice source directory. Usually supplied per-invocation via
    /// `--advice-dir` or `REMEDY_ADVICE_DIR`; a project can pin one here.
    #[serde(default)]
    pub advice_dir: Option<String>,

    /// Prefix for deterministic fix branch names.
    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,

    /// Directory inside the target repo holding engine state.
    #[serde(default = "default_state_dir")]
    pub state_dir: String,

    /// Delete the branch of a failed fix instead of keeping it for
    /// inspection.
    #[serde(default)]
    pub auto_clean_failed: bool,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_branch_prefix() -> String {
    "remedy".to_string()
}

fn default_state_dir() -> String {
    ".remedy".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            advice_dir: None,
            branch_prefix: default_branch_prefix(),
            state_dir: default_state_dir(),
            auto_clean_failed: false,
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
