//! CLI command implementations.

pub mod apply;
pub mod apply_one;
pub mod decline;
pub mod list;
pub mod status;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::adapters::git::GitBackend;
use crate::domain::models::EngineConfig;
use crate::infrastructure::config::ConfigLoader;
use crate::services::{FixCatalog, OrchestrationDriver};

/// Shared setup: resolve paths, load config and catalog, build the driver.
pub struct RunContext {
    pub repo_root: PathBuf,
    pub config: EngineConfig,
    pub catalog_root: PathBuf,
}

impl RunContext {
    pub fn resolve(target: &str, advice_dir: Option<&str>) -> Result<Self> {
        let repo_root = PathBuf::from(target)
            .canonicalize()
            .with_context(|| format!("target {target} does not exist"))?;
        let config = ConfigLoader::load(&repo_root)?;

        // Flag (or REMEDY_ADVICE_DIR via clap env) wins over project config.
        let advice = advice_dir
            .map(str::to_string)
            .or_else(|| config.advice_dir.clone())
            .context("no advice directory configured; pass --advice-dir or set REMEDY_ADVICE_DIR")?;
        let catalog_root = PathBuf::from(&advice)
            .canonicalize()
            .with_context(|| format!("advice directory {advice} does not exist"))?;

        Ok(Self {
            repo_root,
            config,
            catalog_root,
        })
    }

    pub fn load_catalog(&self) -> Result<FixCatalog> {
        Ok(FixCatalog::load(&self.catalog_root)?)
    }

    pub fn driver(&self, catalog: FixCatalog) -> OrchestrationDriver {
        OrchestrationDriver::new(
            catalog,
            Arc::new(GitBackend::new()),
            self.config.clone(),
            self.repo_root.clone(),
        )
    }
}
