//! Fix catalog: discovery and loading of fix descriptors.
//!
//! Walks the advice root for directories containing a `fix.yaml` manifest.
//! Discovery order is deterministic (sorted by order key, then namespace,
//! then name) so two runs against an unchanged advice source produce
//! identical reports.

use std::collections::HashSet;
use std::path::Path;

use globset::Glob;
use tracing::{debug, instrument};
use walkdir::WalkDir;

use crate::domain::errors::CatalogError;
use crate::domain::models::{Confidence, FixDescriptor, FixId, FixManifest};

/// Name of the manifest file marking a fix directory.
pub const MANIFEST_FILE: &str = "fix.yaml";

/// Selects a subset of the catalog by name and minimum confidence.
///
/// An empty filter selects everything. Name selectors match the full
/// identity or any identity underneath it (`ci` selects `ci/pin-actions`).
#[derive(Debug, Clone, Default)]
pub struct FixFilter {
    pub min_confidence: Option<Confidence>,
    pub names: Vec<String>,
}

impl FixFilter {
    pub fn includes(&self, descriptor: &FixDescriptor) -> bool {
        if let Some(min) = self.min_confidence {
            if descriptor.confidence < min {
                debug!(fix = %descriptor.id, "Confidence below filter, skip");
                return false;
            }
        }
        if self.names.is_empty() {
            return true;
        }
        let id = descriptor.id.to_string();
        self.names
            .iter()
            .map(|n| n.trim_matches('/'))
            .any(|n| id == n || id.starts_with(&format!("{n}/")))
    }
}

/// Immutable, ordered collection of fix descriptors.
#[derive(Debug)]
pub struct FixCatalog {
    fixes: Vec<FixDescriptor>,
}

impl FixCatalog {
    /// Load every fix under `advice_root`.
    ///
    /// A directory containing `fix.yaml` is a fix; its subdirectories are
    /// payload (`files/`, scripts), not further fixes. Hidden directories
    /// are skipped. Any malformed or duplicate descriptor fails the whole
    /// load: a partially-usable catalog risks skipping fixes silently.
    #[instrument(skip_all, fields(advice_root = %advice_root.display()))]
    pub fn load(advice_root: &Path) -> Result<Self, CatalogError> {
        if !advice_root.is_dir() {
            return Err(CatalogError::AdviceRootMissing(advice_root.to_path_buf()));
        }

        let mut fixes = Vec::new();
        let mut seen: HashSet<FixId> = HashSet::new();

        let mut walker = WalkDir::new(advice_root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                !(e.file_type().is_dir()
                    && e.file_name().to_string_lossy().starts_with('.'))
            });

        while let Some(entry) = walker.next() {
            let entry = entry.map_err(|e| {
                CatalogError::Io(e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::other("advice walk failed")
                }))
            })?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let manifest_path = entry.path().join(MANIFEST_FILE);
            if !manifest_path.is_file() {
                continue;
            }

            // A fix directory's contents are payload, not nested fixes.
            walker.skip_current_dir();

            let id = identity_for(advice_root, entry.path());
            debug!(fix = %id, "Loading fix manifest");
            let descriptor = load_descriptor(id.clone(), entry.path(), &manifest_path)?;
            if !seen.insert(id.clone()) {
                return Err(CatalogError::DuplicateIdentity(id));
            }
            fixes.push(descriptor);
        }

        fixes.sort_by(|a, b| {
            (a.order, &a.id.namespace, &a.id.name).cmp(&(b.order, &b.id.namespace, &b.id.name))
        });

        Ok(Self { fixes })
    }

    /// Descriptors in deterministic catalog order.
    pub fn fixes(&self) -> &[FixDescriptor] {
        &self.fixes
    }

    pub fn find(&self, id: &FixId) -> Option<&FixDescriptor> {
        self.fixes.iter().find(|f| &f.id == id)
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }
}

fn identity_for(advice_root: &Path, fix_dir: &Path) -> FixId {
    let rel = fix_dir.strip_prefix(advice_root).unwrap_or(fix_dir);
    let mut parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let name = parts.pop().unwrap_or_default();
    FixId::new(parts.join("/"), name)
}

fn load_descriptor(
    id: FixId,
    fix_dir: &Path,
    manifest_path: &Path,
) -> Result<FixDescriptor, CatalogError> {
    let raw = std::fs::read_to_string(manifest_path)?;
    let manifest: FixManifest =
        serde_yaml::from_str(&raw).map_err(|source| CatalogError::UnparsableManifest {
            path: manifest_path.to_path_buf(),
            source,
        })?;
    if manifest.version == 0 {
        return Err(CatalogError::InvalidVersion {
            fix: id,
            version: manifest.version,
        });
    }
    // Reject bad globs at load time so one author's typo surfaces before
    // any fix runs.
    for pattern in &manifest.applicability.globs_match_any {
        Glob::new(pattern).map_err(|source| CatalogError::InvalidGlob {
            fix: id.clone(),
            pattern: pattern.clone(),
            source,
        })?;
    }
    Ok(FixDescriptor::from_manifest(
        id,
        fix_dir.to_path_buf(),
        manifest,
    ))
}
