//! Fix descriptor domain model.
//!
//! A fix is a named, versioned unit of advice loaded from the advice
//! repository: an applicability check plus an apply plan, classified by a
//! confidence level that governs how autonomously it may run.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identity of a fix: `(namespace, name)`.
///
/// The namespace is the `/`-joined path of the fix directory's parents
/// under the advice root; top-level fixes have an empty namespace. Renders
/// as `namespace/name`, or bare `name` for an empty namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixId {
    pub namespace: String,
    pub name: String,
}

impl FixId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for FixId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}

impl FromStr for FixId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_matches('/');
        if s.is_empty() {
            return Err("fix id cannot be empty".to_string());
        }
        match s.rsplit_once('/') {
            Some((ns, name)) => Ok(Self::new(ns, name)),
            None => Ok(Self::new("", s)),
        }
    }
}

impl Serialize for FixId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FixId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Confidence level of a fix.
///
/// Ordered from least to most confident so that "at least this confident"
/// filters are a plain comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Never auto-executed; requires explicit manual invocation.
    Red,
    /// Auto-executed, but the branch requires human review before merge.
    Yellow,
    /// Auto-executed, auto-merge permitted.
    Green,
}

impl Default for Confidence {
    fn default() -> Self {
        // Automation is opt-in; an unclassified fix stays human-gated.
        Self::Red
    }
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Green => "green",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "red" => Some(Self::Red),
            "yellow" => Some(Self::Yellow),
            "green" => Some(Self::Green),
            _ => None,
        }
    }
}

/// Declarative applicability conditions from a fix manifest.
///
/// All populated condition groups must hold for the fix to be applicable.
/// A manifest with no conditions is applicable whenever no prior record
/// short-circuits it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ApplicabilityRules {
    /// Every listed path must be absent from the target repo.
    #[serde(default)]
    pub files_absent: Vec<String>,
    /// Every listed path must be present in the target repo.
    #[serde(default)]
    pub files_present: Vec<String>,
    /// At least one file in the repo must match one of these globs.
    #[serde(default)]
    pub globs_match_any: Vec<String>,
    /// Command run with the repo root as cwd; exit 0 means applicable.
    /// Must be read-only by contract.
    #[serde(default)]
    pub check_command: Option<Vec<String>>,
}

impl ApplicabilityRules {
    pub fn is_empty(&self) -> bool {
        self.files_absent.is_empty()
            && self.files_present.is_empty()
            && self.globs_match_any.is_empty()
            && self.check_command.is_none()
    }
}

/// One step of a fix's apply plan, executed in order inside the
/// working tree.
///
/// The manifest form is a single-key map per step (`- copy: {...}` or
/// `- run: {...}`). serde's externally-tagged enum form would demand YAML
/// `!copy` tags here, so the codec is written out by hand.
#[derive(Debug, Clone)]
pub enum ApplyStep {
    /// Copy a file shipped inside the fix directory into the repo.
    Copy { source: String, dest: String },
    /// Run an external command with the repo root as cwd.
    Run { command: Vec<String> },
}

impl<'de> Deserialize<'de> for ApplyStep {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct CopySpec {
            source: String,
            dest: String,
        }
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct RunSpec {
            command: Vec<String>,
        }
        #[derive(Deserialize)]
        #[serde(
            untagged,
            expecting = "a single-key map: `copy: {source, dest}` or `run: {command}`"
        )]
        enum Step {
            Copy { copy: CopySpec },
            Run { run: RunSpec },
        }

        Ok(match Step::deserialize(deserializer)? {
            Step::Copy { copy } => Self::Copy {
                source: copy.source,
                dest: copy.dest,
            },
            Step::Run { run } => Self::Run {
                command: run.command,
            },
        })
    }
}

impl Serialize for ApplyStep {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        #[derive(Serialize)]
        struct CopySpec<'a> {
            source: &'a str,
            dest: &'a str,
        }
        #[derive(Serialize)]
        struct RunSpec<'a> {
            command: &'a [String],
        }

        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::Copy { source, dest } => map.serialize_entry(
                "copy",
                &CopySpec {
                    source: source.as_str(),
                    dest: dest.as_str(),
                },
            )?,
            Self::Run { command } => map.serialize_entry(
                "run",
                &RunSpec {
                    command: command.as_slice(),
                },
            )?,
        }
        map.end()
    }
}

/// Apply plan: the ordered transformation steps of a fix.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyPlan {
    #[serde(default)]
    pub steps: Vec<ApplyStep>,
}

const fn default_order() -> i32 {
    100
}

/// On-disk manifest schema (`fix.yaml` inside a fix directory).
#[derive(Debug, Clone, Deserialize)]
pub struct FixManifest {
    /// Monotonically increasing; a bump invalidates prior applied records.
    pub version: u32,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub requires_manual_followup: bool,
    /// Sort key within the catalog; lower runs earlier.
    #[serde(default = "default_order")]
    pub order: i32,
    #[serde(default)]
    pub summary: String,
    /// Operator guidance appended to the commit message body.
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub applicability: ApplicabilityRules,
    #[serde(default)]
    pub apply: ApplyPlan,
}

/// A loaded fix: identity, manifest contents, and the directory the
/// manifest (and any shipped files) live in. Immutable once loaded; owned
/// by the catalog for the process lifetime.
#[derive(Debug, Clone)]
pub struct FixDescriptor {
    pub id: FixId,
    pub version: u32,
    pub confidence: Confidence,
    pub requires_manual_followup: bool,
    pub order: i32,
    pub summary: String,
    pub next_steps: Vec<String>,
    pub applicability: ApplicabilityRules,
    pub apply: ApplyPlan,
    /// Absolute path of the fix directory under the advice root.
    pub fix_dir: PathBuf,
}

impl FixDescriptor {
    pub fn from_manifest(id: FixId, fix_dir: PathBuf, manifest: FixManifest) -> Self {
        Self {
            id,
            version: manifest.version,
            confidence: manifest.confidence,
            requires_manual_followup: manifest.requires_manual_followup,
            order: manifest.order,
            summary: manifest.summary,
            next_steps: manifest.next_steps,
            applicability: manifest.applicability,
            apply: manifest.apply,
            fix_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fix_id_display_and_parse() {
        let id: FixId = "licensing/add-license-header".parse().unwrap();
        assert_eq!(id.namespace, "licensing");
        assert_eq!(id.name, "add-license-header");
        assert_eq!(id.to_string(), "licensing/add-license-header");

        let bare: FixId = "tidy-gitignore".parse().unwrap();
        assert_eq!(bare.namespace, "");
        assert_eq!(bare.to_string(), "tidy-gitignore");

        let nested: FixId = "ci/github/pin-actions".parse().unwrap();
        assert_eq!(nested.namespace, "ci/github");
        assert_eq!(nested.name, "pin-actions");

        assert!("".parse::<FixId>().is_err());
    }

    #[test]
    fn confidence_ordering_supports_min_filters() {
        assert!(Confidence::Red < Confidence::Yellow);
        assert!(Confidence::Yellow < Confidence::Green);
        assert_eq!(Confidence::from_str("GREEN"), Some(Confidence::Green));
        assert_eq!(Confidence::from_str("bogus"), None);
    }

    #[test]
    fn manifest_defaults_are_conservative() {
        let manifest: FixManifest = serde_yaml::from_str("version: 1").unwrap();
        assert_eq!(manifest.version, 1);
        assert_eq!(manifest.confidence, Confidence::Red);
        assert!(!manifest.requires_manual_followup);
        assert_eq!(manifest.order, 100);
        assert!(manifest.applicability.is_empty());
        assert!(manifest.apply.steps.is_empty());
    }

    #[test]
    fn manifest_parses_steps_and_rules() {
        let yaml = r"
version: 2
confidence: green
summary: add a LICENSE file
applicability:
  files_absent: [LICENSE]
apply:
  steps:
    - copy: { source: files/LICENSE, dest: LICENSE }
    - run: { command: ['./fixup.sh', '--fast'] }
";
        let manifest: FixManifest = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(manifest.confidence, Confidence::Green);
        assert_eq!(manifest.applicability.files_absent, vec!["LICENSE"]);
        assert_eq!(manifest.apply.steps.len(), 2);
        match &manifest.apply.steps[0] {
            ApplyStep::Copy { source, dest } => {
                assert_eq!(source, "files/LICENSE");
                assert_eq!(dest, "LICENSE");
            }
            ApplyStep::Run { .. } => panic!("expected copy step"),
        }
        match &manifest.apply.steps[1] {
            ApplyStep::Run { command } => {
                assert_eq!(command, &["./fixup.sh", "--fast"]);
            }
            ApplyStep::Copy { .. } => panic!("expected run step"),
        }
    }

    #[test]
    fn apply_step_rejects_unknown_kinds() {
        assert!(serde_yaml::from_str::<ApplyStep>("delete: { path: x }").is_err());
        assert!(serde_yaml::from_str::<ApplyStep>("copy: { source: a }").is_err());
    }
}
