use crate::targets::{Target, BUILTIN_IDS};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PatchConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Used when neither --root nor the environment names a project root
    #[serde(default)]
    pub project_root: Option<PathBuf>,
}

/// Per-target overrides for a built-in target.
#[derive(Debug, Deserialize, Clone)]
pub struct TargetConfig {
    pub id: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl PatchConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for target in &self.targets {
            let id = target.id.trim();
            if id.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    target_id: None,
                    field: "id",
                });
                continue;
            }

            if !BUILTIN_IDS.contains(&id) {
                issues.push(ValidationIssue::UnknownTarget { id: id.to_string() });
            }

            if !seen.insert(id) {
                issues.push(ValidationIssue::DuplicateTarget { id: id.to_string() });
            }

            if matches!(&target.file, Some(file) if file.trim().is_empty()) {
                issues.push(ValidationIssue::MissingField {
                    target_id: Some(id.to_string()),
                    field: "file",
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Apply file overrides and drop disabled targets, keeping built-in order.
    pub fn apply_overrides(&self, targets: Vec<Target>) -> Vec<Target> {
        targets
            .into_iter()
            .filter_map(|mut target| {
                match self.targets.iter().find(|t| t.id.trim() == target.id) {
                    Some(over) if !over.enabled => None,
                    Some(over) => {
                        if let Some(file) = &over.file {
                            target.file = PathBuf::from(file.trim());
                        }
                        Some(target)
                    }
                    None => Some(target),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingField {
        target_id: Option<String>,
        field: &'static str,
    },
    UnknownTarget {
        id: String,
    },
    DuplicateTarget {
        id: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { target_id, field } => match target_id {
                Some(id) => write!(f, "target '{id}' has empty field '{field}'"),
                None => write!(f, "target missing required field '{field}'"),
            },
            ValidationIssue::UnknownTarget { id } => write!(
                f,
                "unknown target '{id}' (known: {})",
                BUILTIN_IDS.join(", ")
            ),
            ValidationIssue::DuplicateTarget { id } => {
                write!(f, "target '{id}' is configured more than once")
            }
        }
    }
}
