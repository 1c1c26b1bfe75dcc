//! The patch routine: read a target file, run its rules in order, write it back.

use crate::edit::{write_file, EditError, Fingerprint};
use crate::rule::{RuleError, RuleStatus};
use crate::safety::SafetyError;
use crate::targets::{MissingFilePolicy, Target};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct PatchOptions {
    /// Compute and report, but leave files untouched
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleReport {
    pub rule: String,
    pub status: RuleStatus,
}

/// What one routine did to one file.
#[derive(Debug, Clone)]
pub struct PatchReport {
    pub target: String,
    pub file: PathBuf,
    pub rules: Vec<RuleReport>,
    pub original: String,
    pub patched: String,
    /// Whether the patched text was written to disk
    pub written: bool,
}

impl PatchReport {
    pub fn changed(&self) -> bool {
        self.original != self.patched
    }

    /// Rules whose anchor was neither found nor previously applied.
    pub fn unmatched(&self) -> impl Iterator<Item = &RuleReport> {
        self.rules
            .iter()
            .filter(|r| r.status == RuleStatus::NotFound)
    }

    pub fn already_applied(&self) -> bool {
        !self.rules.is_empty()
            && self
                .rules
                .iter()
                .all(|r| r.status == RuleStatus::AlreadyApplied)
    }
}

#[derive(Debug, Clone)]
#[must_use = "PatchOutcome should be reported"]
pub enum PatchOutcome {
    /// The file was read and its rules ran (matching or not)
    Patched(PatchReport),
    /// The file does not exist and the target reports that instead of failing
    FileMissing { target: String, file: PathBuf },
}

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: EditError },

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Safety(#[from] SafetyError),
}

impl PatchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, PatchError::Read { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Run a target's rules over an in-memory buffer.
pub fn patch_content(target: &Target, content: &mut String) -> Result<Vec<RuleReport>, RuleError> {
    target
        .rules
        .iter()
        .map(|rule| {
            let status = rule.apply(content)?;
            Ok(RuleReport {
                rule: rule.name().to_string(),
                status,
            })
        })
        .collect()
}

/// Patch one file in place.
///
/// The file is only rewritten when at least one rule changed it. A rule that
/// applies is kept even if a later rule finds nothing.
pub fn patch_file(
    target: &Target,
    path: &Path,
    options: &PatchOptions,
) -> Result<PatchOutcome, PatchError> {
    let original = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(source)
            if source.kind() == io::ErrorKind::NotFound
                && target.missing_file == MissingFilePolicy::Report =>
        {
            debug!(target_id = %target.id, file = %path.display(), "file missing, reporting");
            return Ok(PatchOutcome::FileMissing {
                target: target.id.clone(),
                file: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(PatchError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let read_as = Fingerprint::of(original.as_bytes());
    let mut patched = original.clone();
    let rules = patch_content(target, &mut patched)?;

    let mut report = PatchReport {
        target: target.id.clone(),
        file: path.to_path_buf(),
        rules,
        original,
        patched,
        written: false,
    };

    if report.changed() && !options.dry_run {
        write_file(path, report.patched.as_bytes(), read_as).map_err(|source| PatchError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        report.written = true;
        info!(target_id = %target.id, file = %path.display(), "patched");
    }

    Ok(PatchOutcome::Patched(report))
}
