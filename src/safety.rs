use std::path::{Path, PathBuf};
use thiserror::Error;

/// Keeps target paths inside the project root and out of generated or
/// third-party directories.
#[derive(Debug, Clone)]
pub struct RootGuard {
    /// Canonical project root
    project_root: PathBuf,
    /// Directories under the root that are never patched
    forbidden_paths: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Path is outside project root: {path} (root: {root})")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("Path is in forbidden directory: {path} (forbidden: {forbidden})")]
    ForbiddenPath { path: PathBuf, forbidden: PathBuf },

    #[error("Failed to canonicalize path: {0}")]
    Canonicalize(#[from] std::io::Error),
}

impl RootGuard {
    /// Create a guard for `project_root`, which must exist.
    pub fn new(project_root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let project_root = project_root.as_ref().canonicalize()?;

        let forbidden_paths = ["node_modules", ".next"]
            .iter()
            .map(|dir| project_root.join(dir))
            .collect();

        Ok(Self {
            project_root,
            forbidden_paths,
        })
    }

    /// Resolve a target path against the root and check it.
    ///
    /// The file itself does not have to exist: the deepest existing ancestor
    /// is canonicalized and the missing tail re-attached, so a missing target
    /// still reaches its routine's missing-file handling.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let path = path.as_ref();

        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };

        let canonical = canonicalize_existing_prefix(&absolute)?;

        if !canonical.starts_with(&self.project_root) {
            return Err(SafetyError::OutsideRoot {
                path: canonical,
                root: self.project_root.clone(),
            });
        }

        for forbidden in &self.forbidden_paths {
            if canonical.starts_with(forbidden) {
                return Err(SafetyError::ForbiddenPath {
                    path: canonical,
                    forbidden: forbidden.clone(),
                });
            }
        }

        Ok(canonical)
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}

fn canonicalize_existing_prefix(path: &Path) -> Result<PathBuf, SafetyError> {
    let mut existing = path;
    let mut missing = Vec::new();

    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            // `..` or a root we cannot step past; let canonicalize report it
            _ => break,
        }
    }

    let mut canonical = existing.canonicalize()?;
    for name in missing.iter().rev() {
        canonical.push(name);
    }
    Ok(canonical)
}
