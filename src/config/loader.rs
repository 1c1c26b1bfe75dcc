use crate::config::schema::{PatchConfig, ValidationError};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Where a config was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    Inline,
    File(PathBuf),
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOrigin::Inline => write!(f, "<inline>"),
            ConfigOrigin::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse config {origin}: {source}")]
    Parse {
        origin: ConfigOrigin,
        source: toml_edit::de::Error,
    },

    #[error("invalid config {origin}:\n{source}")]
    Invalid {
        origin: ConfigOrigin,
        source: ValidationError,
    },
}

fn parse(input: &str, origin: ConfigOrigin) -> Result<PatchConfig, ConfigError> {
    let config: PatchConfig = match toml_edit::de::from_str(input) {
        Ok(config) => config,
        Err(source) => return Err(ConfigError::Parse { origin, source }),
    };

    match config.validate() {
        Ok(()) => Ok(config),
        Err(source) => Err(ConfigError::Invalid { origin, source }),
    }
}

pub fn load_from_str(input: &str) -> Result<PatchConfig, ConfigError> {
    parse(input, ConfigOrigin::Inline)
}

/// Load a config file. A relative `meta.project_root` is taken relative to
/// the directory holding the file; `~` paths are left for the caller.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<PatchConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut config = parse(&contents, ConfigOrigin::File(path.to_path_buf()))?;

    if let (Some(root), Some(dir)) = (config.meta.project_root.as_mut(), path.parent()) {
        if root.is_relative() && !root.starts_with("~") {
            *root = dir.join(&*root);
        }
    }

    Ok(config)
}
