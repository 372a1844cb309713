//! Optional per-registry configuration read from `<root>/chainreg.toml`.

use chainreg_kernel::ValidationPolicy;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::ignore::load_ignore_list;

pub const CONFIG_FILE_NAME: &str = "chainreg.toml";
pub const DEFAULT_IGNORE_FILE: &str = "ignore_error.txt";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid toml at {path}: {source}")]
    ParseToml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("ignore file {path}: {message}")]
    IgnoreFile { path: String, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Ignore list location, relative to the registry root.
    #[serde(default)]
    pub ignore_file: Option<PathBuf>,

    /// Verification transactions shared on purpose, on top of the built-in
    /// permissioned exchange list.
    #[serde(default)]
    pub exempt_verification_txs: Vec<String>,
}

impl RegistryConfig {
    /// Read `<root>/chainreg.toml`, or the defaults when it does not exist.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE_NAME);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        let config = Self::parse(&text, &path)?;
        tracing::debug!(path = %path.display(), ?config, "loaded registry config");
        Ok(config)
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::ParseToml {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy::default().with_exempt_verification_txs(self.exempt_verification_txs.clone())
    }

    /// Resolve and load the ignore list.
    ///
    /// An explicit path (from the command line) wins and must exist. The
    /// configured path is next and must also exist. The default
    /// `ignore_error.txt` under `root` is optional.
    pub fn resolve_ignore_list(
        &self,
        root: &Path,
        explicit: Option<&Path>,
    ) -> Result<BTreeSet<String>, ConfigError> {
        match (explicit, self.ignore_file.as_deref()) {
            (Some(path), _) => load_ignore_list(path, true),
            (None, Some(configured)) => load_ignore_list(&root.join(configured), true),
            (None, None) => load_ignore_list(&root.join(DEFAULT_IGNORE_FILE), false),
        }
    }
}
