//! Credential resolution
//!
//! Values passed on the command line always win. The config file is only
//! consulted when at least one field is still missing, and it only fills the
//! gaps.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::config;
use crate::credentials::{CredentialSet, PartialCredentials};
use crate::error::{ConfigError, Result};

/// Merges command-line overrides with the config file
#[derive(Debug, Default)]
pub struct CredentialResolver {
    overrides: PartialCredentials,
    config_file: Option<PathBuf>,
    default_file: Option<PathBuf>,
}

impl CredentialResolver {
    pub fn new(overrides: PartialCredentials) -> Self {
        Self {
            overrides,
            ..Default::default()
        }
    }

    /// Use an explicit config file instead of the default location
    ///
    /// Unlike the default file, an explicit file that cannot be read is an
    /// error.
    pub fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_file = path;
        self
    }

    /// Replace the default location (normally `$GTSWEEP_CONFIG` or `~/.gtrc`)
    pub fn with_default_file(mut self, path: PathBuf) -> Self {
        self.default_file = Some(path);
        self
    }

    /// Produce a complete credential set
    ///
    /// # Errors
    ///
    /// - `ConfigError::NoCredentials` if fields are missing and there is no
    ///   config file to fall back on
    /// - `ConfigError::EmptyPath` / `ConfigError::ReadError` if the config
    ///   file cannot be used
    /// - `ConfigError::IncompleteCredentials` if fields are still missing
    ///   after reading the file
    pub fn resolve(self) -> Result<CredentialSet> {
        if self.overrides.is_complete() {
            debug!("All credentials supplied on the command line, skipping config file");
            return self.overrides.complete();
        }

        let Some(path) = self.locate_config_file() else {
            return Err(ConfigError::NoCredentials.into());
        };

        info!("Reading credentials from {}", path.display());
        let from_file = config::load_credentials(&path)?;
        let merged = self.overrides.or(from_file);

        if !merged.is_complete() {
            for field in merged.missing() {
                warn!("Missing {} after reading {}", field.label(), path.display());
            }
        }

        merged.complete()
    }

    fn locate_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_file {
            return Some(path.clone());
        }

        let path = match &self.default_file {
            Some(path) => path.clone(),
            None => match config::resolve_config_path() {
                Ok(path) => path,
                Err(e) => {
                    warn!("Cannot determine default config file: {}", e);
                    return None;
                }
            },
        };

        if path.is_file() {
            Some(path)
        } else {
            debug!("No config file at {}", path.display());
            None
        }
    }
}
