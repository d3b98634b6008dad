//! Configuration file handling for gtsweep
//!
//! Credentials live in a small line-oriented file, `~/.gtrc` by default:
//!
//! ```text
//! user=alice
//! consumer-key="xvz1evFS4wEEPTGEFPHBog"
//! consumer-secret="kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw"
//! access-token=370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb
//! access-secret=LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE
//! ```
//!
//! Every line is tested against each field pattern independently. Values may
//! be wrapped in double quotes. When a field appears more than once the last
//! line wins. Anything else in the file is ignored.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::credentials::{CredentialField, PartialCredentials};
use crate::error::{ConfigError, Result};

/// File name looked up in the home directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = ".gtrc";

/// Environment variable that overrides the default config file location
pub const CONFIG_ENV_VAR: &str = "GTSWEEP_CONFIG";

static USER_RE: LazyLock<Regex> = LazyLock::new(|| field_regex(CredentialField::User));
static CONSUMER_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| field_regex(CredentialField::ConsumerKey));
static CONSUMER_SECRET_RE: LazyLock<Regex> =
    LazyLock::new(|| field_regex(CredentialField::ConsumerSecret));
static ACCESS_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| field_regex(CredentialField::AccessToken));
static ACCESS_SECRET_RE: LazyLock<Regex> =
    LazyLock::new(|| field_regex(CredentialField::AccessSecret));

fn field_regex(field: CredentialField) -> Regex {
    Regex::new(&format!(r#"^{}="?([^"]+)"?$"#, regex::escape(field.key())))
        .expect("Invalid regex")
}

fn patterns() -> [(CredentialField, &'static Regex); 5] {
    [
        (CredentialField::User, &*USER_RE),
        (CredentialField::ConsumerKey, &*CONSUMER_KEY_RE),
        (CredentialField::ConsumerSecret, &*CONSUMER_SECRET_RE),
        (CredentialField::AccessToken, &*ACCESS_TOKEN_RE),
        (CredentialField::AccessSecret, &*ACCESS_SECRET_RE),
    ]
}

/// Extract credential fields from config file contents
pub fn parse_credentials(content: &str) -> PartialCredentials {
    let mut found = PartialCredentials::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        for (field, pattern) in patterns() {
            if let Some(captures) = pattern.captures(line) {
                found.set(field, &captures[1]);
            }
        }
    }

    found
}

/// Read a config file and extract its credential fields
///
/// # Errors
///
/// Returns `ConfigError::EmptyPath` for an empty path and
/// `ConfigError::ReadError` if the file cannot be read.
pub fn load_credentials(path: &Path) -> Result<PartialCredentials> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::EmptyPath.into());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    let found = parse_credentials(&content);
    tracing::debug!(
        path = %path.display(),
        missing = found.missing().len(),
        "Parsed config file"
    );
    Ok(found)
}

/// Expand `~` in a user-supplied path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

/// Resolve the default config file path
///
/// `$GTSWEEP_CONFIG` wins if set, otherwise `~/.gtrc`.
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return Ok(expand_path(&path));
    }

    let home = dirs::home_dir()
        .ok_or_else(|| ConfigError::MissingField("home directory".to_string()))?;

    Ok(home.join(DEFAULT_CONFIG_FILE))
}
