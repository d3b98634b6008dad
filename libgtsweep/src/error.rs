//! Error types for gtsweep

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::credentials::CredentialReport;

pub type Result<T> = std::result::Result<T, GtSweepError>;

#[derive(Error, Debug)]
pub enum GtSweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Sweep aborted: {0}")]
    Sweep(#[from] SweepError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl GtSweepError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            GtSweepError::InvalidInput(_) => 3,
            GtSweepError::Platform(PlatformError::Authentication(_)) => 2,
            GtSweepError::Sweep(SweepError::FetchFailed {
                source: PlatformError::Authentication(_),
                ..
            }) => 2,
            GtSweepError::Platform(_) => 1,
            GtSweepError::Sweep(_) => 1,
            GtSweepError::Config(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No configuration file name given")]
    EmptyPath,

    #[error("No config file or credentials provided. Cannot continue.")]
    NoCredentials,

    #[error("Incomplete credentials:\n{0}")]
    IncompleteCredentials(CredentialReport),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        /// Time left until the rate-limit window resets, when the server said
        retry_after: Option<Duration>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error: {0}")]
    Api(String),
}

impl PlatformError {
    /// Whether repeating the same request later could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            PlatformError::Network(_) | PlatformError::RateLimit { .. } => true,
            PlatformError::Authentication(_)
            | PlatformError::NotFound(_)
            | PlatformError::Api(_) => false,
        }
    }

    /// A rate-limit error without reset information
    pub fn rate_limited(message: impl Into<String>) -> Self {
        PlatformError::RateLimit {
            message: message.into(),
            retry_after: None,
        }
    }

    /// How long the server asked us to wait before trying again
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            PlatformError::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("timeline fetch failed after {attempts} consecutive attempt(s): {source}")]
    FetchFailed {
        attempts: u32,
        #[source]
        source: PlatformError,
    },

    #[error("{pages} consecutive page(s) yielded no successful removals")]
    Stalled { pages: u32 },
}
