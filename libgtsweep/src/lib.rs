//! gtsweep - Clear out your own Twitter timeline
//!
//! This library resolves account credentials from command-line overrides and
//! a `~/.gtrc` file, signs requests with OAuth 1.0a, and sweeps the
//! authenticated user's timeline: every original post is deleted and every
//! repost is undone, page after page, until nothing is left.

pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod oauth;
pub mod platforms;
pub mod resolver;
pub mod sweeper;
pub mod types;

// Re-export commonly used types
pub use credentials::{CredentialField, CredentialSet, PartialCredentials};
pub use error::{GtSweepError, Result};
pub use resolver::CredentialResolver;
pub use sweeper::{SweepConfig, SweepEvent, SweepReport, Sweeper};
pub use types::{Removal, TimelineItem};
