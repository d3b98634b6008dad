//! Timeline abstraction and implementations
//!
//! The sweeper only talks to the remote service through the [`Timeline`]
//! trait. [`twitter::TwitterClient`] implements it against the Twitter v1.1
//! REST API; [`mock::MockTimeline`] is a scriptable stand-in used by tests.
//!
//! # Examples
//!
//! ```no_run
//! use libgtsweep::platforms::{Timeline, twitter::TwitterClient};
//! use libgtsweep::resolver::CredentialResolver;
//! use libgtsweep::credentials::PartialCredentials;
//!
//! # async fn example() -> libgtsweep::error::Result<()> {
//! let credentials = CredentialResolver::new(PartialCredentials::default()).resolve()?;
//! let client = TwitterClient::new(&credentials)?;
//!
//! for item in client.fetch_page(20).await? {
//!     println!("{} {}", item.id, item.text);
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::error::PlatformError;
use crate::types::{Removal, TimelineItem};

pub mod twitter;

// Mock timeline is available for all builds (not just tests) to support integration tests
pub mod mock;

/// The remote operations a sweep needs
#[async_trait]
pub trait Timeline: Send + Sync {
    /// Fetch up to `count` of the authenticated user's most recent items
    ///
    /// An empty page means the timeline has nothing left.
    ///
    /// # Errors
    ///
    /// - `PlatformError::Authentication` for rejected credentials
    /// - `PlatformError::RateLimit` / `PlatformError::Network` for conditions
    ///   that may clear up on their own
    async fn fetch_page(&self, count: u32) -> Result<Vec<TimelineItem>, PlatformError>;

    /// Delete one of the user's own posts, returning the deleted post
    async fn destroy(&self, id: u64) -> Result<TimelineItem, PlatformError>;

    /// Undo a repost, returning the post that had been reposted
    async fn unretweet(&self, id: u64) -> Result<TimelineItem, PlatformError>;

    /// Lowercase identifier used in logs
    fn name(&self) -> &str;

    /// Remove an item with whichever call fits it
    async fn remove(&self, item: &TimelineItem) -> Result<TimelineItem, PlatformError> {
        match item.removal() {
            Removal::Delete => self.destroy(item.id).await,
            Removal::Unretweet => self.unretweet(item.id).await,
        }
    }
}
