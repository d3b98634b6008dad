//! Timeline sweeping
//!
//! The sweep is one loop: fetch a page of the user's own timeline, remove
//! each item on it (unretweet for reposts, delete for everything else), and
//! repeat until a fetch comes back empty.
//!
//! Items are handled strictly one at a time with a fixed pause before each
//! removal. A failed removal is reported and skipped. A failed fetch is
//! retried with exponential backoff, up to a limit of consecutive failures.
//! A page on which nothing could be removed because of rate limiting or
//! network trouble is followed by the same backoff before the next fetch.
//! Only pages that fail for good count toward the stall limit.

use std::time::Duration;

use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{Result, SweepError};
use crate::platforms::Timeline;
use crate::types::{Removal, TimelineItem};

/// Items requested per fetch
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Largest page the timeline endpoint will return
pub const MAX_PAGE_SIZE: u32 = 200;

/// Pause before each removal
pub const DEFAULT_ACTION_DELAY: Duration = Duration::from_secs(1);

/// Longest wait honoured from a rate-limit reset time (one API window)
pub const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(15 * 60);

/// Backoff policy for failed fetches and throttled pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRetry {
    /// Consecutive failed fetches tolerated before the sweep aborts
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl FetchRetry {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Delay after the `attempt`-th consecutive failure (1-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Delay after a failure, preferring the server's rate-limit reset time
    pub fn wait_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(wait) => wait.min(MAX_RATE_LIMIT_WAIT),
            None => self.delay_for_attempt(attempt),
        }
    }
}

impl Default for FetchRetry {
    fn default() -> Self {
        Self::new(5)
    }
}

/// Tunables for a sweep
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub page_size: u32,
    pub action_delay: Duration,
    pub retry: FetchRetry,
    /// Consecutive non-empty pages whose removals all failed permanently
    /// before the sweep gives up
    pub max_stalled_pages: u32,
    /// Stop after this many pages even if the timeline is not empty
    pub max_pages: Option<u32>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            action_delay: DEFAULT_ACTION_DELAY,
            retry: FetchRetry::default(),
            max_stalled_pages: 3,
            max_pages: None,
        }
    }
}

/// Progress notifications emitted while sweeping
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SweepEvent {
    PageFetched {
        page: u32,
        items: usize,
    },
    Removed {
        index: usize,
        id: u64,
        action: Removal,
        text: String,
    },
    RemovalFailed {
        index: usize,
        id: u64,
        action: Removal,
        text: String,
        error: String,
    },
    FetchFailed {
        attempt: u32,
        error: String,
        retry_in_ms: u64,
    },
    /// Nothing on the page could be removed, but only for reasons that may
    /// clear up, so the sweep waits before fetching again
    Throttled {
        page: u32,
        failures: u32,
        retry_in_ms: u64,
    },
    Finished {
        report: SweepReport,
    },
}

/// Totals for one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub pages: u32,
    pub deleted: u32,
    pub unretweeted: u32,
    pub failed: u32,
    pub fetch_retries: u32,
    pub throttled_pages: u32,
}

impl SweepReport {
    pub fn removed(&self) -> u32 {
        self.deleted + self.unretweeted
    }
}

/// What happened to the items of one page
#[derive(Debug, Default)]
struct PageOutcome {
    removed: u32,
    transient_failures: u32,
    /// Longest rate-limit reset reported by any failure on the page
    retry_after: Option<Duration>,
}

/// Drains a timeline
pub struct Sweeper<'a> {
    timeline: &'a dyn Timeline,
    config: SweepConfig,
}

impl<'a> Sweeper<'a> {
    pub fn new(timeline: &'a dyn Timeline, config: SweepConfig) -> Self {
        Self { timeline, config }
    }

    /// Sweep until the timeline is empty, logging progress only
    pub async fn run(&self) -> Result<SweepReport> {
        self.run_with(|_| {}).await
    }

    /// Sweep until the timeline is empty, reporting progress to `on_event`
    ///
    /// # Errors
    ///
    /// - `SweepError::FetchFailed` when a fetch fails permanently or too many
    ///   fetches fail in a row
    /// - `SweepError::Stalled` when page after page yields only permanent
    ///   removal failures
    pub async fn run_with<F>(&self, mut on_event: F) -> Result<SweepReport>
    where
        F: FnMut(&SweepEvent),
    {
        let mut report = SweepReport::default();
        let mut failed_fetches = 0u32;
        let mut stalled_pages = 0u32;
        let mut throttled_pages = 0u32;

        info!(timeline = self.timeline.name(), "Starting sweep");

        loop {
            if let Some(max_pages) = self.config.max_pages {
                if report.pages >= max_pages {
                    info!("Stopping after {} page(s) as requested", max_pages);
                    break;
                }
            }

            let page = match self.timeline.fetch_page(self.config.page_size).await {
                Ok(page) => {
                    failed_fetches = 0;
                    page
                }
                Err(e) => {
                    failed_fetches += 1;
                    if !e.is_transient() || failed_fetches >= self.config.retry.max_attempts {
                        warn!("Giving up on timeline fetch: {}", e);
                        return Err(SweepError::FetchFailed {
                            attempts: failed_fetches,
                            source: e,
                        }
                        .into());
                    }

                    let delay = self.config.retry.wait_for(failed_fetches, e.retry_after());
                    warn!(
                        "Timeline fetch failed (attempt {}/{}): {}. Retrying in {:?}...",
                        failed_fetches, self.config.retry.max_attempts, e, delay
                    );
                    on_event(&SweepEvent::FetchFailed {
                        attempt: failed_fetches,
                        error: e.to_string(),
                        retry_in_ms: delay.as_millis() as u64,
                    });
                    report.fetch_retries += 1;
                    sleep(delay).await;
                    continue;
                }
            };

            report.pages += 1;
            on_event(&SweepEvent::PageFetched {
                page: report.pages,
                items: page.len(),
            });

            if page.is_empty() {
                info!("No more posts on the timeline");
                break;
            }

            debug!("Page {} has {} item(s)", report.pages, page.len());
            let outcome = self.sweep_page(&page, &mut report, &mut on_event).await;

            if outcome.removed > 0 {
                stalled_pages = 0;
                throttled_pages = 0;
            } else if outcome.transient_failures > 0 {
                throttled_pages += 1;
                report.throttled_pages += 1;

                let delay = self.config.retry.wait_for(throttled_pages, outcome.retry_after);
                warn!(
                    "Nothing removed from page {} ({} temporary failure(s)). Waiting {:?}...",
                    report.pages, outcome.transient_failures, delay
                );
                on_event(&SweepEvent::Throttled {
                    page: report.pages,
                    failures: outcome.transient_failures,
                    retry_in_ms: delay.as_millis() as u64,
                });
                sleep(delay).await;
            } else {
                stalled_pages += 1;
                if stalled_pages >= self.config.max_stalled_pages {
                    return Err(SweepError::Stalled {
                        pages: stalled_pages,
                    }
                    .into());
                }
            }
        }

        info!(
            "Sweep finished: {} deleted, {} unretweeted, {} failed",
            report.deleted, report.unretweeted, report.failed
        );
        on_event(&SweepEvent::Finished {
            report: report.clone(),
        });
        Ok(report)
    }

    /// Remove every item on one page
    async fn sweep_page<F>(
        &self,
        page: &[TimelineItem],
        report: &mut SweepReport,
        on_event: &mut F,
    ) -> PageOutcome
    where
        F: FnMut(&SweepEvent),
    {
        let mut outcome = PageOutcome::default();

        for (index, item) in page.iter().enumerate() {
            let action = item.removal();

            if !self.config.action_delay.is_zero() {
                sleep(self.config.action_delay).await;
            }

            match self.timeline.remove(item).await {
                Ok(gone) => {
                    outcome.removed += 1;
                    match action {
                        Removal::Delete => report.deleted += 1,
                        Removal::Unretweet => report.unretweeted += 1,
                    }
                    debug!(id = item.id, %action, "Removed item");
                    on_event(&SweepEvent::Removed {
                        index,
                        id: item.id,
                        action,
                        text: gone.text,
                    });
                }
                Err(e) => {
                    report.failed += 1;
                    if e.is_transient() {
                        outcome.transient_failures += 1;
                        outcome.retry_after = outcome.retry_after.max(e.retry_after());
                    }
                    warn!("Failed to {} {}: {}", action, item.id, e);
                    on_event(&SweepEvent::RemovalFailed {
                        index,
                        id: item.id,
                        action,
                        text: item.text.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        outcome
    }
}
