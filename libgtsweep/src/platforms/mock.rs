//! Mock timeline implementation for testing
//!
//! Behaves like a small in-memory timeline: fetches return the first items
//! still present, and successful removals take items out of it. Individual
//! fetch results can be scripted ahead of time, and specific ids can be made
//! to fail, so sweep logic can be exercised without credentials or network
//! access.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use crate::error::PlatformError;
use crate::platforms::Timeline;
use crate::types::TimelineItem;

type FetchResult = Result<Vec<TimelineItem>, PlatformError>;

/// Mock timeline for testing
#[derive(Default)]
pub struct MockTimeline {
    /// Items still on the timeline, newest first
    remaining: Mutex<Vec<TimelineItem>>,

    /// Fetch results returned before falling back to `remaining`
    script: Mutex<VecDeque<FetchResult>>,

    /// Every item ever handed out, so scripted items can be removed too
    known: Mutex<HashMap<u64, TimelineItem>>,

    /// Ids whose removal always fails
    failing_ids: HashSet<u64>,

    /// Errors returned by the next removals of an id, one per call
    queued_failures: Mutex<HashMap<u64, VecDeque<PlatformError>>>,

    fetch_calls: Mutex<usize>,
    requested_counts: Mutex<Vec<u32>>,
    destroy_calls: Mutex<Vec<u64>>,
    unretweet_calls: Mutex<Vec<u64>>,
}

impl MockTimeline {
    /// A timeline holding `items`, newest first
    pub fn new(items: Vec<TimelineItem>) -> Self {
        Self {
            remaining: Mutex::new(items),
            ..Default::default()
        }
    }

    /// A timeline that returns exactly these pages, then empty pages
    pub fn with_pages(pages: Vec<Vec<TimelineItem>>) -> Self {
        Self {
            script: Mutex::new(pages.into_iter().map(Ok).collect()),
            ..Default::default()
        }
    }

    /// Queue a scripted fetch result ahead of the live timeline
    pub fn push_fetch(self, result: FetchResult) -> Self {
        self.script
            .lock()
            .expect("mock script lock poisoned")
            .push_back(result);
        self
    }

    /// Make removal of `id` fail with an API error
    pub fn fail_on(mut self, id: u64) -> Self {
        self.failing_ids.insert(id);
        self
    }

    /// Make the next removal of `id` fail with `error`
    ///
    /// Calls queue up, so chaining this three times fails the first three
    /// removals and lets the fourth through.
    pub fn fail_next(mut self, id: u64, error: PlatformError) -> Self {
        self.queued_failures
            .get_mut()
            .expect("mock lock poisoned")
            .entry(id)
            .or_default()
            .push_back(error);
        self
    }

    /// Number of times fetch_page was called
    pub fn fetch_calls(&self) -> usize {
        *self.fetch_calls.lock().expect("mock lock poisoned")
    }

    /// The `count` argument of every fetch, in order
    pub fn requested_counts(&self) -> Vec<u32> {
        self.requested_counts.lock().expect("mock lock poisoned").clone()
    }

    /// Ids passed to destroy, in call order
    pub fn destroy_calls(&self) -> Vec<u64> {
        self.destroy_calls.lock().expect("mock lock poisoned").clone()
    }

    /// Ids passed to unretweet, in call order
    pub fn unretweet_calls(&self) -> Vec<u64> {
        self.unretweet_calls.lock().expect("mock lock poisoned").clone()
    }

    /// Items that have not been removed yet
    pub fn remaining(&self) -> Vec<TimelineItem> {
        self.remaining.lock().expect("mock lock poisoned").clone()
    }

    fn take(&self, id: u64) -> Result<TimelineItem, PlatformError> {
        if self.failing_ids.contains(&id) {
            return Err(PlatformError::Api(format!("mock removal failure for {}", id)));
        }

        let queued = self
            .queued_failures
            .lock()
            .expect("mock lock poisoned")
            .get_mut(&id)
            .and_then(|errors| errors.pop_front());
        if let Some(error) = queued {
            return Err(error);
        }

        self.remaining
            .lock()
            .expect("mock lock poisoned")
            .retain(|item| item.id != id);

        self.known
            .lock()
            .expect("mock lock poisoned")
            .get(&id)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(format!("No status found with id {}", id)))
    }
}

#[async_trait]
impl Timeline for MockTimeline {
    async fn fetch_page(&self, count: u32) -> Result<Vec<TimelineItem>, PlatformError> {
        *self.fetch_calls.lock().expect("mock lock poisoned") += 1;
        self.requested_counts
            .lock()
            .expect("mock lock poisoned")
            .push(count);

        let scripted = self.script.lock().expect("mock lock poisoned").pop_front();
        let result = match scripted {
            Some(result) => result,
            None => Ok(self
                .remaining
                .lock()
                .expect("mock lock poisoned")
                .iter()
                .take(count as usize)
                .cloned()
                .collect()),
        };

        if let Ok(items) = &result {
            let mut known = self.known.lock().expect("mock lock poisoned");
            for item in items {
                known.insert(item.id, item.clone());
            }
        }

        result
    }

    async fn destroy(&self, id: u64) -> Result<TimelineItem, PlatformError> {
        self.destroy_calls
            .lock()
            .expect("mock lock poisoned")
            .push(id);
        self.take(id)
    }

    async fn unretweet(&self, id: u64) -> Result<TimelineItem, PlatformError> {
        self.unretweet_calls
            .lock()
            .expect("mock lock poisoned")
            .push(id);
        self.take(id)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
