//! Core types for gtsweep

use serde::{Deserialize, Serialize};

/// A post on the user's own timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineItem {
    pub id: u64,
    pub text: String,
    pub is_repost: bool,
}

impl TimelineItem {
    /// An original post
    pub fn post(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            is_repost: false,
        }
    }

    /// A repost of someone else's post
    pub fn repost(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            is_repost: true,
        }
    }

    /// How this item gets removed from the timeline
    pub fn removal(&self) -> Removal {
        if self.is_repost {
            Removal::Unretweet
        } else {
            Removal::Delete
        }
    }
}

/// The call used to remove an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Removal {
    Delete,
    Unretweet,
}

impl std::fmt::Display for Removal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Removal::Delete => write!(f, "delete"),
            Removal::Unretweet => write!(f, "unretweet"),
        }
    }
}
