use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::post::Post;

/// A post flattened into one row of the analytics table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostRecord {
    pub id: String,
    pub taken_at: DateTime<Utc>,
    pub like_count: u64,
    pub comment_count: u64,
    pub caption: Option<String>,
    pub caption_length: Option<usize>,
    pub caption_word_count: Option<usize>,
    pub engagements: u64,
    /// Percentage of followers that engaged; `None` when the follower count is zero.
    pub engagement_rate: Option<f64>,
}

/// "Fetch older than this" marker for the next feed request.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationCursor {
    pub last_id: String,
    pub last_timestamp: DateTime<Utc>,
}

impl PaginationCursor {
    pub fn from_post(post: &Post) -> Self {
        Self {
            last_id: post.id.clone(),
            last_timestamp: post.taken_at_datetime(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HashtagCount {
    pub hashtag: String,
    pub count: usize,
}

impl HashtagCount {
    pub fn new(hashtag: impl Into<String>, count: usize) -> Self {
        Self {
            hashtag: hashtag.into(),
            count,
        }
    }
}

/// Raw output of the feed paginator.
#[derive(Debug, Clone, Default)]
pub struct FeedCollection {
    /// Reverse chronological, pages concatenated in fetch order.
    pub posts: Vec<Post>,
    pub fetches: usize,
    pub duplicates_dropped: usize,
}

/// Posts of one collection run as table rows plus the id lookup.
#[derive(Debug, Clone, Default)]
pub struct PostCollection {
    pub records: Vec<PostRecord>,
    pub post_dict: HashMap<String, Post>,
    pub fetches: usize,
}

/// Everything one collection run produced for a user.
///
/// Built once by the feed service and handed to the downloader, the analyzer
/// and the word cloud renderer.
#[derive(Debug, Clone)]
pub struct CollectionContext {
    pub username: String,
    pub user_id: u64,
    pub follower_count: u64,
    pub start_date: DateTime<Utc>,
    pub records: Vec<PostRecord>,
    pub post_dict: HashMap<String, Post>,
    /// Post ids by engagements, most engaged first.
    pub ranked_post_ids: Vec<String>,
    pub fetches: usize,
}

impl CollectionContext {
    pub fn post(&self, post_id: &str) -> Option<&Post> {
        self.post_dict.get(post_id)
    }

    pub fn top_post_ids(&self, n: usize) -> Vec<String> {
        self.ranked_post_ids.iter().take(n).cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The engager's feed could not be read, usually a private account.
    Inaccessible(String),
    Cancelled,
}

/// What happened to a single sampled engager.
#[derive(Debug, Clone, PartialEq)]
pub enum EngagerOutcome {
    Success {
        user_id: u64,
        hashtags: usize,
        failed_comment_fetches: usize,
    },
    Skipped { user_id: u64, reason: SkipReason },
}

impl EngagerOutcome {
    pub fn user_id(&self) -> u64 {
        match self {
            EngagerOutcome::Success { user_id, .. } | EngagerOutcome::Skipped { user_id, .. } => {
                *user_id
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, EngagerOutcome::Success { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HashtagAnalysis {
    /// Hashtags grouped and counted, most frequent first.
    pub ranked: Vec<HashtagCount>,
    /// Every hashtag seen, in the order it was found.
    pub hashtags: Vec<String>,
    pub engagers_total: usize,
    pub engagers_used: usize,
    pub inaccessible_engagers: usize,
    pub failed_comment_fetches: usize,
    pub outcomes: Vec<EngagerOutcome>,
}
