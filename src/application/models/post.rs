/******************************************************************************
    Author: Joaquín Béjar García
    Email: jb@taunais.com
    Date: 12/5/25
 ******************************************************************************/
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::utils::time::unix_to_datetime;

/// User ids come back as numbers from most endpoints and as strings from a few.
fn de_pk<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Pk {
        Num(u64),
        Str(String),
    }

    match Pk::deserialize(deserializer)? {
        Pk::Num(n) => Ok(n),
        Pk::Str(s) => s.parse::<u64>().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Caption {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageCandidate {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ImageVersions {
    #[serde(default)]
    pub candidates: Vec<ImageCandidate>,
}

impl ImageVersions {
    /// The first candidate is the full resolution rendition.
    pub fn best_url(&self) -> Option<&str> {
        self.candidates.first().map(|c| c.url.as_str())
    }
}

/// One element of a carousel post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CarouselItem {
    pub id: Option<String>,
    pub image_versions2: Option<ImageVersions>,
}

/// A post as delivered by the feed and media endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: String,
    pub taken_at: i64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    pub caption: Option<Caption>,
    pub carousel_media: Option<Vec<CarouselItem>>,
    pub image_versions2: Option<ImageVersions>,
}

impl Post {
    pub fn caption_text(&self) -> Option<&str> {
        self.caption.as_ref().map(|c| c.text.as_str())
    }

    pub fn taken_at_datetime(&self) -> DateTime<Utc> {
        unix_to_datetime(self.taken_at)
    }

    pub fn is_carousel(&self) -> bool {
        self.carousel_media.as_ref().is_some_and(|m| !m.is_empty())
    }

    /// Download URLs with their position in the post: every carousel item, or
    /// the single image at index 0.
    pub fn image_urls(&self) -> Vec<(usize, &str)> {
        match &self.carousel_media {
            Some(media) if !media.is_empty() => media
                .iter()
                .enumerate()
                .filter_map(|(n, item)| {
                    item.image_versions2
                        .as_ref()
                        .and_then(|v| v.best_url())
                        .map(|url| (n, url))
                })
                .collect(),
            _ => self
                .image_versions2
                .as_ref()
                .and_then(|v| v.best_url())
                .map(|url| vec![(0, url)])
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        write!(f, "{}", s)
    }
}

/// One page of `feed/user/{id}/`, newest post first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FeedPage {
    #[serde(default)]
    pub items: Vec<Post>,
    #[serde(default)]
    pub num_results: usize,
    #[serde(default)]
    pub more_available: bool,
    pub next_max_id: Option<String>,
}

impl FeedPage {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Oldest post of the page, the last one in reverse chronological order.
    pub fn oldest(&self) -> Option<&Post> {
        self.items.last()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[serde(deserialize_with = "de_pk")]
    pub pk: u64,
    pub username: String,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    #[serde(deserialize_with = "de_pk")]
    pub pk: u64,
    pub username: String,
    pub full_name: Option<String>,
    #[serde(default)]
    pub follower_count: u64,
    #[serde(default)]
    pub following_count: u64,
    #[serde(default)]
    pub media_count: u64,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserInfoResponse {
    pub user: UserProfile,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LikersResponse {
    #[serde(default)]
    pub users: Vec<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub text: String,
    pub user: User,
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CommentsPage {
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub next_max_id: Option<String>,
    #[serde(default)]
    pub has_more_comments: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct MediaInfoResponse {
    #[serde(default)]
    pub items: Vec<Post>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub logged_in_user: User,
    pub status: String,
}
