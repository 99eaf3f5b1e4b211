use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::{
    application::models::post::{
        Comment, CommentsPage, FeedPage, LikersResponse, MediaInfoResponse, Post, User,
        UserInfoResponse, UserProfile,
    },
    error::AppError,
    session::{interface::SessionCookie, session::Session},
    transport::http_client::PlatformHttpClient,
};

/// The calls the analytics pipeline makes against the platform.
///
/// Every call is a single blocking round trip from the caller's point of view;
/// nothing here retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// One page of a user's feed, newest first. `max_id` asks for posts older
    /// than that id, `min_timestamp` (epoch seconds) bounds the page from below.
    async fn fetch_user_feed(
        &self,
        user_id: u64,
        max_id: Option<String>,
        min_timestamp: Option<i64>,
    ) -> Result<FeedPage, AppError>;

    async fn fetch_user_info(&self, user_id: u64) -> Result<UserProfile, AppError>;

    async fn fetch_user_by_username(&self, username: &str) -> Result<UserProfile, AppError>;

    async fn fetch_media_likers(&self, post_id: &str) -> Result<Vec<User>, AppError>;

    /// Up to `limit` comments, newest first.
    async fn fetch_media_comments(&self, post_id: &str, limit: usize) -> Result<Vec<Comment>, AppError>;

    async fn fetch_media_info(&self, post_id: &str) -> Result<Post, AppError>;

    /// Raw bytes behind an absolute media URL.
    async fn download(&self, url: &str) -> Result<Vec<u8>, AppError>;
}

/// `PlatformClient` over the private REST API, authenticated with a session cookie.
pub struct InstagramClient {
    http: Arc<PlatformHttpClient>,
    cookie: SessionCookie,
}

impl InstagramClient {
    pub fn new(http: Arc<PlatformHttpClient>, cookie: SessionCookie) -> Self {
        Self { http, cookie }
    }

    /// Fails with `AppError::Unauthorized` when the session never logged in.
    pub fn from_session(session: &Session) -> Result<Self, AppError> {
        let cookie = session.cookie().cloned().ok_or(AppError::Unauthorized)?;
        Ok(Self::new(session.http_client(), cookie))
    }

    async fn get<T: serde::de::DeserializeOwned + std::fmt::Debug>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        self.http.get(endpoint, query, Some(&self.cookie.cookie)).await
    }
}

#[async_trait]
impl PlatformClient for InstagramClient {
    #[instrument(skip(self))]
    async fn fetch_user_feed(
        &self,
        user_id: u64,
        max_id: Option<String>,
        min_timestamp: Option<i64>,
    ) -> Result<FeedPage, AppError> {
        let mut query = Vec::new();
        if let Some(max_id) = max_id {
            query.push(("max_id", max_id));
        }
        if let Some(min_timestamp) = min_timestamp {
            query.push(("min_timestamp", min_timestamp.to_string()));
        }

        let page: FeedPage = self.get(&format!("/feed/user/{}/", user_id), &query).await?;
        debug!("Feed page for {}: {} posts", user_id, page.items.len());
        Ok(page)
    }

    #[instrument(skip(self))]
    async fn fetch_user_info(&self, user_id: u64) -> Result<UserProfile, AppError> {
        let response: UserInfoResponse = self.get(&format!("/users/{}/info/", user_id), &[]).await?;
        Ok(response.user)
    }

    #[instrument(skip(self))]
    async fn fetch_user_by_username(&self, username: &str) -> Result<UserProfile, AppError> {
        let response: UserInfoResponse = self
            .get(&format!("/users/{}/usernameinfo/", username), &[])
            .await?;
        Ok(response.user)
    }

    #[instrument(skip(self))]
    async fn fetch_media_likers(&self, post_id: &str) -> Result<Vec<User>, AppError> {
        let response: LikersResponse = self.get(&format!("/media/{}/likers/", post_id), &[]).await?;
        debug!("Post {} has {} likers", post_id, response.users.len());
        Ok(response.users)
    }

    #[instrument(skip(self))]
    async fn fetch_media_comments(&self, post_id: &str, limit: usize) -> Result<Vec<Comment>, AppError> {
        let endpoint = format!("/media/{}/comments/", post_id);
        let mut comments: Vec<Comment> = Vec::new();
        let mut max_id: Option<String> = None;

        while comments.len() < limit {
            let query: Vec<(&str, String)> = max_id
                .iter()
                .map(|id| ("max_id", id.clone()))
                .collect();
            let page: CommentsPage = self.get(&endpoint, &query).await?;
            if page.comments.is_empty() {
                break;
            }
            comments.extend(page.comments);

            match page.next_max_id {
                Some(next) if page.has_more_comments && max_id.as_deref() != Some(next.as_str()) => {
                    max_id = Some(next)
                }
                _ => break,
            }
        }

        comments.truncate(limit);
        debug!("Read {} comments of post {}", comments.len(), post_id);
        Ok(comments)
    }

    #[instrument(skip(self))]
    async fn fetch_media_info(&self, post_id: &str) -> Result<Post, AppError> {
        let response: MediaInfoResponse = self.get(&format!("/media/{}/info/", post_id), &[]).await?;
        response.items.into_iter().next().ok_or(AppError::NotFound)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, AppError> {
        self.http.get_bytes(url).await
    }
}
