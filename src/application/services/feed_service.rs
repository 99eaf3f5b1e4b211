use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    application::models::{
        post::{FeedPage, Post},
        record::{CollectionContext, FeedCollection, PaginationCursor, PostCollection},
    },
    application::services::platform_client::PlatformClient,
    error::{AppError, Reported, Warning},
    utils::{
        engagement::{rank_by_engagements, to_record, with_engagement},
        time::datetime_to_unix,
    },
};

/// Walks a user's feed backwards in time and turns it into the analytics table.
pub struct FeedService<C: PlatformClient + ?Sized> {
    client: Arc<C>,
}

impl<C: PlatformClient + ?Sized> FeedService<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Fetches every post of `user_id` newer than `start_date`.
    ///
    /// `start_date` is sent as `min_timestamp` on every request. When the first
    /// page is empty it is requested once more before giving up. Pages are
    /// followed through the oldest post id until that post is older than
    /// `start_date` or the platform returns an empty page. Posts already seen on
    /// an earlier page are dropped, and a page that does not move the cursor ends
    /// the walk.
    #[instrument(skip(self, cancel))]
    pub async fn fetch_feed(
        &self,
        user_id: u64,
        start_date: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<Reported<FeedCollection>, AppError> {
        let min_timestamp = datetime_to_unix(start_date);
        let mut collection = FeedCollection::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut warnings = Vec::new();

        let mut page = self
            .fetch_page(user_id, None, min_timestamp, cancel, &mut collection.fetches)
            .await?;
        if page.is_empty() {
            warn!(
                "User {} has no posts since {}, requesting the default feed",
                user_id,
                start_date.date_naive()
            );
            page = self
                .fetch_page(user_id, None, min_timestamp, cancel, &mut collection.fetches)
                .await?;
        }

        let mut cursor = match page.oldest() {
            Some(oldest) => PaginationCursor::from_post(oldest),
            None => {
                warn!("Feed of user {} is empty, nothing to collect", user_id);
                warnings.push(Warning::EmptyFeed {
                    user_id,
                    since: min_timestamp,
                });
                return Ok(Reported::with_warnings(collection, warnings));
            }
        };
        Self::append(&mut collection, &mut seen, page.items);

        while cursor.last_timestamp > start_date {
            let next = self
                .fetch_page(
                    user_id,
                    Some(cursor.last_id.clone()),
                    min_timestamp,
                    cancel,
                    &mut collection.fetches,
                )
                .await?;

            let next_cursor = match next.oldest() {
                Some(oldest) => PaginationCursor::from_post(oldest),
                None => {
                    debug!("Feed exhausted at {}", cursor.last_id);
                    break;
                }
            };
            let added = Self::append(&mut collection, &mut seen, next.items);

            // a page made only of posts already seen means the cursor repeats or cycles
            if added == 0 || next_cursor.last_id == cursor.last_id {
                warn!("Cursor did not advance past {}, stopping", cursor.last_id);
                warnings.push(Warning::CursorStalled {
                    max_id: cursor.last_id,
                });
                break;
            }
            cursor = next_cursor;
        }

        info!(
            "Collected {} posts of user {} in {} requests",
            collection.posts.len(),
            user_id,
            collection.fetches
        );
        Ok(Reported::with_warnings(collection, warnings))
    }

    /// Collects the posts since `start_date` and derives the engagement table.
    ///
    /// # Arguments
    ///
    /// * `user_id` - Platform id of the account
    /// * `start_date` - Oldest post date to include
    /// * `follower_count` - Follower snapshot used for the engagement rate
    /// * `cancel` - Checked before every request
    ///
    /// # Returns
    ///
    /// * `Result<Reported<PostCollection>, AppError>` - Records in feed order and the
    ///   id lookup, plus the warnings raised on the way
    pub async fn collect_posts(
        &self,
        user_id: u64,
        start_date: DateTime<Utc>,
        follower_count: u64,
        cancel: &CancellationToken,
    ) -> Result<Reported<PostCollection>, AppError> {
        let Reported {
            value: feed,
            mut warnings,
        } = self.fetch_feed(user_id, start_date, cancel).await?;

        let records = feed.posts.iter().map(to_record).collect();
        let Reported {
            value: records,
            warnings: engagement_warnings,
        } = with_engagement(records, follower_count, user_id);
        warnings.extend(engagement_warnings);

        let post_dict: HashMap<String, Post> = feed
            .posts
            .into_iter()
            .map(|post| (post.id.clone(), post))
            .collect();

        Ok(Reported::with_warnings(
            PostCollection {
                records,
                post_dict,
                fetches: feed.fetches,
            },
            warnings,
        ))
    }

    /// Resolves `username`, snapshots its follower count and collects its posts
    /// since `start_date` into a `CollectionContext`.
    #[instrument(skip(self, cancel))]
    pub async fn collect_user_posts(
        &self,
        username: &str,
        start_date: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<Reported<CollectionContext>, AppError> {
        Self::check_cancelled(cancel)?;
        let profile = self.client.fetch_user_by_username(username).await?;
        Self::check_cancelled(cancel)?;
        let info = self.client.fetch_user_info(profile.pk).await?;
        info!(
            "Collecting posts of {} ({}), {} followers",
            username, info.pk, info.follower_count
        );

        let Reported { value, warnings } = self
            .collect_posts(info.pk, start_date, info.follower_count, cancel)
            .await?;
        let ranked_post_ids = rank_by_engagements(&value.records);

        Ok(Reported::with_warnings(
            CollectionContext {
                username: username.to_string(),
                user_id: info.pk,
                follower_count: info.follower_count,
                start_date,
                records: value.records,
                post_dict: value.post_dict,
                ranked_post_ids,
                fetches: value.fetches,
            },
            warnings,
        ))
    }

    async fn fetch_page(
        &self,
        user_id: u64,
        max_id: Option<String>,
        min_timestamp: i64,
        cancel: &CancellationToken,
        fetches: &mut usize,
    ) -> Result<FeedPage, AppError> {
        Self::check_cancelled(cancel)?;
        *fetches += 1;
        debug!("Fetching page {} of user {} (max_id {:?})", fetches, user_id, max_id);
        self.client
            .fetch_user_feed(user_id, max_id, Some(min_timestamp))
            .await
    }

    /// Appends the posts not seen yet and returns how many were added.
    fn append(
        collection: &mut FeedCollection,
        seen: &mut HashSet<String>,
        posts: Vec<Post>,
    ) -> usize {
        let before = collection.posts.len();
        for post in posts {
            if seen.insert(post.id.clone()) {
                collection.posts.push(post);
            } else {
                debug!("Dropping duplicate post {}", post.id);
                collection.duplicates_dropped += 1;
            }
        }
        collection.posts.len() - before
    }

    fn check_cancelled(cancel: &CancellationToken) -> Result<(), AppError> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        Ok(())
    }
}
