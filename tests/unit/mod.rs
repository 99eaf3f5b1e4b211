use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use insta_analytics::application::models::post::{
    Caption, Comment, FeedPage, ImageCandidate, ImageVersions, Post, User, UserProfile,
};
use insta_analytics::application::services::analyzer_service::{AnalyzerConfig, HashtagAnalyzer};
use insta_analytics::application::services::download_service::PhotoDownloader;
use insta_analytics::application::services::feed_service::FeedService;
use insta_analytics::application::services::platform_client::PlatformClient;
use insta_analytics::error::{AppError, Warning};
use insta_analytics::storage::utils::export_records_csv;
use insta_analytics::utils::hashtags::build_weighted_text;
use insta_analytics::utils::logger::setup_logger;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

const OWNER: u64 = 42;

fn start_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
}

fn post(id: &str, taken_at: DateTime<Utc>, likes: u64, comments: u64, caption: Option<&str>) -> Post {
    Post {
        id: id.to_string(),
        taken_at: taken_at.timestamp(),
        like_count: likes,
        comment_count: comments,
        caption: caption.map(|text| Caption {
            text: text.to_string(),
        }),
        carousel_media: None,
        image_versions2: Some(ImageVersions {
            candidates: vec![ImageCandidate {
                url: format!("https://cdn.test/{id}.jpg"),
                width: None,
                height: None,
            }],
        }),
    }
}

fn user(pk: u64) -> User {
    User {
        pk,
        username: format!("user{pk}"),
        is_private: false,
    }
}

/// In-memory platform that records every feed request it serves.
#[derive(Default)]
struct FakePlatform {
    /// Owner feed pages keyed by the `max_id` they answer.
    owner_pages: HashMap<Option<String>, FeedPage>,
    engager_feeds: HashMap<u64, FeedPage>,
    likers: HashMap<String, Vec<User>>,
    comments: HashMap<String, Vec<Comment>>,
    feed_requests: Mutex<Vec<(u64, Option<String>)>>,
}

impl FakePlatform {
    fn feed_requests(&self) -> Vec<(u64, Option<String>)> {
        self.feed_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlatformClient for FakePlatform {
    async fn fetch_user_feed(
        &self,
        user_id: u64,
        max_id: Option<String>,
        _min_timestamp: Option<i64>,
    ) -> Result<FeedPage, AppError> {
        self.feed_requests.lock().unwrap().push((user_id, max_id.clone()));
        if user_id == OWNER {
            return Ok(self.owner_pages.get(&max_id).cloned().unwrap_or_default());
        }
        self.engager_feeds
            .get(&user_id)
            .cloned()
            .ok_or(AppError::Unauthorized)
    }

    async fn fetch_user_info(&self, user_id: u64) -> Result<UserProfile, AppError> {
        Ok(UserProfile {
            pk: user_id,
            username: "owner".to_string(),
            full_name: None,
            follower_count: 1_000,
            following_count: 10,
            media_count: 45,
            is_private: false,
        })
    }

    async fn fetch_user_by_username(&self, username: &str) -> Result<UserProfile, AppError> {
        let mut profile = self.fetch_user_info(OWNER).await?;
        profile.username = username.to_string();
        Ok(profile)
    }

    async fn fetch_media_likers(&self, post_id: &str) -> Result<Vec<User>, AppError> {
        Ok(self.likers.get(post_id).cloned().unwrap_or_default())
    }

    async fn fetch_media_comments(&self, post_id: &str, limit: usize) -> Result<Vec<Comment>, AppError> {
        let mut comments = self.comments.get(post_id).cloned().unwrap_or_default();
        comments.truncate(limit);
        Ok(comments)
    }

    async fn fetch_media_info(&self, _post_id: &str) -> Result<Post, AppError> {
        Err(AppError::NotFound)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, AppError> {
        Ok(url.as_bytes().to_vec())
    }
}

/// Three owner pages of 20, 20 and 5 posts, one post per day going back from
/// 2023-03-01; the last page crosses the start date.
fn three_page_platform() -> FakePlatform {
    let newest = Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap();
    let mut posts: Vec<Post> = (0..44)
        .map(|i| {
            post(
                &format!("{}_{OWNER}", 1000 - i),
                newest - Duration::days(i),
                i as u64,
                1,
                Some("daily #post"),
            )
        })
        .collect();
    posts.push(post("1_42", start_date() - Duration::days(3), 0, 0, None));

    let mut platform = FakePlatform::default();
    let mut max_id = None;
    for chunk in posts.chunks(20) {
        platform.owner_pages.insert(
            max_id.clone(),
            FeedPage {
                items: chunk.to_vec(),
                num_results: chunk.len(),
                more_available: true,
                next_max_id: None,
            },
        );
        max_id = chunk.last().map(|p| p.id.clone());
    }
    platform
}

#[tokio::test]
async fn test_three_pages_collect_45_posts_in_3_fetches() {
    setup_logger();
    let platform = Arc::new(three_page_platform());
    let service = FeedService::new(platform.clone());

    let reported = service
        .collect_user_posts("owner", start_date(), &CancellationToken::new())
        .await
        .unwrap();
    let ctx = reported.value;

    assert_eq!(ctx.records.len(), 45);
    assert_eq!(ctx.post_dict.len(), 45);
    assert_eq!(ctx.fetches, 3);
    assert_eq!(platform.feed_requests().len(), 3);
    assert!(reported.warnings.is_empty());

    assert_eq!(ctx.user_id, OWNER);
    assert_eq!(ctx.follower_count, 1_000);
    assert_eq!(ctx.records[0].engagements, 1);
    assert_eq!(ctx.records[43].engagements, 44);
    assert_eq!(ctx.records[43].engagement_rate, Some(4.4));
    assert_eq!(ctx.records[44].caption_length, None);
    assert_eq!(ctx.ranked_post_ids[0], "957_42");
}

#[tokio::test]
async fn test_collection_feeds_analysis_and_outputs() {
    let mut platform = three_page_platform();
    let top = "957_42".to_string();
    platform.likers.insert(top.clone(), vec![user(100), user(101)]);
    platform.comments.insert(
        top.clone(),
        vec![Comment {
            text: "great".to_string(),
            user: user(102),
            created_at: 0,
        }],
    );
    platform.engager_feeds.insert(
        100,
        FeedPage {
            items: vec![post("e1", start_date(), 0, 0, Some("#a #b"))],
            ..FeedPage::default()
        },
    );
    platform.engager_feeds.insert(
        102,
        FeedPage {
            items: vec![post("e2", start_date(), 0, 0, None)],
            ..FeedPage::default()
        },
    );
    platform.comments.insert(
        "e1".to_string(),
        vec![Comment {
            text: "so #a".to_string(),
            user: user(103),
            created_at: 0,
        }],
    );
    let platform = Arc::new(platform);
    let cancel = CancellationToken::new();

    let ctx = FeedService::new(platform.clone())
        .collect_user_posts("owner", start_date(), &cancel)
        .await
        .unwrap()
        .into_inner();

    let analyzer = HashtagAnalyzer::new(platform.clone(), AnalyzerConfig::default());
    let reported = analyzer
        .analyze_top_posts(&ctx, 1, &mut StdRng::seed_from_u64(40), &cancel)
        .await
        .unwrap();
    let analysis = &reported.value;

    assert_eq!(analysis.engagers_total, 3);
    assert_eq!(analysis.inaccessible_engagers, 1);
    assert_eq!(analysis.failed_comment_fetches, 0);
    assert_eq!(analysis.hashtags, vec!["#a", "#b", "#a"]);
    assert!(reported.warnings.contains(&Warning::EngagerInaccessible {
        user_id: 101,
        reason: "unauthorized".to_string()
    }));

    let text = build_weighted_text(&analysis.ranked, 5);
    assert_eq!(text.value, "#a #a #b");
    assert_eq!(
        text.warnings,
        vec![Warning::TopNClamped {
            requested: 5,
            available: 2
        }]
    );

    let dir = tempfile::tempdir().unwrap();
    let rows = export_records_csv(&dir.path().join("owner.csv"), &ctx.records).unwrap();
    assert_eq!(rows, 45);

    let photos = PhotoDownloader::new(platform, dir.path())
        .download_top_posts(&ctx, 2)
        .await
        .unwrap();
    assert_eq!(
        photos,
        vec![
            dir.path().join("owner").join("957_42_0.jpg"),
            dir.path().join("owner").join("958_42_0.jpg"),
        ]
    );
}

#[tokio::test]
async fn test_cancelled_collection_stops_before_any_request() {
    let platform = Arc::new(three_page_platform());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = FeedService::new(platform.clone())
        .collect_user_posts("owner", start_date(), &cancel)
        .await;

    assert!(matches!(result, Err(AppError::Cancelled)));
    assert!(platform.feed_requests().is_empty());
}
