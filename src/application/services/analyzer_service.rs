use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    application::models::record::{
        CollectionContext, EngagerOutcome, HashtagAnalysis, SkipReason,
    },
    application::services::platform_client::PlatformClient,
    config::AnalysisConfig,
    constants::{DEFAULT_ENGAGER_LIMIT, ENGAGER_COMMENT_LIMIT, HASHTAG_COMMENT_LIMIT},
    error::{AppError, Reported, Warning},
    utils::hashtags::{extract_hashtags, rank_hashtags},
};

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub engager_limit: usize,
    /// Pause between two engagers, the hook for callers that get throttled.
    pub request_pause: Option<Duration>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            engager_limit: DEFAULT_ENGAGER_LIMIT,
            request_pause: None,
        }
    }
}

impl From<&AnalysisConfig> for AnalyzerConfig {
    fn from(cfg: &AnalysisConfig) -> Self {
        Self {
            engager_limit: cfg.engager_limit,
            request_pause: (cfg.request_pause_ms > 0)
                .then(|| Duration::from_millis(cfg.request_pause_ms)),
        }
    }
}

/// Picks the engagers to analyse: all of them up to `limit`, otherwise exactly
/// `limit` drawn without replacement.
///
/// Ids are sorted before drawing so a seeded `rng` always picks the same users.
pub fn sample_engagers<R: Rng + ?Sized>(
    engagers: &HashSet<u64>,
    limit: usize,
    rng: &mut R,
) -> Vec<u64> {
    let mut ids: Vec<u64> = engagers.iter().copied().collect();
    ids.sort_unstable();
    if ids.len() <= limit {
        return ids;
    }
    ids.choose_multiple(rng, limit).copied().collect()
}

/// Mines the hashtags used by the people who engage with a set of posts.
///
/// This is request heavy: one feed request per sampled engager plus one
/// comments request per post in that feed, all issued one after another.
pub struct HashtagAnalyzer<C: PlatformClient + ?Sized> {
    client: Arc<C>,
    config: AnalyzerConfig,
}

struct EngagerReport {
    outcome: EngagerOutcome,
    hashtags: Vec<String>,
    warnings: Vec<Warning>,
}

impl<C: PlatformClient + ?Sized> HashtagAnalyzer<C> {
    pub fn new(client: Arc<C>, config: AnalyzerConfig) -> Self {
        Self { client, config }
    }

    /// Users that liked or commented on `post_id`.
    pub async fn get_engagers(&self, post_id: &str) -> Result<HashSet<u64>, AppError> {
        let likers = self.client.fetch_media_likers(post_id).await?;
        let comments = self
            .client
            .fetch_media_comments(post_id, ENGAGER_COMMENT_LIMIT)
            .await?;

        let engagers: HashSet<u64> = likers
            .iter()
            .map(|u| u.pk)
            .chain(comments.iter().map(|c| c.user.pk))
            .collect();
        debug!("Post {} has {} distinct engagers", post_id, engagers.len());
        Ok(engagers)
    }

    /// Union of the engagers of every post. Any failure here is fatal.
    pub async fn collect_engagers(
        &self,
        post_ids: &[String],
        cancel: &CancellationToken,
    ) -> Result<HashSet<u64>, AppError> {
        let mut engagers = HashSet::new();
        for post_id in post_ids {
            if cancel.is_cancelled() {
                return Err(AppError::Cancelled);
            }
            engagers.extend(self.get_engagers(post_id).await?);
        }
        Ok(engagers)
    }

    /// Hashtags written in the comment section of `post_id`.
    pub async fn get_comment_hashtags(&self, post_id: &str) -> Result<Vec<String>, AppError> {
        let comments = self
            .client
            .fetch_media_comments(post_id, HASHTAG_COMMENT_LIMIT)
            .await?;
        Ok(comments
            .iter()
            .flat_map(|c| extract_hashtags(&c.text))
            .collect())
    }

    /// Hashtags of the caption and the comment section of a single post.
    ///
    /// Goes through the media info endpoint, which throttles quickly; the
    /// analysis itself never calls it.
    pub async fn get_hashtags(&self, post_id: &str) -> Result<Vec<String>, AppError> {
        let post = self.client.fetch_media_info(post_id).await?;
        let mut hashtags = post.caption_text().map(extract_hashtags).unwrap_or_default();
        hashtags.extend(self.get_comment_hashtags(post_id).await?);
        Ok(hashtags)
    }

    /// Ranks the hashtags used by the engagers of `post_ids`.
    ///
    /// Engagers whose feed cannot be read and posts whose comments cannot be
    /// read are counted and skipped. Posts without a caption only contribute
    /// their comments; they do not make the engager count as inaccessible.
    ///
    /// Cancelling stops the walk over engagers and returns what was gathered
    /// so far. The engager being mined when the token fires and every engager
    /// after it are recorded as `SkipReason::Cancelled`, and their partial
    /// hashtags are discarded.
    #[instrument(skip(self, rng, cancel))]
    pub async fn analyze<R: Rng + ?Sized>(
        &self,
        post_ids: &[String],
        rng: &mut R,
        cancel: &CancellationToken,
    ) -> Result<Reported<HashtagAnalysis>, AppError> {
        let engagers = self.collect_engagers(post_ids, cancel).await?;
        let engagers_total = engagers.len();

        if engagers_total > self.config.engager_limit {
            info!(
                "Engager limit reached, using random sample of {} engagers",
                self.config.engager_limit
            );
        }
        let sampled = sample_engagers(&engagers, self.config.engager_limit, rng);
        info!("Total engagers used {}", sampled.len());

        let mut analysis = HashtagAnalysis {
            engagers_total,
            engagers_used: sampled.len(),
            ..HashtagAnalysis::default()
        };
        let mut warnings = Vec::new();

        for (i, user_id) in sampled.iter().copied().enumerate() {
            if cancel.is_cancelled() {
                warn!("Analysis cancelled, {} engagers left", sampled.len() - i);
                analysis
                    .outcomes
                    .extend(sampled[i..].iter().map(|&user_id| EngagerOutcome::Skipped {
                        user_id,
                        reason: SkipReason::Cancelled,
                    }));
                break;
            }
            if i > 0 {
                if let Some(pause) = self.config.request_pause {
                    tokio::time::sleep(pause).await;
                }
            }

            let report = self.analyze_engager(user_id, cancel).await;
            match &report.outcome {
                EngagerOutcome::Success {
                    failed_comment_fetches,
                    ..
                } => analysis.failed_comment_fetches += failed_comment_fetches,
                EngagerOutcome::Skipped {
                    reason: SkipReason::Inaccessible(_),
                    ..
                } => analysis.inaccessible_engagers += 1,
                EngagerOutcome::Skipped {
                    reason: SkipReason::Cancelled,
                    ..
                } => {}
            }
            analysis.hashtags.extend(report.hashtags);
            analysis.outcomes.push(report.outcome);
            warnings.extend(report.warnings);
        }

        analysis.ranked = rank_hashtags(&analysis.hashtags);

        info!("Private users: {}", analysis.inaccessible_engagers);
        info!("Failed count: {}", analysis.failed_comment_fetches);

        Ok(Reported::with_warnings(analysis, warnings))
    }

    /// Runs `analyze` on the `n` most engaged posts of a collection.
    pub async fn analyze_top_posts<R: Rng + ?Sized>(
        &self,
        ctx: &CollectionContext,
        n: usize,
        rng: &mut R,
        cancel: &CancellationToken,
    ) -> Result<Reported<HashtagAnalysis>, AppError> {
        self.analyze(&ctx.top_post_ids(n), rng, cancel).await
    }

    async fn analyze_engager(&self, user_id: u64, cancel: &CancellationToken) -> EngagerReport {
        let feed = match self.client.fetch_user_feed(user_id, None, None).await {
            Ok(feed) => feed,
            Err(e) => {
                debug!("Skipping engager {}: {}", user_id, e);
                let reason = e.to_string();
                return EngagerReport {
                    outcome: EngagerOutcome::Skipped {
                        user_id,
                        reason: SkipReason::Inaccessible(reason.clone()),
                    },
                    hashtags: Vec::new(),
                    warnings: vec![Warning::EngagerInaccessible { user_id, reason }],
                };
            }
        };

        // posts without a caption contribute nothing
        let mut hashtags: Vec<String> = feed
            .items
            .iter()
            .filter_map(|post| post.caption_text())
            .flat_map(extract_hashtags)
            .collect();

        let mut warnings = Vec::new();
        let mut failed_comment_fetches = 0;
        for post in &feed.items {
            if cancel.is_cancelled() {
                debug!("Engager {} cancelled before post {}", user_id, post.id);
                return EngagerReport {
                    outcome: EngagerOutcome::Skipped {
                        user_id,
                        reason: SkipReason::Cancelled,
                    },
                    hashtags: Vec::new(),
                    warnings: Vec::new(),
                };
            }
            match self.get_comment_hashtags(&post.id).await {
                Ok(tags) => hashtags.extend(tags),
                Err(e) => {
                    debug!("Comments of post {} unavailable: {}", post.id, e);
                    failed_comment_fetches += 1;
                    warnings.push(Warning::CommentFetchFailed {
                        post_id: post.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        EngagerReport {
            outcome: EngagerOutcome::Success {
                user_id,
                hashtags: hashtags.len(),
                failed_comment_fetches,
            },
            hashtags,
            warnings,
        }
    }
}
