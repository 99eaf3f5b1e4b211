// src/utils/engagement.rs
//
// Per-post metrics derived from the raw feed

use crate::application::models::post::Post;
use crate::application::models::record::PostRecord;
use crate::error::{MetricError, Reported, Warning};
use tracing::warn;

/// Flatten a post into a table row and derive the caption metrics.
///
/// Caption derived fields stay `None` when the caption is missing, they are
/// never reported as zero.
pub fn to_record(post: &Post) -> PostRecord {
    let caption = post.caption_text().map(str::to_string);
    let caption_length = caption
        .as_deref()
        .map(|text| text.replace("\n\n", " ").chars().count());
    let caption_word_count = caption
        .as_deref()
        .map(|text| text.split_whitespace().count());

    PostRecord {
        id: post.id.clone(),
        taken_at: post.taken_at_datetime(),
        like_count: post.like_count,
        comment_count: post.comment_count,
        caption,
        caption_length,
        caption_word_count,
        engagements: post.like_count + post.comment_count,
        engagement_rate: None,
    }
}

/// Calculate the engagement rate as a percentage of followers
///
/// # Arguments
///
/// * `engagements` - Likes plus comments of a post
/// * `follower_count` - Followers of the author when the collection started
///
/// # Returns
///
/// * `Result<f64, MetricError>` - `100 * engagements / follower_count` rounded to
///   two decimals (ties to even), or `MetricError::ZeroFollowers`
pub fn engagement_rate(engagements: u64, follower_count: u64) -> Result<f64, MetricError> {
    if follower_count == 0 {
        return Err(MetricError::ZeroFollowers);
    }
    let rate = 100.0 * engagements as f64 / follower_count as f64;
    Ok((rate * 100.0).round_ties_even() / 100.0)
}

/// Fill `engagements` and `engagement_rate` for every record.
///
/// With a zero follower count the rates stay undefined and a single
/// `Warning::ZeroFollowers` is reported.
pub fn with_engagement(
    records: Vec<PostRecord>,
    follower_count: u64,
    user_id: u64,
) -> Reported<Vec<PostRecord>> {
    let mut warnings = Vec::new();
    if follower_count == 0 {
        warn!("User {} has no followers, engagement rate is undefined", user_id);
        warnings.push(Warning::ZeroFollowers { user_id });
    }

    let records = records
        .into_iter()
        .map(|mut record| {
            record.engagements = record.like_count + record.comment_count;
            record.engagement_rate = engagement_rate(record.engagements, follower_count).ok();
            record
        })
        .collect();

    Reported::with_warnings(records, warnings)
}

/// Post ids ordered by engagements, highest first. Ties keep fetch order.
pub fn rank_by_engagements(records: &[PostRecord]) -> Vec<String> {
    let mut ranked: Vec<&PostRecord> = records.iter().collect();
    ranked.sort_by(|a, b| b.engagements.cmp(&a.engagements));
    ranked.into_iter().map(|r| r.id.clone()).collect()
}
