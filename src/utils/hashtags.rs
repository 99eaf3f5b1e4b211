// src/utils/hashtags.rs
//
// Hashtag extraction, ranking and the weighted text fed to the word cloud

use std::collections::HashMap;
use tracing::warn;

use crate::application::models::record::HashtagCount;
use crate::error::{Reported, Warning};

/// Returns the whitespace separated tokens of `text` that start with `#`.
///
/// Tags glued together without a separator, like `#one#two`, come back as a
/// single token.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|word| word.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Groups hashtags and counts them, most frequent first.
///
/// Equal counts keep the order in which the hashtag was first seen.
pub fn rank_hashtags<S: AsRef<str>>(hashtags: &[S]) -> Vec<HashtagCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut ranked: Vec<HashtagCount> = Vec::new();

    for hashtag in hashtags {
        let hashtag = hashtag.as_ref();
        match index.get(hashtag) {
            Some(&i) => ranked[i].count += 1,
            None => {
                index.insert(hashtag, ranked.len());
                ranked.push(HashtagCount::new(hashtag, 1));
            }
        }
    }

    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}

/// Builds the "bag of words" text for the renderer: each of the first `top_n`
/// rows contributes its hashtag `count` times, single space separated, in
/// table order.
pub fn build_weighted_text(ranked: &[HashtagCount], top_n: usize) -> Reported<String> {
    let mut warnings = Vec::new();
    let mut n = top_n;
    if n > ranked.len() {
        warn!(
            "{} is larger than the table length {}, setting n = {}",
            n,
            ranked.len(),
            ranked.len()
        );
        warnings.push(Warning::TopNClamped {
            requested: n,
            available: ranked.len(),
        });
        n = ranked.len();
    }

    let text = ranked[..n]
        .iter()
        .flat_map(|row| std::iter::repeat(row.hashtag.as_str()).take(row.count))
        .collect::<Vec<_>>()
        .join(" ");

    Reported::with_warnings(text, warnings)
}
