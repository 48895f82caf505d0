pub mod bluesky;
pub mod sample;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::{info, warn};

pub use bluesky::BlueskySearch;

/// One collected post, before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPost {
    pub id: String,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    /// The search keyword the post was collected under.
    pub keyword: String,
    pub url: String,
    pub retweet_count: u64,
    pub like_count: u64,
}

/// Producer of raw posts. May return fewer than `max_count`; an empty
/// result is not an error.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn search(&self, keyword: &str, max_count: usize, days_back: i64) -> Result<Vec<RawPost>>;
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostOrigin {
    #[strum(serialize = "source")]
    Source,
    /// The source answered but had nothing for the keyword.
    #[strum(serialize = "sample (no results for keyword)")]
    SampleNoResults,
    #[strum(serialize = "sample (source failed)")]
    SampleSourceFailed,
}

impl PostOrigin {
    pub fn is_sample(&self) -> bool {
        !matches!(self, PostOrigin::Source)
    }
}

#[derive(Debug, Clone)]
pub struct Collection {
    pub keyword: String,
    pub posts: Vec<RawPost>,
    pub origin: PostOrigin,
}

/// Asks `source` for posts and substitutes generated sample posts when it
/// returns nothing or fails.
pub async fn collect(
    source: &dyn PostSource,
    keyword: &str,
    max_count: usize,
    days_back: i64,
) -> Collection {
    let (posts, origin) = match source.search(keyword, max_count, days_back).await {
        Ok(posts) if !posts.is_empty() => (posts, PostOrigin::Source),
        Ok(_) => {
            info!(source = source.name(), keyword, "no results for keyword, using sample posts");
            (sample::generate(keyword, max_count, Utc::now()), PostOrigin::SampleNoResults)
        }
        Err(e) => {
            warn!(source = source.name(), keyword, error = %e, "collection failed, using sample posts");
            (sample::generate(keyword, max_count, Utc::now()), PostOrigin::SampleSourceFailed)
        }
    };

    Collection {
        keyword: keyword.to_string(),
        posts,
        origin,
    }
}
