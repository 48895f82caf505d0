use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Deserialize;
use tracing::info;

use super::{PostSource, RawPost};
use crate::settings::Collector;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    posts: Vec<SearchPost>,
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchPost {
    uri: String,
    author: SearchAuthor,
    record: SearchRecord,
    indexed_at: String,
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    repost_count: u64,
}

#[derive(Debug, Deserialize)]
struct SearchAuthor {
    handle: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchRecord {
    #[serde(default)]
    text: String,
    created_at: Option<String>,
}

/// Keyword search over the public `app.bsky.feed.searchPosts` endpoint.
pub struct BlueskySearch {
    client: reqwest::Client,
    api_base: String,
    page_size: usize,
}

impl BlueskySearch {
    pub fn new(config: &Collector) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            page_size: config.page_size.clamp(1, 100),
        }
    }

    fn search_url(&self, keyword: &str, limit: usize, since: &str, cursor: Option<&str>) -> String {
        let mut url = format!(
            "{}/app.bsky.feed.searchPosts?q={}&limit={}&sort=latest&since={}",
            self.api_base,
            urlencoding::encode(keyword),
            limit,
            urlencoding::encode(since),
        );
        if let Some(cursor) = cursor {
            url.push_str("&cursor=");
            url.push_str(&urlencoding::encode(cursor));
        }
        url
    }

    async fn fetch_page(&self, url: &str) -> Result<SearchResponse> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("search request failed")?;

        if !response.status().is_success() {
            bail!("search API error: {}", response.status());
        }

        response
            .json()
            .await
            .context("failed to parse search response")
    }
}

fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `at://did/app.bsky.feed.post/rkey` → `https://bsky.app/profile/handle/post/rkey`
fn web_url(uri: &str, handle: &str) -> String {
    match uri.rsplit_once('/') {
        Some((_, rkey)) => format!("https://bsky.app/profile/{handle}/post/{rkey}"),
        None => uri.to_string(),
    }
}

fn to_raw_post(post: SearchPost, keyword: &str) -> RawPost {
    let created_at = post
        .record
        .created_at
        .as_deref()
        .and_then(parse_time)
        .or_else(|| parse_time(&post.indexed_at))
        .unwrap_or_else(Utc::now);

    RawPost {
        url: web_url(&post.uri, &post.author.handle),
        id: post.uri,
        content: post.record.text,
        author: post.author.handle,
        created_at,
        keyword: keyword.to_string(),
        retweet_count: post.repost_count,
        like_count: post.like_count,
    }
}

#[async_trait]
impl PostSource for BlueskySearch {
    async fn search(&self, keyword: &str, max_count: usize, days_back: i64) -> Result<Vec<RawPost>> {
        let since = (Utc::now() - Duration::days(days_back.max(0)))
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut posts: Vec<RawPost> = Vec::new();
        let mut cursor: Option<String> = None;

        while posts.len() < max_count {
            let limit = self.page_size.min(max_count - posts.len());
            let url = self.search_url(keyword, limit, &since, cursor.as_deref());
            let page = self.fetch_page(&url).await?;

            let fetched = page.posts.len();
            posts.extend(page.posts.into_iter().map(|p| to_raw_post(p, keyword)));
            info!(keyword, fetched, total = posts.len(), "fetched search page");

            match page.cursor {
                Some(next) if fetched > 0 => cursor = Some(next),
                _ => break,
            }
        }

        posts.truncate(max_count);
        Ok(posts)
    }

    fn name(&self) -> &str {
        "bluesky"
    }
}
