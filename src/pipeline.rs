use serde::Serialize;
use tracing::info;

use crate::aggregate::SentimentDistribution;
use crate::collector::{Collection, PostOrigin};
use crate::error::StoreError;
use crate::scoring::SentimentScorer;
use crate::store::{ResultStore, ScoredPost};

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub keyword: String,
    pub origin: PostOrigin,
    pub stored: usize,
    /// Labels of this batch only, not of the whole store.
    pub distribution: SentimentDistribution,
}

/// Scores every collected post and persists the batch in one upsert.
pub fn ingest(
    scorer: &SentimentScorer,
    store: &ResultStore,
    collection: Collection,
) -> Result<IngestReport, StoreError> {
    let texts: Vec<&str> = collection.posts.iter().map(|p| p.content.as_str()).collect();
    let records = scorer.score_batch(&texts);

    let distribution = SentimentDistribution::from_labels(records.iter().map(|r| r.sentiment));
    let scored: Vec<ScoredPost> = collection
        .posts
        .into_iter()
        .zip(records)
        .map(|(post, record)| ScoredPost::new(post, record))
        .collect();

    let stored = store.upsert(&scored)?;
    info!(
        keyword = %collection.keyword,
        origin = %collection.origin,
        strategy = %scorer.kind(),
        stored,
        "ingested batch"
    );

    Ok(IngestReport {
        keyword: collection.keyword,
        origin: collection.origin,
        stored,
        distribution,
    })
}
