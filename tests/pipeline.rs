use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use sentiment_feed::collector::{collect, PostOrigin, PostSource, RawPost};
use sentiment_feed::pipeline::ingest;
use sentiment_feed::query::QueryFilter;
use sentiment_feed::scoring::{KeywordCounter, Sentiment, SentimentScorer, Strategy};
use sentiment_feed::settings::Database;
use sentiment_feed::store::ResultStore;
use tempfile::TempDir;

struct FixedSource(Vec<RawPost>);

#[async_trait]
impl PostSource for FixedSource {
    async fn search(&self, keyword: &str, max_count: usize, _days_back: i64) -> Result<Vec<RawPost>> {
        Ok(self
            .0
            .iter()
            .filter(|p| p.keyword == keyword)
            .take(max_count)
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

fn post(id: &str, keyword: &str, hours_after: i64, content: &str) -> RawPost {
    let base = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
    RawPost {
        id: id.to_string(),
        content: content.to_string(),
        author: "resident".to_string(),
        created_at: base + Duration::hours(hours_after),
        keyword: keyword.to_string(),
        url: format!("https://example.com/{id}"),
        retweet_count: 1,
        like_count: 2,
    }
}

fn fixture() -> FixedSource {
    FixedSource(vec![
        post("p1", "city council", 0, "Excellent budget session, great transparency"),
        post("p2", "city council", 2, "Council meeting was awful, transit problem ignored"),
        post("p3", "city council", 26, "Transit budget vote scheduled for Tuesday"),
        post("p4", "city council", 30, "Proud of the transit expansion, thanks council"),
        post("p5", "school board", 3, "Board budget hearing tonight"),
    ])
}

fn open_store(dir: &TempDir) -> ResultStore {
    ResultStore::open(&Database {
        url: dir.path().join("pipeline.db").to_string_lossy().into_owned(),
        pool_size: 2,
        busy_timeout_ms: 1000,
    })
    .unwrap()
}

#[tokio::test]
async fn test_collect_score_store_and_query() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let scorer = SentimentScorer::with_strategy(Strategy::RuleBased(KeywordCounter));
    let source = fixture();

    let council = collect(&source, "city council", 100, 7).await;
    assert_eq!(council.origin, PostOrigin::Source);
    let report = ingest(&scorer, &store, council).unwrap();
    assert_eq!(report.stored, 4);

    let board = collect(&source, "school board", 100, 7).await;
    ingest(&scorer, &store, board).unwrap();

    let all = QueryFilter::default();
    assert_eq!(store.query(&all, None).unwrap().len(), 5);

    let council_only = QueryFilter::new().keyword("COUNCIL");
    let distribution = store.distribution(&council_only).unwrap();
    assert_eq!(distribution.total(), 4);
    assert_eq!(distribution.get(Sentiment::Positive), 2);
    assert_eq!(distribution.get(Sentiment::Negative), 1);
    assert_eq!(distribution.get(Sentiment::Neutral), 1);

    let timeline = store.timeline(&council_only).unwrap();
    let per_day: u64 = timeline.iter().map(|p| p.count).sum();
    assert_eq!(per_day, 4);
    assert!(timeline.windows(2).all(|w| w[0].date <= w[1].date));

    let top = store.top_keywords(3).unwrap();
    assert_eq!(top[0].word, "budget");
    assert_eq!(top[0].frequency, 3);
    assert_eq!(top[1].word, "transit");
    assert_eq!(top[1].frequency, 3);

    let export = dir.path().join("council.csv");
    let rows = store.export_csv(&export, &council_only).unwrap();
    assert_eq!(rows, 4);
    assert_eq!(csv::Reader::from_path(&export).unwrap().records().count(), 4);
}

#[tokio::test]
async fn test_reingesting_replaces_rather_than_duplicates() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let scorer = SentimentScorer::with_strategy(Strategy::RuleBased(KeywordCounter));
    let source = fixture();

    for _ in 0..3 {
        let collection = collect(&source, "city council", 100, 7).await;
        ingest(&scorer, &store, collection).unwrap();
    }

    assert_eq!(store.count().unwrap(), 4);
}

#[tokio::test]
async fn test_unknown_keyword_substitutes_sample_posts() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let scorer = SentimentScorer::with_strategy(Strategy::RuleBased(KeywordCounter));

    let collection = collect(&fixture(), "harbor authority", 20, 7).await;
    assert_eq!(collection.origin, PostOrigin::SampleNoResults);

    let report = ingest(&scorer, &store, collection).unwrap();
    assert_eq!(report.stored, 20);
    assert_eq!(report.distribution.total(), 20);

    let stored = store
        .query(&QueryFilter::new().keyword("harbor"), None)
        .unwrap();
    assert_eq!(stored.len(), 20);
    assert!(stored.iter().all(|p| p.post_id.starts_with("sample_")));
}
