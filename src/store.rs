use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use crate::aggregate::{self, KeywordCount, SentimentDistribution, TimelinePoint};
use crate::collector::RawPost;
use crate::db::{self, DbPool, NewPost, Post};
use crate::error::StoreError;
use crate::query::QueryFilter;
use crate::scoring::{Sentiment, SentimentRecord};
use crate::settings::Database;

/// A post together with its sentiment record; the unit that gets persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPost {
    pub post: RawPost,
    pub record: SentimentRecord,
}

impl ScoredPost {
    pub fn new(post: RawPost, record: SentimentRecord) -> Self {
        Self { post, record }
    }
}

impl From<&ScoredPost> for NewPost {
    fn from(scored: &ScoredPost) -> Self {
        NewPost {
            post_id: scored.post.id.clone(),
            content: scored.post.content.clone(),
            author: scored.post.author.clone(),
            created_at: scored.post.created_at.timestamp_millis(),
            keyword: scored.post.keyword.clone(),
            keyword_folded: db::fold_keyword(&scored.post.keyword),
            sentiment: scored.record.sentiment.to_string(),
            sentiment_score: scored.record.sentiment_score,
            positive_score: scored.record.positive_score,
            negative_score: scored.record.negative_score,
            neutral_score: scored.record.neutral_score,
        }
    }
}

/// A persisted row as returned by queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredPost {
    pub post_id: String,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub keyword: String,
    #[serde(flatten)]
    pub record: SentimentRecord,
    pub scraped_at: DateTime<Utc>,
}

impl TryFrom<Post> for StoredPost {
    type Error = StoreError;

    fn try_from(row: Post) -> Result<Self, Self::Error> {
        let sentiment = parse_sentiment(&row.post_id, &row.sentiment)?;
        Ok(StoredPost {
            created_at: from_millis(&row.post_id, row.created_at)?,
            scraped_at: from_millis(&row.post_id, row.scraped_at)?,
            record: SentimentRecord {
                sentiment,
                sentiment_score: row.sentiment_score,
                positive_score: row.positive_score,
                negative_score: row.negative_score,
                neutral_score: row.neutral_score,
            },
            post_id: row.post_id,
            content: row.content,
            author: row.author,
            keyword: row.keyword,
        })
    }
}

/// Column layout of the CSV export; mirrors the `posts` table.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    post_id: &'a str,
    content: &'a str,
    author: &'a str,
    created_at: String,
    keyword: &'a str,
    sentiment: &'static str,
    sentiment_score: f64,
    positive_score: f64,
    negative_score: f64,
    neutral_score: f64,
    scraped_at: String,
}

impl<'a> From<&'a StoredPost> for CsvRow<'a> {
    fn from(post: &'a StoredPost) -> Self {
        CsvRow {
            post_id: &post.post_id,
            content: &post.content,
            author: &post.author,
            created_at: post.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            keyword: &post.keyword,
            sentiment: post.record.sentiment.as_str(),
            sentiment_score: post.record.sentiment_score,
            positive_score: post.record.positive_score,
            negative_score: post.record.negative_score,
            neutral_score: post.record.neutral_score,
            scraped_at: post.scraped_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

fn from_millis(post_id: &str, millis: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| StoreError::CorruptRecord {
        id: post_id.to_string(),
        detail: format!("timestamp {millis} out of range"),
    })
}

fn parse_sentiment(post_id: &str, label: &str) -> Result<Sentiment, StoreError> {
    Sentiment::from_str(label).map_err(|_| StoreError::CorruptRecord {
        id: post_id.to_string(),
        detail: format!("unknown sentiment label {label:?}"),
    })
}

/// Persistence and aggregate views over scored posts. Every failure is
/// returned to the caller.
#[derive(Clone)]
pub struct ResultStore {
    pool: DbPool,
}

impl ResultStore {
    /// Connects and applies pending migrations.
    pub fn open(config: &Database) -> Result<Self, StoreError> {
        let pool = db::establish_pool(&config.url, config.pool_size, config.busy_timeout_ms)?;
        db::run_migrations(&mut *pool.get()?)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert-or-replace by post identity. Returns the number of rows written.
    pub fn upsert(&self, posts: &[ScoredPost]) -> Result<usize, StoreError> {
        let rows: Vec<NewPost> = posts.iter().map(NewPost::from).collect();
        let mut conn = self.pool.get()?;
        Ok(db::upsert_posts(&mut conn, &rows)?)
    }

    pub fn query(
        &self,
        filter: &QueryFilter,
        limit: Option<usize>,
    ) -> Result<Vec<StoredPost>, StoreError> {
        let mut conn = self.pool.get()?;
        let limit = limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX));
        db::get_posts(&mut conn, filter, limit)?
            .into_iter()
            .map(StoredPost::try_from)
            .collect()
    }

    pub fn distribution(&self, filter: &QueryFilter) -> Result<SentimentDistribution, StoreError> {
        let mut conn = self.pool.get()?;
        let mut distribution = SentimentDistribution::default();
        for (post_id, label) in db::get_sentiments(&mut conn, filter)? {
            distribution.add(parse_sentiment(&post_id, &label)?);
        }
        Ok(distribution)
    }

    pub fn timeline(&self, filter: &QueryFilter) -> Result<Vec<TimelinePoint>, StoreError> {
        let mut conn = self.pool.get()?;
        let rows = db::get_timeline_rows(&mut conn, filter)?
            .into_iter()
            .map(|(post_id, created_at, label, score)| {
                Ok((
                    from_millis(&post_id, created_at)?,
                    parse_sentiment(&post_id, &label)?,
                    score,
                ))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        Ok(aggregate::timeline(rows))
    }

    /// Word frequencies over all stored content.
    pub fn top_keywords(&self, limit: usize) -> Result<Vec<KeywordCount>, StoreError> {
        self.top_keywords_matching(&QueryFilter::default(), limit)
    }

    pub fn top_keywords_matching(
        &self,
        filter: &QueryFilter,
        limit: usize,
    ) -> Result<Vec<KeywordCount>, StoreError> {
        let mut conn = self.pool.get()?;
        let contents = db::get_contents(&mut conn, filter)?;
        Ok(aggregate::top_keywords(
            contents.iter().map(String::as_str),
            limit,
        ))
    }

    /// Writes every post matching `filter` to `path` as CSV and returns the
    /// number of data rows.
    pub fn export_csv(&self, path: &Path, filter: &QueryFilter) -> Result<usize, StoreError> {
        let posts = self.query(filter, None)?;

        let mut writer = csv::Writer::from_writer(File::create(path)?);
        if posts.is_empty() {
            writer.write_record(CSV_HEADER)?;
        }
        for post in &posts {
            writer.serialize(CsvRow::from(post))?;
        }
        writer.flush()?;

        Ok(posts.len())
    }

    pub fn count(&self) -> Result<i64, StoreError> {
        let mut conn = self.pool.get()?;
        Ok(db::count_posts(&mut conn)?)
    }
}

const CSV_HEADER: [&str; 11] = [
    "post_id",
    "content",
    "author",
    "created_at",
    "keyword",
    "sentiment",
    "sentiment_score",
    "positive_score",
    "negative_score",
    "neutral_score",
    "scraped_at",
];

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use diesel::RunQueryDsl;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> ResultStore {
        let config = Database {
            url: dir.path().join("test.db").to_string_lossy().into_owned(),
            pool_size: 2,
            busy_timeout_ms: 1000,
        };
        ResultStore::open(&config).unwrap()
    }

    fn scored(id: &str, keyword: &str, day: u32, content: &str, sentiment: Sentiment) -> ScoredPost {
        ScoredPost::new(
            RawPost {
                id: id.to_string(),
                content: content.to_string(),
                author: "observer".to_string(),
                created_at: Utc.with_ymd_and_hms(2024, 6, day, 12, 0, 0).unwrap(),
                keyword: keyword.to_string(),
                url: format!("https://example.com/{id}"),
                retweet_count: 0,
                like_count: 0,
            },
            SentimentRecord {
                sentiment,
                sentiment_score: 0.7,
                positive_score: 0.2,
                negative_score: 0.1,
                neutral_score: 0.7,
            },
        )
    }

    fn seed(store: &ResultStore) {
        store
            .upsert(&[
                scored("1", "State Gov", 1, "roads budget approved", Sentiment::Positive),
                scored("2", "state gov", 3, "roads still broken", Sentiment::Negative),
                scored("3", "GOVERNMENT", 5, "budget meeting today", Sentiment::Neutral),
                scored("4", "weather", 4, "sunny weather ahead", Sentiment::Positive),
                scored("5", "state gov", 7, "roads budget delayed", Sentiment::Negative),
            ])
            .unwrap();
    }

    #[test]
    fn test_upsert_replaces_same_identity() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store
            .upsert(&[scored("dup", "gov", 1, "first version", Sentiment::Positive)])
            .unwrap();
        store
            .upsert(&[scored("dup", "gov", 2, "second version", Sentiment::Negative)])
            .unwrap();

        let posts = store.query(&QueryFilter::default(), None).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].content, "second version");
        assert_eq!(posts[0].record.sentiment, Sentiment::Negative);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_upsert_empty_batch() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        assert_eq!(store.upsert(&[]).unwrap(), 0);
    }

    #[test]
    fn test_upsert_large_batch() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let batch: Vec<ScoredPost> = (0..250)
            .map(|i| scored(&format!("bulk-{i}"), "bulk", 1 + (i % 28), "bulk post", Sentiment::Neutral))
            .collect();
        store.upsert(&batch).unwrap();
        assert_eq!(store.count().unwrap(), 250);
    }

    #[test]
    fn test_query_filter_composition() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        seed(&store);

        let filter = QueryFilter::new()
            .keyword("gov")
            .start(Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap())
            .end(Utc.with_ymd_and_hms(2024, 6, 5, 12, 0, 0).unwrap());
        let posts = store.query(&filter, None).unwrap();

        let ids: Vec<&str> = posts.iter().map(|p| p.post_id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2"]);
        assert!(posts
            .iter()
            .all(|p| p.keyword.to_lowercase().contains("gov")));
    }

    #[test]
    fn test_query_newest_first_with_limit() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        seed(&store);

        let posts = store.query(&QueryFilter::default(), Some(2)).unwrap();
        let ids: Vec<&str> = posts.iter().map(|p| p.post_id.as_str()).collect();
        assert_eq!(ids, vec!["5", "3"]);

        let all = store.query(&QueryFilter::default(), None).unwrap();
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn test_keyword_wildcards_are_literal() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        seed(&store);
        let posts = store.query(&QueryFilter::new().keyword("%"), None).unwrap();
        assert!(posts.is_empty());
    }

    #[test]
    fn test_distribution_sums_to_query_count() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        seed(&store);

        let filter = QueryFilter::new().keyword("state");
        let distribution = store.distribution(&filter).unwrap();
        let matching = store.query(&filter, None).unwrap();

        assert_eq!(distribution.total() as usize, matching.len());
        assert_eq!(distribution.negative, 2);
        assert_eq!(distribution.positive, 1);
        assert_eq!(distribution.neutral, 0);
    }

    #[test]
    fn test_timeline_orders_by_date() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        seed(&store);

        let points = store.timeline(&QueryFilter::new().keyword("gov")).unwrap();
        let dates: Vec<u32> = points
            .iter()
            .map(|p| p.date.format("%d").to_string().parse().unwrap())
            .collect();
        assert_eq!(dates, vec![1, 3, 5, 7]);
        assert!(points.iter().all(|p| p.count == 1));
    }

    #[test]
    fn test_top_keywords_over_store() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        seed(&store);

        let top = store.top_keywords(3).unwrap();
        assert_eq!(top[0], KeywordCount { word: "roads".into(), frequency: 3 });
        assert_eq!(top[1], KeywordCount { word: "budget".into(), frequency: 3 });
        assert_eq!(top.len(), 3);
    }

    #[test]
    fn test_export_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        seed(&store);

        let filter = QueryFilter::new().keyword("gov");
        let path = dir.path().join("export.csv");
        let written = store.export_csv(&path, &filter).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), CSV_HEADER.to_vec());
        let rows = reader.records().count();

        assert_eq!(written, rows);
        assert_eq!(rows, store.query(&filter, None).unwrap().len());
    }

    #[test]
    fn test_export_empty_writes_header() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let path = dir.path().join("empty.csv");
        assert_eq!(store.export_csv(&path, &QueryFilter::default()).unwrap(), 0);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.headers().unwrap().len(), CSV_HEADER.len());
        assert_eq!(reader.records().count(), 0);
    }

    #[test]
    fn test_unavailable_database_is_an_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();

        let config = Database {
            url: blocker.join("test.db").to_string_lossy().into_owned(),
            pool_size: 1,
            busy_timeout_ms: 250,
        };
        assert!(matches!(
            ResultStore::open(&config),
            Err(StoreError::Pool(_))
        ));
    }

    #[test]
    fn test_corrupt_label_surfaces() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        seed(&store);

        let mut conn = store.pool.get().unwrap();
        diesel::sql_query("UPDATE posts SET sentiment = 'ecstatic' WHERE post_id = '4'")
            .execute(&mut *conn)
            .unwrap();
        drop(conn);

        assert!(matches!(
            store.query(&QueryFilter::default(), None),
            Err(StoreError::CorruptRecord { .. })
        ));
        for result in [
            store.distribution(&QueryFilter::default()).map(|_| ()),
            store.timeline(&QueryFilter::default()).map(|_| ()),
        ] {
            match result {
                Err(StoreError::CorruptRecord { id, detail }) => {
                    assert_eq!(id, "4");
                    assert!(detail.contains("ecstatic"));
                }
                other => panic!("expected corrupt record, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_out_of_range_timestamp_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        seed(&store);

        let mut conn = store.pool.get().unwrap();
        diesel::sql_query("UPDATE posts SET created_at = 9223372036854775807 WHERE post_id = '2'")
            .execute(&mut *conn)
            .unwrap();
        drop(conn);

        match store.query(&QueryFilter::default(), None) {
            Err(StoreError::CorruptRecord { id, .. }) => assert_eq!(id, "2"),
            other => panic!("expected corrupt record, got {other:?}"),
        }
    }

    #[test]
    fn test_sub_second_bounds_are_exact() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let base = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        let ms = chrono::Duration::milliseconds;
        let mut early = scored("early", "gov", 1, "early", Sentiment::Neutral);
        early.post.created_at = base + ms(500);
        let mut late = scored("late", "gov", 1, "late", Sentiment::Neutral);
        late.post.created_at = base + ms(900);
        store.upsert(&[early, late]).unwrap();

        let ids = |filter: QueryFilter| -> Vec<String> {
            store
                .query(&filter, None)
                .unwrap()
                .into_iter()
                .map(|p| p.post_id)
                .collect()
        };

        assert_eq!(ids(QueryFilter::new().start(base + ms(700))), vec!["late"]);
        assert_eq!(ids(QueryFilter::new().end(base + ms(300))), Vec::<String>::new());
        assert_eq!(ids(QueryFilter::new().end(base + ms(600))), vec!["early"]);
        assert_eq!(
            ids(QueryFilter::new().start(base + ms(500)).end(base + ms(500))),
            vec!["early"]
        );
        assert_eq!(
            ids(QueryFilter::new().start(base + chrono::Duration::microseconds(500_400))),
            vec!["late"]
        );

        let start = base + ms(450);
        let end = base + ms(950);
        let posts = store
            .query(&QueryFilter::new().start(start).end(end), None)
            .unwrap();
        assert_eq!(posts.len(), 2);
        assert!(posts.iter().all(|p| p.created_at >= start && p.created_at <= end));
        assert_eq!(posts[0].created_at, base + ms(900));
    }

    #[test]
    fn test_keyword_filter_folds_unicode_case() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store
            .upsert(&[
                scored("fr", "École Board", 2, "rentrée scolaire", Sentiment::Neutral),
                scored("en", "school board", 2, "back to school", Sentiment::Neutral),
            ])
            .unwrap();

        let posts = store.query(&QueryFilter::new().keyword("ÉCOLE"), None).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].keyword, "École Board");
        assert_eq!(store.distribution(&QueryFilter::new().keyword("BOARD")).unwrap().total(), 2);
    }
}
