use crate::error::StoreError;
use crate::query::QueryFilter;
use crate::schema::posts;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::sqlite::{Sqlite, SqliteConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use chrono::{DateTime, Utc};
use std::time::Duration;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

// Eleven bound columns per row keeps each statement under SQLite's 999
// variable limit.
const UPSERT_CHUNK: usize = 90;

#[derive(Debug, Clone, Copy)]
struct ConnectionOptions {
    busy_timeout_ms: u32,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        configure_connection(conn, self.busy_timeout_ms).map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn establish_pool(
    database_url: &str,
    max_size: u32,
    busy_timeout_ms: u32,
) -> Result<DbPool, StoreError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(max_size.max(1))
        .connection_timeout(Duration::from_millis(u64::from(busy_timeout_ms.max(250))))
        .connection_customizer(Box::new(ConnectionOptions { busy_timeout_ms }))
        .build(manager)?;
    Ok(pool)
}

pub fn configure_connection(conn: &mut SqliteConnection, busy_timeout_ms: u32) -> QueryResult<()> {
    conn.batch_execute(&format!("PRAGMA busy_timeout = {busy_timeout_ms};"))?;
    conn.batch_execute("PRAGMA journal_mode = WAL;")?;
    conn.batch_execute("PRAGMA synchronous = NORMAL;")?;
    Ok(())
}

pub fn run_migrations(conn: &mut SqliteConnection) -> Result<(), StoreError> {
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| StoreError::Migration(e.to_string()))?;
    Ok(())
}

/// Timestamps are unix milliseconds.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(Sqlite))]
pub struct Post {
    pub post_id: String,
    pub content: String,
    pub author: String,
    pub created_at: i64,
    pub keyword: String,
    pub sentiment: String,
    pub sentiment_score: f64,
    pub positive_score: f64,
    pub negative_score: f64,
    pub neutral_score: f64,
    pub scraped_at: i64,
}

/// `scraped_at` is left to the column default.
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = posts)]
pub struct NewPost {
    pub post_id: String,
    pub content: String,
    pub author: String,
    pub created_at: i64,
    pub keyword: String,
    pub keyword_folded: String,
    pub sentiment: String,
    pub sentiment_score: f64,
    pub positive_score: f64,
    pub negative_score: f64,
    pub neutral_score: f64,
}

/// Insert-or-replace by `post_id`, all chunks in one transaction.
pub fn upsert_posts(conn: &mut SqliteConnection, new_posts: &[NewPost]) -> QueryResult<usize> {
    if new_posts.is_empty() {
        return Ok(0);
    }

    conn.transaction(|conn| {
        let mut written = 0;
        for chunk in new_posts.chunks(UPSERT_CHUNK) {
            written += diesel::replace_into(posts::table)
                .values(chunk)
                .execute(conn)?;
        }
        Ok(written)
    })
}

/// Lowercases with Unicode rules; SQLite's own folding covers ASCII only.
pub fn fold_keyword(keyword: &str) -> String {
    keyword.to_lowercase()
}

fn like_pattern(keyword: &str) -> String {
    let escaped = fold_keyword(keyword)
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Case-insensitive substring match on the folded keyword. Bounds are
/// rounded inwards to whole milliseconds so every returned `created_at`
/// lies inside `[start, end]`.
fn filtered(filter: &QueryFilter) -> posts::BoxedQuery<'static, Sqlite> {
    let mut query = posts::table.into_boxed();

    if let Some(keyword) = filter.keyword.as_deref() {
        query = query.filter(posts::keyword_folded.like(like_pattern(keyword)).escape('\\'));
    }
    if let Some(start) = filter.start {
        query = query.filter(posts::created_at.ge(ceil_millis(start)));
    }
    if let Some(end) = filter.end {
        query = query.filter(posts::created_at.le(end.timestamp_millis()));
    }

    query
}

/// Newest first; ties broken by `post_id`.
pub fn get_posts(
    conn: &mut SqliteConnection,
    filter: &QueryFilter,
    limit: Option<i64>,
) -> QueryResult<Vec<Post>> {
    let mut query = filtered(filter)
        .order((posts::created_at.desc(), posts::post_id.asc()))
        .select(Post::as_select());

    if let Some(limit) = limit {
        query = query.limit(limit);
    }

    query.load(conn)
}

/// `(post_id, sentiment)` pairs.
pub fn get_sentiments(
    conn: &mut SqliteConnection,
    filter: &QueryFilter,
) -> QueryResult<Vec<(String, String)>> {
    filtered(filter)
        .select((posts::post_id, posts::sentiment))
        .load(conn)
}

/// `(post_id, created_at, sentiment, sentiment_score)`, oldest first.
pub fn get_timeline_rows(
    conn: &mut SqliteConnection,
    filter: &QueryFilter,
) -> QueryResult<Vec<(String, i64, String, f64)>> {
    filtered(filter)
        .order(posts::created_at.asc())
        .select((
            posts::post_id,
            posts::created_at,
            posts::sentiment,
            posts::sentiment_score,
        ))
        .load(conn)
}

/// Every stored content string, oldest first.
pub fn get_contents(conn: &mut SqliteConnection, filter: &QueryFilter) -> QueryResult<Vec<String>> {
    filtered(filter)
        .order((posts::created_at.asc(), posts::post_id.asc()))
        .select(posts::content)
        .load(conn)
}

pub fn count_posts(conn: &mut SqliteConnection) -> QueryResult<i64> {
    posts::table.count().get_result(conn)
}

fn ceil_millis(at: DateTime<Utc>) -> i64 {
    let millis = at.timestamp_millis();
    if at.timestamp_subsec_nanos() % 1_000_000 == 0 {
        millis
    } else {
        millis + 1
    }
}
