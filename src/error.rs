use thiserror::Error;

/// Failures of the persistence layer. These always reach the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database unavailable: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("database query failed: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("database migration failed: {0}")]
    Migration(String),
    #[error("stored post {id} is corrupt: {detail}")]
    CorruptRecord { id: String, detail: String },
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("export file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Malformed filter input supplied by a caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("invalid date {input:?}: expected RFC 3339, YYYY-MM-DDTHH:MM:SS or YYYY-MM-DD")]
    InvalidDate { input: String },
}

/// Internal scoring failures. The orchestrator swallows these into the
/// neutral-default record after logging them.
#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("classifier worker is not running")]
    WorkerGone,
    #[error("classifier returned no prediction")]
    NoPrediction,
    #[error("classifier returned unknown label {0:?}")]
    UnknownLabel(String),
    #[error("strategy produced a non-finite score")]
    NonFinite,
}
