use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::FilterError;

/// Optional `(keyword, start, end)` filter shared by every store query.
/// All present conditions must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilter {
    /// Case-insensitive substring of the stored keyword (Unicode lowercase on
    /// both sides).
    pub keyword: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub end: Option<DateTime<Utc>>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        let keyword = keyword.into();
        self.keyword = (!keyword.is_empty()).then_some(keyword);
        self
    }

    pub fn start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    /// Builds a filter from raw caller strings. Empty strings count as absent.
    pub fn parse(
        keyword: Option<&str>,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Self, FilterError> {
        fn present(s: Option<&str>) -> Option<&str> {
            s.map(str::trim).filter(|s| !s.is_empty())
        }

        Ok(Self {
            keyword: present(keyword).map(str::to_string),
            start: present(start).map(parse_timestamp).transpose()?,
            end: present(end).map(parse_timestamp).transpose()?,
        })
    }
}

/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.f]` (read as UTC) or a
/// bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, FilterError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(FilterError::InvalidDate {
        input: input.to_string(),
    })
}
