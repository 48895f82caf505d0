use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::scoring::Sentiment;

pub const STOP_WORDS: &[&str] = &[
    "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "a", "an", "is",
    "are", "was", "were", "be", "been", "have", "has", "had", "do", "does", "did", "will", "would",
    "could", "should", "may", "might", "must", "can", "rt", "https", "http",
];

/// Tokens with this many characters or fewer are never keywords.
pub const MAX_SHORT_TOKEN_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentDistribution {
    pub positive: u64,
    pub negative: u64,
    pub neutral: u64,
}

impl SentimentDistribution {
    pub fn from_labels(labels: impl IntoIterator<Item = Sentiment>) -> Self {
        let mut distribution = Self::default();
        for label in labels {
            distribution.add(label);
        }
        distribution
    }

    pub fn add(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Negative => self.negative += 1,
            Sentiment::Neutral => self.neutral += 1,
        }
    }

    pub fn get(&self, sentiment: Sentiment) -> u64 {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Negative => self.negative,
            Sentiment::Neutral => self.neutral,
        }
    }

    pub fn total(&self) -> u64 {
        self.positive + self.negative + self.neutral
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub sentiment: Sentiment,
    pub count: u64,
    pub avg_score: f64,
}

/// Groups by UTC calendar day and sentiment. Days ascend; within a day
/// labels sort alphabetically.
pub fn timeline(
    rows: impl IntoIterator<Item = (DateTime<Utc>, Sentiment, f64)>,
) -> Vec<TimelinePoint> {
    let mut buckets: BTreeMap<(NaiveDate, &'static str), (Sentiment, u64, f64)> = BTreeMap::new();

    for (created_at, sentiment, score) in rows {
        let bucket = buckets
            .entry((created_at.date_naive(), sentiment.as_str()))
            .or_insert((sentiment, 0, 0.0));
        bucket.1 += 1;
        bucket.2 += score;
    }

    buckets
        .into_iter()
        .map(|((date, _), (sentiment, count, sum))| TimelinePoint {
            date,
            sentiment,
            count,
            avg_score: sum / count as f64,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCount {
    pub word: String,
    pub frequency: u64,
}

pub fn is_keyword_token(token: &str) -> bool {
    token.chars().count() > MAX_SHORT_TOKEN_CHARS
        && token.chars().all(char::is_alphabetic)
        && !STOP_WORDS.contains(&token)
}

/// Most frequent whitespace-separated tokens across `contents`, highest
/// first. Equal frequencies keep first-encounter order.
pub fn top_keywords<'a>(contents: impl IntoIterator<Item = &'a str>, limit: usize) -> Vec<KeywordCount> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<KeywordCount> = Vec::new();

    for content in contents {
        for token in content.to_lowercase().split_whitespace() {
            if !is_keyword_token(token) {
                continue;
            }
            match index.get(token) {
                Some(&i) => counts[i].frequency += 1,
                None => {
                    index.insert(token.to_string(), counts.len());
                    counts.push(KeywordCount {
                        word: token.to_string(),
                        frequency: 1,
                    });
                }
            }
        }
    }

    counts.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    counts.truncate(limit);
    counts
}
