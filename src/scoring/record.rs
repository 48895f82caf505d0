use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::ScoringError;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Uniform output of every scoring strategy.
///
/// `sentiment_score` is the confidence of the winning class. The three
/// per-class scores are whatever the strategy reports and are not required
/// to sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentRecord {
    pub sentiment: Sentiment,
    pub sentiment_score: f64,
    pub positive_score: f64,
    pub negative_score: f64,
    pub neutral_score: f64,
}

impl SentimentRecord {
    /// Returned for degenerate input and for any failed scoring attempt.
    pub const NEUTRAL_DEFAULT: SentimentRecord = SentimentRecord {
        sentiment: Sentiment::Neutral,
        sentiment_score: 0.5,
        positive_score: 0.33,
        negative_score: 0.33,
        neutral_score: 0.34,
    };

    pub fn neutral_default() -> Self {
        Self::NEUTRAL_DEFAULT
    }

    pub fn is_neutral_default(&self) -> bool {
        *self == Self::NEUTRAL_DEFAULT
    }

    /// Rejects NaN/infinite fields and clamps the rest into [0, 1].
    pub fn checked(self) -> Result<Self, ScoringError> {
        let fields = [
            self.sentiment_score,
            self.positive_score,
            self.negative_score,
            self.neutral_score,
        ];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(ScoringError::NonFinite);
        }

        Ok(Self {
            sentiment: self.sentiment,
            sentiment_score: self.sentiment_score.clamp(0.0, 1.0),
            positive_score: self.positive_score.clamp(0.0, 1.0),
            negative_score: self.negative_score.clamp(0.0, 1.0),
            neutral_score: self.neutral_score.clamp(0.0, 1.0),
        })
    }
}
