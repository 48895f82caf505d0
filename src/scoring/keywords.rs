use super::record::{Sentiment, SentimentRecord};

pub const POSITIVE_WORDS: &[&str] = &[
    "good",
    "great",
    "excellent",
    "amazing",
    "wonderful",
    "fantastic",
    "awesome",
    "brilliant",
    "outstanding",
    "superb",
    "impressive",
    "thank",
    "thanks",
    "grateful",
    "appreciate",
    "love",
    "like",
    "happy",
    "pleased",
    "satisfied",
    "proud",
    "success",
    "achievement",
];

pub const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "terrible",
    "awful",
    "horrible",
    "disappointing",
    "frustrated",
    "angry",
    "upset",
    "concerned",
    "worried",
    "problem",
    "issue",
    "fail",
    "failure",
    "wrong",
    "error",
    "mistake",
    "poor",
    "hate",
    "dislike",
    "disgusted",
    "annoyed",
    "corruption",
];

const NEUTRAL_CONFIDENCE: f64 = 0.6;
const MAX_CONFIDENCE: f64 = 0.8;

/// Last-resort strategy with no external dependency.
///
/// Each listed word counts at most once, and matching is plain substring
/// containment, so "dislike" also counts as "like".
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordCounter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeywordHits {
    pub positive: usize,
    pub negative: usize,
}

impl KeywordCounter {
    pub fn count(&self, text: &str) -> KeywordHits {
        let text_lower = text.to_lowercase();
        KeywordHits {
            positive: POSITIVE_WORDS
                .iter()
                .filter(|w| text_lower.contains(*w))
                .count(),
            negative: NEGATIVE_WORDS
                .iter()
                .filter(|w| text_lower.contains(*w))
                .count(),
        }
    }

    pub fn score(&self, text: &str) -> SentimentRecord {
        record_from_hits(self.count(text))
    }
}

pub fn record_from_hits(hits: KeywordHits) -> SentimentRecord {
    let pos = hits.positive as f64;
    let neg = hits.negative as f64;
    let margin = (pos - neg).abs();

    let (sentiment, sentiment_score) = if hits.positive > hits.negative {
        (Sentiment::Positive, MAX_CONFIDENCE.min(0.5 + margin * 0.1))
    } else if hits.negative > hits.positive {
        (Sentiment::Negative, MAX_CONFIDENCE.min(0.5 + margin * 0.1))
    } else {
        (Sentiment::Neutral, NEUTRAL_CONFIDENCE)
    };

    // +1 keeps the denominator positive on a 0-0 tie.
    let denominator = pos + neg + 1.0;

    SentimentRecord {
        sentiment,
        sentiment_score,
        positive_score: pos / denominator,
        negative_score: neg / denominator,
        neutral_score: 1.0 / denominator,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_repeated_word_counts_once() {
        let hits = KeywordCounter.count("great great awesome");
        assert_eq!(hits, KeywordHits { positive: 2, negative: 0 });

        let record = KeywordCounter.score("great great awesome");
        assert_eq!(record.sentiment, Sentiment::Positive);
        assert!(approx(record.sentiment_score, 0.7));
        assert!(approx(record.positive_score, 2.0 / 3.0));
        assert!(approx(record.negative_score, 0.0));
        assert!(approx(record.neutral_score, 1.0 / 3.0));
    }

    #[test]
    fn test_no_matches_is_neutral() {
        let record = KeywordCounter.score("the council met on tuesday");
        assert_eq!(record.sentiment, Sentiment::Neutral);
        assert!(approx(record.sentiment_score, 0.6));
        assert!(approx(record.neutral_score, 1.0));
        assert!(approx(record.positive_score, 0.0));
    }

    #[test]
    fn test_tie_is_neutral() {
        let record = KeywordCounter.score("good intentions, bad execution");
        assert_eq!(record.sentiment, Sentiment::Neutral);
        assert!(approx(record.sentiment_score, 0.6));
    }

    #[test]
    fn test_negative_wins() {
        let record = KeywordCounter.score("Terrible roads, awful traffic");
        assert_eq!(record.sentiment, Sentiment::Negative);
        assert!(approx(record.sentiment_score, 0.7));
    }

    #[test]
    fn test_confidence_caps_at_point_eight() {
        let record =
            KeywordCounter.score("good great excellent amazing wonderful fantastic awesome");
        assert_eq!(record.sentiment, Sentiment::Positive);
        assert!(approx(record.sentiment_score, 0.8));
    }

    #[test]
    fn test_substring_matching() {
        let hits = KeywordCounter.count("I dislike this");
        assert_eq!(hits, KeywordHits { positive: 1, negative: 1 });
    }
}
