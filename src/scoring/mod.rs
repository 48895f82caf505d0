mod classifier;
pub mod keywords;
pub mod lexicon;
pub mod normalize;
mod orchestrator;
mod record;

pub use classifier::{map_label, record_from_prediction, MlHandle, Prediction};
pub use keywords::{KeywordCounter, KeywordHits};
pub use lexicon::{record_from_polarity, CompoundScorer, PolarityScores};
pub use normalize::{normalize, MAX_TEXT_CHARS};
pub use orchestrator::{SentimentScorer, Strategy, StrategyKind};
pub use record::{Sentiment, SentimentRecord};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategies_agree_on_clear_cases() {
        let lexicon = SentimentScorer::with_strategy(Strategy::Lexicon(CompoundScorer::builtin()));
        let rules = SentimentScorer::with_strategy(Strategy::RuleBased(KeywordCounter));

        for scorer in [&lexicon, &rules] {
            assert_eq!(
                scorer.score_one("Excellent work, thank you!").sentiment,
                Sentiment::Positive
            );
            assert_eq!(
                scorer.score_one("Horrible roads and awful traffic").sentiment,
                Sentiment::Negative
            );
        }
    }

    #[test]
    fn test_neutral_default_for_every_strategy() {
        let expected = SentimentRecord {
            sentiment: Sentiment::Neutral,
            sentiment_score: 0.5,
            positive_score: 0.33,
            negative_score: 0.33,
            neutral_score: 0.34,
        };
        let lexicon = SentimentScorer::with_strategy(Strategy::Lexicon(CompoundScorer::builtin()));
        let rules = SentimentScorer::with_strategy(Strategy::RuleBased(KeywordCounter));
        assert_eq!(lexicon.score_one("  "), expected);
        assert_eq!(rules.score_one("  "), expected);
    }
}
