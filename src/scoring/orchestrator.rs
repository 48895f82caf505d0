use anyhow::{bail, Result};
use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::{info, warn};

use super::classifier::MlHandle;
use super::keywords::KeywordCounter;
use super::lexicon::CompoundScorer;
use super::normalize::normalize;
use super::record::SentimentRecord;
use crate::error::ScoringError;
use crate::settings::Scoring;

/// Strategies in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum StrategyKind {
    #[strum(serialize = "ml-classifier")]
    Ml,
    #[strum(serialize = "lexicon")]
    Lexicon,
    #[strum(serialize = "rule-based")]
    RuleBased,
}

#[derive(Clone)]
pub enum Strategy {
    Ml(MlHandle),
    Lexicon(CompoundScorer),
    RuleBased(KeywordCounter),
}

impl Strategy {
    /// Builds a strategy, failing when its dependency is disabled or cannot
    /// be loaded. The rule-based strategy always succeeds.
    pub fn load(kind: StrategyKind, config: &Scoring) -> Result<Self> {
        match kind {
            StrategyKind::Ml => {
                if !config.ml.enabled {
                    bail!("disabled in settings");
                }
                Ok(Self::Ml(MlHandle::spawn(&config.ml)?))
            }
            StrategyKind::Lexicon => {
                if !config.lexicon.enabled {
                    bail!("disabled in settings");
                }
                let scorer = match &config.lexicon.path {
                    Some(path) => CompoundScorer::from_file(path)?,
                    None => CompoundScorer::builtin(),
                };
                Ok(Self::Lexicon(scorer))
            }
            StrategyKind::RuleBased => Ok(Self::RuleBased(KeywordCounter)),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Ml(_) => StrategyKind::Ml,
            Self::Lexicon(_) => StrategyKind::Lexicon,
            Self::RuleBased(_) => StrategyKind::RuleBased,
        }
    }

    fn score(&self, text: &str) -> Result<SentimentRecord, ScoringError> {
        match self {
            Self::Ml(handle) => handle.score(text),
            Self::Lexicon(scorer) => Ok(scorer.score(text)),
            Self::RuleBased(counter) => Ok(counter.score(text)),
        }
    }
}

/// Owns the process's single active strategy.
///
/// Construct once at startup and pass it by reference; the strategy is
/// never re-selected afterwards.
#[derive(Clone)]
pub struct SentimentScorer {
    strategy: Strategy,
}

impl SentimentScorer {
    pub fn initialize(config: &Scoring) -> Self {
        for kind in StrategyKind::iter() {
            match Strategy::load(kind, config) {
                Ok(strategy) => {
                    info!(strategy = %kind, "sentiment strategy ready");
                    return Self { strategy };
                }
                Err(e) => {
                    warn!(strategy = %kind, error = %e, "sentiment strategy unavailable, falling back");
                }
            }
        }

        Self::with_strategy(Strategy::RuleBased(KeywordCounter))
    }

    pub fn with_strategy(strategy: Strategy) -> Self {
        Self { strategy }
    }

    pub fn kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// Never fails: degenerate text and internal errors both yield
    /// [`SentimentRecord::NEUTRAL_DEFAULT`].
    pub fn score_one(&self, text: &str) -> SentimentRecord {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return SentimentRecord::NEUTRAL_DEFAULT;
        }

        match self.strategy.score(&normalized).and_then(SentimentRecord::checked) {
            Ok(record) => record,
            Err(e) => {
                warn!(strategy = %self.kind(), error = %e, "scoring failed, using neutral default");
                SentimentRecord::NEUTRAL_DEFAULT
            }
        }
    }

    /// One record per input, in input order.
    pub fn score_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<SentimentRecord> {
        texts.iter().map(|t| self.score_one(t.as_ref())).collect()
    }
}
