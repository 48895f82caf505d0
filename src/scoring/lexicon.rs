//! Compound-polarity lexicon scorer.
//!
//! Valences live on a [-4, 4] scale. Each token's valence is adjusted by
//! nearby boosters, negations and capitalization, then the total is folded
//! into a bounded `compound` score alongside positive/negative/neutral
//! proportions.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::record::{Sentiment, SentimentRecord};

pub const POSITIVE_THRESHOLD: f64 = 0.05;
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

const BOOSTER_INCR: f64 = 0.293;
const BOOSTER_DECR: f64 = -0.293;
const CAPS_INCR: f64 = 0.733;
const NEGATION_SCALAR: f64 = -0.74;
const EXCLAMATION_INCR: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const NORMALIZATION_ALPHA: f64 = 15.0;
const LOOKBACK: usize = 3;
const LOOKBACK_DECAY: [f64; LOOKBACK] = [1.0, 0.95, 0.9];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "neither", "nor", "nobody", "nothing", "nowhere", "none", "cannot",
    "cant", "dont", "doesnt", "didnt", "wont", "wouldnt", "shouldnt", "couldnt", "isnt", "arent",
    "wasnt", "werent", "without", "rarely", "seldom",
];

const BOOSTERS: &[(&str, f64)] = &[
    ("absolutely", BOOSTER_INCR),
    ("completely", BOOSTER_INCR),
    ("deeply", BOOSTER_INCR),
    ("enormously", BOOSTER_INCR),
    ("especially", BOOSTER_INCR),
    ("extremely", BOOSTER_INCR),
    ("highly", BOOSTER_INCR),
    ("hugely", BOOSTER_INCR),
    ("incredibly", BOOSTER_INCR),
    ("most", BOOSTER_INCR),
    ("really", BOOSTER_INCR),
    ("so", BOOSTER_INCR),
    ("totally", BOOSTER_INCR),
    ("truly", BOOSTER_INCR),
    ("very", BOOSTER_INCR),
    ("barely", BOOSTER_DECR),
    ("hardly", BOOSTER_DECR),
    ("less", BOOSTER_DECR),
    ("marginally", BOOSTER_DECR),
    ("partly", BOOSTER_DECR),
    ("slightly", BOOSTER_DECR),
    ("somewhat", BOOSTER_DECR),
];

const BUILTIN_LEXICON: &[(&str, f64)] = &[
    ("good", 1.9),
    ("great", 3.1),
    ("excellent", 2.7),
    ("amazing", 2.8),
    ("wonderful", 2.7),
    ("fantastic", 2.6),
    ("awesome", 3.1),
    ("brilliant", 2.8),
    ("outstanding", 3.0),
    ("superb", 3.1),
    ("impressive", 2.3),
    ("impressed", 2.1),
    ("thank", 1.5),
    ("thanks", 1.9),
    ("grateful", 2.0),
    ("appreciate", 1.7),
    ("love", 3.2),
    ("like", 2.0),
    ("happy", 2.7),
    ("pleased", 1.9),
    ("satisfied", 1.8),
    ("proud", 2.1),
    ("success", 2.7),
    ("successful", 2.8),
    ("achievement", 2.2),
    ("kudos", 2.3),
    ("commendable", 1.9),
    ("promising", 1.6),
    ("helpful", 1.8),
    ("hope", 1.9),
    ("nice", 1.8),
    ("best", 3.2),
    ("better", 1.9),
    ("welcome", 2.0),
    ("support", 1.7),
    ("win", 2.8),
    ("beautiful", 2.9),
    ("improve", 1.9),
    ("improved", 2.1),
    ("improvements", 2.0),
    ("positive", 2.6),
    ("transparent", 1.3),
    ("bad", -2.5),
    ("terrible", -2.1),
    ("awful", -2.0),
    ("horrible", -2.5),
    ("disappointing", -2.2),
    ("disappointed", -1.9),
    ("frustrated", -2.4),
    ("frustrating", -2.2),
    ("angry", -2.3),
    ("upset", -1.6),
    ("concerned", -0.9),
    ("worried", -1.2),
    ("problem", -1.7),
    ("problems", -1.7),
    ("issue", -0.6),
    ("issues", -0.6),
    ("fail", -2.5),
    ("failed", -2.3),
    ("failure", -2.3),
    ("wrong", -2.1),
    ("error", -1.7),
    ("mistake", -1.4),
    ("poor", -2.1),
    ("hate", -2.7),
    ("dislike", -1.6),
    ("disgusted", -2.4),
    ("annoyed", -1.6),
    ("corruption", -2.3),
    ("corrupt", -2.2),
    ("worse", -2.1),
    ("worst", -3.1),
    ("sad", -2.1),
    ("crisis", -3.1),
    ("delay", -1.3),
    ("broken", -1.9),
    ("scandal", -2.4),
    ("unfulfilled", -1.5),
    ("negative", -2.7),
];

/// Output of [`CompoundScorer::polarity_scores`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PolarityScores {
    pub pos: f64,
    pub neg: f64,
    pub neu: f64,
    pub compound: f64,
}

#[derive(Debug, Clone)]
pub struct CompoundScorer {
    lexicon: HashMap<String, f64>,
}

impl Default for CompoundScorer {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CompoundScorer {
    pub fn builtin() -> Self {
        Self {
            lexicon: BUILTIN_LEXICON
                .iter()
                .map(|(word, valence)| (word.to_string(), *valence))
                .collect(),
        }
    }

    /// Loads a lexicon file with one `token<TAB>mean[<TAB>...]` entry per line.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading lexicon {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing lexicon {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut lexicon = HashMap::new();

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split('\t');
            let token = fields.next().unwrap_or_default().trim();
            let valence: f64 = fields
                .next()
                .with_context(|| format!("line {}: missing valence", line_no + 1))?
                .trim()
                .parse()
                .with_context(|| format!("line {}: invalid valence", line_no + 1))?;

            if token.is_empty() || !valence.is_finite() {
                bail!("line {}: malformed entry", line_no + 1);
            }
            lexicon.insert(token.to_lowercase(), valence);
        }

        if lexicon.is_empty() {
            bail!("lexicon has no entries");
        }

        Ok(Self { lexicon })
    }

    pub fn len(&self) -> usize {
        self.lexicon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexicon.is_empty()
    }

    pub fn polarity_scores(&self, text: &str) -> PolarityScores {
        let tokens: Vec<&str> = text
            .split_whitespace()
            .map(|raw| raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
            .filter(|token| !token.is_empty())
            .collect();

        if tokens.is_empty() {
            return PolarityScores::default();
        }

        let mixed_case = tokens.iter().any(|t| is_all_caps(t))
            && tokens.iter().any(|t| !is_all_caps(t));
        let lowered: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();

        let mut sentiments: Vec<f64> = Vec::with_capacity(tokens.len());
        for (i, word) in lowered.iter().enumerate() {
            if booster(word).is_some() {
                sentiments.push(0.0);
                continue;
            }
            let Some(mut valence) = self.lexicon.get(word.as_str()).copied() else {
                sentiments.push(0.0);
                continue;
            };

            if mixed_case && is_all_caps(tokens[i]) {
                valence += CAPS_INCR * valence.signum();
            }

            for distance in 1..=LOOKBACK.min(i) {
                let prev_idx = i - distance;
                let prev = lowered[prev_idx].as_str();

                if let Some(boost) = booster(prev) {
                    let mut scalar = boost * LOOKBACK_DECAY[distance - 1];
                    if mixed_case && is_all_caps(tokens[prev_idx]) {
                        scalar += CAPS_INCR * boost.signum();
                    }
                    valence += scalar * valence.signum();
                }
                if is_negation(prev) {
                    valence *= NEGATION_SCALAR;
                }
            }

            sentiments.push(valence);
        }

        if let Some(but_idx) = lowered.iter().position(|w| w == "but") {
            for (i, s) in sentiments.iter_mut().enumerate() {
                if i < but_idx {
                    *s *= 0.5;
                } else if i > but_idx {
                    *s *= 1.5;
                }
            }
        }

        let emphasis = text.matches('!').count().min(MAX_EXCLAMATIONS) as f64 * EXCLAMATION_INCR;
        let sum: f64 = sentiments.iter().sum();
        let total_valence = if sum > 0.0 {
            sum + emphasis
        } else if sum < 0.0 {
            sum - emphasis
        } else {
            sum
        };

        let (mut pos_sum, mut neg_sum, mut neu_count) = (0.0_f64, 0.0_f64, 0.0_f64);
        for s in &sentiments {
            if *s > 0.0 {
                pos_sum += s + 1.0;
            } else if *s < 0.0 {
                neg_sum += s - 1.0;
            } else {
                neu_count += 1.0;
            }
        }

        if pos_sum > neg_sum.abs() {
            pos_sum += emphasis;
        } else if pos_sum < neg_sum.abs() {
            neg_sum -= emphasis;
        }

        let total = pos_sum + neg_sum.abs() + neu_count;

        PolarityScores {
            pos: round_to(pos_sum / total, 3),
            neg: round_to(neg_sum.abs() / total, 3),
            neu: round_to(neu_count / total, 3),
            compound: round_to(normalize_compound(total_valence), 4),
        }
    }

    pub fn score(&self, text: &str) -> SentimentRecord {
        record_from_polarity(&self.polarity_scores(text))
    }
}

/// Maps compound polarity onto a label. Both thresholds are inclusive.
pub fn record_from_polarity(scores: &PolarityScores) -> SentimentRecord {
    let (sentiment, sentiment_score) = if scores.compound >= POSITIVE_THRESHOLD {
        (Sentiment::Positive, scores.pos)
    } else if scores.compound <= NEGATIVE_THRESHOLD {
        (Sentiment::Negative, scores.neg)
    } else {
        (Sentiment::Neutral, scores.neu)
    };

    SentimentRecord {
        sentiment,
        sentiment_score,
        positive_score: scores.pos,
        negative_score: scores.neg,
        neutral_score: scores.neu,
    }
}

fn normalize_compound(score: f64) -> f64 {
    (score / (score * score + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn booster(word: &str) -> Option<f64> {
    BOOSTERS
        .iter()
        .find(|(b, _)| *b == word)
        .map(|(_, scalar)| *scalar)
}

fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word) || word.ends_with("n't")
}

fn is_all_caps(token: &str) -> bool {
    token.chars().any(char::is_alphabetic)
        && token
            .chars()
            .filter(|c| c.is_alphabetic())
            .all(char::is_uppercase)
}
