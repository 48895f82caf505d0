use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

static SETTINGS: OnceLock<Settings> = OnceLock::new();

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: Database,
    pub scoring: Scoring,
    pub collector: Collector,
    pub query: Query,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub url: String,
    pub pool_size: u32,
    pub busy_timeout_ms: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scoring {
    pub ml: Ml,
    pub lexicon: Lexicon,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ml {
    pub enabled: bool,
    pub load_timeout_secs: u64,
    pub model: MlModel,
    /// `{}` is replaced by each candidate label. Zero-shot only.
    pub hypothesis_template: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MlModel {
    /// NLI zero-shot over the labels positive, negative and neutral.
    ZeroShot,
    /// DistilBERT fine-tuned on SST-2. Two classes only, never neutral.
    Sst2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    pub enabled: bool,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collector {
    pub api_base: String,
    pub default_keyword: String,
    pub max_count: usize,
    pub days_back: i64,
    pub page_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub default_limit: usize,
    pub top_keywords_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: Database {
                url: "data/sentiment.db".to_string(),
                pool_size: 5,
                busy_timeout_ms: 2000,
            },
            scoring: Scoring {
                ml: Ml {
                    enabled: true,
                    load_timeout_secs: 600,
                    model: MlModel::ZeroShot,
                    hypothesis_template: "The sentiment of this post is {}.".to_string(),
                },
                lexicon: Lexicon {
                    enabled: true,
                    path: None,
                },
            },
            collector: Collector {
                api_base: "https://public.api.bsky.app/xrpc".to_string(),
                default_keyword: "city council".to_string(),
                max_count: 100,
                days_back: 7,
                page_size: 100,
            },
            query: Query {
                default_limit: 100,
                top_keywords_limit: 20,
            },
        }
    }
}

impl Settings {
    pub fn load() -> &'static Settings {
        SETTINGS.get_or_init(Self::load_from_files)
    }

    fn load_from_files() -> Settings {
        let default_path = Path::new("settings.default.ron");
        let override_path = Path::new("settings.ron");

        let mut settings = if default_path.exists() {
            fs::read_to_string(default_path)
                .ok()
                .and_then(|content| ron::from_str(&content).ok())
                .unwrap_or_default()
        } else {
            Settings::default()
        };

        if override_path.exists() {
            if let Ok(content) = fs::read_to_string(override_path) {
                if let Ok(overrides) = ron::from_str::<Settings>(&content) {
                    settings = overrides;
                }
            }
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            settings.database.url = url;
        }

        settings
    }
}

pub fn settings() -> &'static Settings {
    Settings::load()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_file_matches_defaults() {
        let content = include_str!("../settings.default.ron");
        let parsed: Settings = ron::from_str(content).unwrap();
        let defaults = Settings::default();
        assert_eq!(parsed.database.url, defaults.database.url);
        assert_eq!(parsed.collector.page_size, defaults.collector.page_size);
        assert_eq!(parsed.scoring.lexicon.path, None);
        assert!(parsed.scoring.ml.enabled);
        assert_eq!(parsed.scoring.ml.model, MlModel::ZeroShot);
        assert_eq!(
            parsed.scoring.ml.hypothesis_template,
            defaults.scoring.ml.hypothesis_template
        );
        assert!(parsed.scoring.ml.hypothesis_template.contains("{}"));
    }

    #[test]
    fn test_defaults_round_trip_through_ron() {
        let text = ron::to_string(&Settings::default()).unwrap();
        let parsed: Settings = ron::from_str(&text).unwrap();
        assert_eq!(parsed.query.top_keywords_limit, 20);
    }
}
