use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use sentiment_feed::collector::{self, BlueskySearch, PostSource};
use sentiment_feed::pipeline::ingest;
use sentiment_feed::query::QueryFilter;
use sentiment_feed::scoring::SentimentScorer;
use sentiment_feed::settings::{settings, Settings};
use sentiment_feed::store::ResultStore;
use sentiment_feed::utils;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::subscriber::set_global_default;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "sentiment-feed")]
#[command(about = "Collect posts for a keyword, score their sentiment and query the results")]
struct Cli {
    /// Print machine-readable JSON instead of styled output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Default)]
struct FilterArgs {
    /// Case-insensitive substring of the collection keyword
    #[arg(long)]
    keyword: Option<String>,
    /// Inclusive lower bound (RFC 3339, YYYY-MM-DDTHH:MM:SS or YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,
    /// Inclusive upper bound
    #[arg(long)]
    end: Option<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> Result<QueryFilter> {
        Ok(QueryFilter::parse(
            self.keyword.as_deref(),
            self.start.as_deref(),
            self.end.as_deref(),
        )?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Collect, score and store posts for a keyword
    Collect {
        keyword: Option<String>,
        #[arg(long)]
        max_count: Option<usize>,
        #[arg(long)]
        days_back: Option<i64>,
    },

    /// List stored posts, newest first
    Posts {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Count posts per sentiment
    Distribution {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Daily counts and average confidence per sentiment
    Timeline {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Most frequent words across stored content
    TopKeywords {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Write matching posts to a CSV file
    Export {
        path: Option<PathBuf>,
        #[command(flatten)]
        filter: FilterArgs,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}

fn default_export_path(database_url: &str) -> PathBuf {
    let dir = Path::new(database_url)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    dir.join(format!(
        "posts_export_{}.csv",
        Utc::now().format("%Y%m%d_%H%M%S")
    ))
}

async fn run(cli: Cli, settings: &Settings) -> Result<()> {
    ensure_parent_dir(Path::new(&settings.database.url))?;
    if !cli.json {
        utils::log_startup_config(&settings.database.url);
    }
    let store = ResultStore::open(&settings.database).context("storage unavailable")?;

    match cli.command {
        Commands::Collect {
            keyword,
            max_count,
            days_back,
        } => {
            let keyword = keyword.unwrap_or_else(|| settings.collector.default_keyword.clone());
            let max_count = max_count.unwrap_or(settings.collector.max_count);
            let days_back = days_back.unwrap_or(settings.collector.days_back);

            if !cli.json && settings.scoring.ml.enabled {
                utils::log_ml_loading();
            }
            let scorer = SentimentScorer::initialize(&settings.scoring);
            if !cli.json {
                utils::log_strategy_ready(scorer.kind());
            }

            let source = BlueskySearch::new(&settings.collector);
            if !cli.json {
                utils::log_collect_start(&keyword, source.name(), max_count, days_back);
            }
            let collection = collector::collect(&source, &keyword, max_count, days_back).await;
            let report = ingest(&scorer, &store, collection)?;

            if cli.json {
                print_json(&report)?;
            } else {
                utils::log_collect_report(&report);
            }
        }
        Commands::Posts { filter, limit } => {
            let limit = limit.unwrap_or(settings.query.default_limit);
            let posts = store.query(&filter.to_filter()?, Some(limit))?;
            if cli.json {
                print_json(&posts)?;
            } else {
                utils::log_posts(&posts);
            }
        }
        Commands::Distribution { filter } => {
            let distribution = store.distribution(&filter.to_filter()?)?;
            if cli.json {
                print_json(&distribution)?;
            } else {
                utils::log_distribution(&distribution);
            }
        }
        Commands::Timeline { filter } => {
            let points = store.timeline(&filter.to_filter()?)?;
            if cli.json {
                print_json(&points)?;
            } else {
                utils::log_timeline(&points);
            }
        }
        Commands::TopKeywords { filter, limit } => {
            let limit = limit.unwrap_or(settings.query.top_keywords_limit);
            let keywords = store.top_keywords_matching(&filter.to_filter()?, limit)?;
            if cli.json {
                print_json(&keywords)?;
            } else {
                utils::log_keywords(&keywords);
            }
        }
        Commands::Export { path, filter } => {
            let path = path.unwrap_or_else(|| default_export_path(&settings.database.url));
            ensure_parent_dir(&path)?;
            let rows = store.export_csv(&path, &filter.to_filter()?)?;
            if cli.json {
                print_json(&serde_json::json!({ "path": path, "rows": rows }))?;
            } else {
                utils::log_export_done(&path, rows);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("sentiment_feed=info".parse()?))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        );
    set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let cli = Cli::parse();
    if let Err(e) = run(cli, settings()).await {
        utils::log_error("command failed:", &format!("{e:#}"));
        std::process::exit(1);
    }

    Ok(())
}
