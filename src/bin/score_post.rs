use sentiment_feed::scoring::{normalize, SentimentScorer};
use sentiment_feed::settings::settings;
use sentiment_feed::utils::{log_header, log_ml_loading, log_normalized, log_record};
use std::env;
use std::process;

fn print_usage() {
    eprintln!("Usage: score-post <text> [--offline|-o]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <text>       Post text to score");
    eprintln!("  --offline    Skip the ML classifier and use the lexicon or rule-based scorer");
}

fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();
    let offline = args.iter().any(|a| a == "--offline" || a == "-o");

    let text_args: Vec<&str> = args
        .iter()
        .skip(1)
        .map(String::as_str)
        .filter(|a| *a != "--offline" && *a != "-o")
        .collect();

    if text_args.is_empty() {
        print_usage();
        process::exit(1);
    }
    let text = text_args.join(" ");

    let mut config = settings().scoring.clone();
    if offline {
        config.ml.enabled = false;
    }
    if config.ml.enabled {
        log_ml_loading();
    }
    let scorer = SentimentScorer::initialize(&config);

    println!();
    log_header("Sentiment");
    log_normalized(&text, &normalize(&text));
    log_record(scorer.kind(), &scorer.score_one(&text));
    println!();
}
