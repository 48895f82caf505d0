use console::{measure_text_width, Style};
use std::path::Path;

use crate::aggregate::{KeywordCount, SentimentDistribution, TimelinePoint};
use crate::pipeline::IngestReport;
use crate::scoring::{Sentiment, SentimentRecord, StrategyKind};
use crate::store::StoredPost;

pub const TREE_BRANCH: char = '\u{251C}';
pub const TREE_END: char = '\u{2514}';
pub const TREE_HORIZ: char = '\u{2500}';
pub const TREE_VERT: char = '\u{2502}';

const TREE_PREFIX_WIDTH: usize = 4;
const VALUE_COLUMN: usize = 25;
const PREVIEW_CHARS: usize = 60;
const BAR_WIDTH: usize = 30;

fn tree_branch() -> String {
    dim()
        .apply_to(format!("{}{}{} ", TREE_BRANCH, TREE_HORIZ, TREE_HORIZ))
        .to_string()
}

fn tree_end() -> String {
    dim()
        .apply_to(format!("{}{}{} ", TREE_END, TREE_HORIZ, TREE_HORIZ))
        .to_string()
}

fn tree_indent() -> String {
    dim().apply_to(format!("{}   ", TREE_VERT)).to_string()
}

/// Branch glyph for item `i` of `len`.
fn tree_item(i: usize, len: usize) -> String {
    if i + 1 == len {
        tree_end()
    } else {
        tree_branch()
    }
}

pub fn dim() -> Style {
    Style::new().dim()
}

fn blue() -> Style {
    Style::new().blue()
}

fn magenta() -> Style {
    Style::new().magenta()
}

fn cyan() -> Style {
    Style::new().cyan()
}

fn green() -> Style {
    Style::new().green()
}

fn red() -> Style {
    Style::new().red()
}

fn yellow() -> Style {
    Style::new().yellow()
}

fn bold() -> Style {
    Style::new().bold()
}

fn init_prefix() -> String {
    blue().apply_to("[INIT]").to_string()
}

fn collect_prefix() -> String {
    magenta().apply_to("[COLLECT]").to_string()
}

fn query_prefix() -> String {
    cyan().apply_to("[QUERY]").to_string()
}

fn ml_prefix() -> String {
    yellow().apply_to("[ML]").to_string()
}

fn error_prefix() -> String {
    red().apply_to("[ERROR]").to_string()
}

fn sentiment_style(sentiment: Sentiment) -> Style {
    match sentiment {
        Sentiment::Positive => green(),
        Sentiment::Negative => red(),
        Sentiment::Neutral => yellow(),
    }
}

fn styled_label(sentiment: Sentiment) -> String {
    sentiment_style(sentiment)
        .apply_to(sentiment.as_str())
        .to_string()
}

pub fn pad_label(label: &str, depth: usize) -> String {
    let prefix_width = depth * TREE_PREFIX_WIDTH;
    let target_width = VALUE_COLUMN.saturating_sub(prefix_width);
    let current_width = measure_text_width(label);
    if current_width < target_width {
        format!("{}{}", label, " ".repeat(target_width - current_width))
    } else {
        format!("{} ", label)
    }
}

pub fn preview(text: &str) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() > PREVIEW_CHARS {
        format!("{}...", flat.chars().take(PREVIEW_CHARS - 3).collect::<String>())
    } else {
        flat
    }
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

fn bar(part: u64, total: u64) -> String {
    let filled = if total == 0 {
        0
    } else {
        ((part as f64 / total as f64) * BAR_WIDTH as f64).round() as usize
    };
    format!("{}{}", "\u{2588}".repeat(filled), " ".repeat(BAR_WIDTH - filled.min(BAR_WIDTH)))
}

pub fn log_startup_config(database_url: &str) {
    println!(
        "{} using database {}",
        init_prefix(),
        cyan().apply_to(database_url)
    );
}

pub fn log_ml_loading() {
    println!("{} loading sentiment models...", ml_prefix());
    println!(
        "{}",
        dim().apply_to("\u{2514}\u{2500}\u{2500} this may take a while on first run")
    );
}

pub fn log_strategy_ready(kind: StrategyKind) {
    println!(
        "{} scoring with {}",
        init_prefix(),
        bold().apply_to(kind)
    );
}

pub fn log_collect_start(keyword: &str, source: &str, max_count: usize, days_back: i64) {
    println!(
        "{} searching {} for {} {}",
        collect_prefix(),
        dim().apply_to(source),
        cyan().apply_to(keyword),
        dim().apply_to(format!("(max {max_count}, last {days_back} days)"))
    );
}

pub fn log_collect_report(report: &IngestReport) {
    let origin = if report.origin.is_sample() {
        yellow().apply_to(report.origin.to_string())
    } else {
        green().apply_to(report.origin.to_string())
    };
    println!(
        "{} stored {} posts for {}",
        collect_prefix(),
        bold().apply_to(report.stored),
        cyan().apply_to(&report.keyword)
    );
    println!("{}{} {}", tree_branch(), pad_label("origin", 1), origin);
    println!("{}batch sentiment:", tree_end());
    log_distribution_rows(&report.distribution, "    ");
}

fn log_distribution_rows(distribution: &SentimentDistribution, indent: &str) {
    let total = distribution.total();
    let labels = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];
    for (i, sentiment) in labels.iter().enumerate() {
        let count = distribution.get(*sentiment);
        println!(
            "{}{}{} {} {}",
            indent,
            tree_item(i, labels.len()),
            pad_label(&styled_label(*sentiment), 2),
            bold().apply_to(count),
            dim().apply_to(format!("({:.1}%)", percent(count, total)))
        );
    }
}

pub fn log_distribution(distribution: &SentimentDistribution) {
    let total = distribution.total();
    println!(
        "{} sentiment distribution over {} posts",
        query_prefix(),
        bold().apply_to(total)
    );
    let labels = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];
    for (i, sentiment) in labels.iter().enumerate() {
        let count = distribution.get(*sentiment);
        println!(
            "{}{} {} {}",
            tree_item(i, labels.len()),
            pad_label(&styled_label(*sentiment), 1),
            sentiment_style(*sentiment).apply_to(bar(count, total)),
            dim().apply_to(format!("{count} ({:.1}%)", percent(count, total)))
        );
    }
}

pub fn log_timeline(points: &[TimelinePoint]) {
    println!(
        "{} timeline with {} points",
        query_prefix(),
        bold().apply_to(points.len())
    );

    let mut days: Vec<_> = points.iter().map(|p| p.date).collect();
    days.dedup();

    for (d, day) in days.iter().enumerate() {
        let last_day = d + 1 == days.len();
        println!("{}{}", tree_item(d, days.len()), bold().apply_to(day));

        let entries: Vec<_> = points.iter().filter(|p| p.date == *day).collect();
        for (i, point) in entries.iter().enumerate() {
            let indent = if last_day {
                "    ".to_string()
            } else {
                tree_indent()
            };
            println!(
                "{}{}{} {} {}",
                indent,
                tree_item(i, entries.len()),
                pad_label(&styled_label(point.sentiment), 2),
                bold().apply_to(point.count),
                dim().apply_to(format!("avg {:.3}", point.avg_score))
            );
        }
    }
}

pub fn log_posts(posts: &[StoredPost]) {
    println!(
        "{} {} posts",
        query_prefix(),
        bold().apply_to(posts.len())
    );
    for (i, post) in posts.iter().enumerate() {
        println!(
            "{}{} {} {} {}",
            tree_item(i, posts.len()),
            dim().apply_to(post.created_at.format("%Y-%m-%d %H:%M")),
            styled_label(post.record.sentiment),
            dim().apply_to(format!("{:.2}", post.record.sentiment_score)),
            preview(&post.content)
        );
    }
}

pub fn log_keywords(keywords: &[KeywordCount]) {
    println!(
        "{} top {} keywords",
        query_prefix(),
        bold().apply_to(keywords.len())
    );
    for (i, keyword) in keywords.iter().enumerate() {
        println!(
            "{}{} {}",
            tree_item(i, keywords.len()),
            pad_label(&keyword.word, 1),
            bold().apply_to(keyword.frequency)
        );
    }
}

pub fn log_export_done(path: &Path, rows: usize) {
    println!(
        "{} exported {} posts to {}",
        query_prefix(),
        bold().apply_to(rows),
        cyan().apply_to(path.display())
    );
}

pub fn log_error(context: &str, error: &str) {
    println!("{} {} {}", error_prefix(), context, dim().apply_to(error));
}

pub fn log_header(text: &str) {
    println!("{}", bold().apply_to(text));
}

pub fn log_normalized(raw: &str, normalized: &str) {
    println!("{}{} {}", tree_branch(), pad_label("input", 1), preview(raw));
    println!(
        "{}{} {}",
        tree_branch(),
        pad_label("normalized", 1),
        if normalized.is_empty() {
            dim().apply_to("(empty)").to_string()
        } else {
            preview(normalized)
        }
    );
}

pub fn log_record(kind: StrategyKind, record: &SentimentRecord) {
    println!("{}{} {}", tree_branch(), pad_label("strategy", 1), bold().apply_to(kind));
    println!(
        "{}{} {} {}",
        tree_end(),
        pad_label("sentiment", 1),
        styled_label(record.sentiment),
        dim().apply_to(format!("({:.3})", record.sentiment_score))
    );
    let scores = [
        ("positive", record.positive_score),
        ("negative", record.negative_score),
        ("neutral", record.neutral_score),
    ];
    for (i, (label, score)) in scores.iter().enumerate() {
        println!(
            "    {}{} {:.3}",
            tree_item(i, scores.len()),
            pad_label(label, 2),
            score
        );
    }
    if record.is_neutral_default() {
        println!("{}", dim().apply_to("(neutral default)"));
    }
}
