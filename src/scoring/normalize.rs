use regex::Regex;
use std::sync::LazyLock;

/// Input ceiling of the classifier model, applied to every strategy.
pub const MAX_TEXT_CHARS: usize = 512;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:https?://|www\.)\S+").unwrap());
static MENTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@\w+").unwrap());

/// Strips links and mentions, collapses whitespace and truncates to
/// [`MAX_TEXT_CHARS`] characters.
pub fn normalize(text: &str) -> String {
    let without_urls = URL_PATTERN.replace_all(text, "");
    let without_mentions = MENTION_PATTERN.replace_all(&without_urls, "");
    let collapsed = without_mentions
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if collapsed.chars().count() <= MAX_TEXT_CHARS {
        return collapsed;
    }

    let truncated: String = collapsed.chars().take(MAX_TEXT_CHARS).collect();
    truncated.trim_end().to_string()
}
