use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::RawPost;
use crate::scoring::Sentiment;

const HOURS_BACK: i64 = 7 * 24;

const POSITIVE_TEMPLATES: &[&str] = &[
    "Great initiative by {kw}! This will really help the people here.",
    "Impressed with the recent policies from {kw}. Moving in the right direction!",
    "Thank you {kw} for the excellent work on the new roads",
    "{kw} is doing amazing work for local schools. Keep it up!",
    "The new housing plan from {kw} is really promising for young families",
    "Kudos to {kw} for the transparent budget process",
    "Happy to see {kw} finally investing in public transit",
    "The clinic improvements under {kw} are commendable",
];

const NEGATIVE_TEMPLATES: &[&str] = &[
    "Disappointed with the recent decisions by {kw}. Expected better leadership",
    "{kw} needs to address the pothole problem more seriously",
    "The promises made by {kw} during the campaign are still unfulfilled",
    "Concerned about the environmental record of {kw}. Need more action!",
    "The corruption allegations against {kw} officials need a proper investigation",
    "Traffic is getting worse every month under {kw}",
    "Terrible communication from {kw} about the water outage",
    "Frustrated with the slow progress of projects under {kw}",
];

const NEUTRAL_TEMPLATES: &[&str] = &[
    "{kw} announced the agenda for the upcoming fiscal year",
    "Meeting scheduled between {kw} and state officials on Thursday",
    "{kw} to review the progress of ongoing construction projects",
    "Budget allocation for various departments announced by {kw}",
    "New appointments made in several departments under {kw}",
    "Quarterly report on city services released by {kw}",
    "{kw} to hold a public consultation on the zoning proposal",
    "Administrative changes being considered by {kw} next month",
];

const AUTHORS: &[&str] = &[
    "local_citizen",
    "downtown_resident",
    "civic_observer",
    "council_watch",
    "city_news",
    "citizen_reporter",
    "local_activist",
    "concerned_neighbor",
    "metro_times",
    "hill_voice",
];

/// Stable across runs and platforms, unlike `DefaultHasher`.
fn seed_for(keyword: &str) -> u64 {
    keyword.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items[rng.random_range(0..items.len())]
}

/// Roughly 40% positive, 30% negative, 30% neutral.
fn pick_tone(rng: &mut StdRng) -> Sentiment {
    match rng.random_range(0..10) {
        0..=3 => Sentiment::Positive,
        4..=6 => Sentiment::Negative,
        _ => Sentiment::Neutral,
    }
}

/// Builds `count` plausible posts mentioning `keyword`, spread over the
/// seven days before `now`. The same keyword and `now` always produce the
/// same posts.
pub fn generate(keyword: &str, count: usize, now: DateTime<Utc>) -> Vec<RawPost> {
    let mut rng = StdRng::seed_from_u64(seed_for(keyword));
    let stamp = now.timestamp();

    (0..count)
        .map(|i| {
            let templates = match pick_tone(&mut rng) {
                Sentiment::Positive => POSITIVE_TEMPLATES,
                Sentiment::Negative => NEGATIVE_TEMPLATES,
                Sentiment::Neutral => NEUTRAL_TEMPLATES,
            };
            let content = pick(&mut rng, templates).replace("{kw}", keyword);
            let hours = rng.random_range(0..=HOURS_BACK);

            RawPost {
                id: format!("sample_{i}_{stamp}"),
                content,
                author: pick(&mut rng, AUTHORS).to_string(),
                created_at: now - Duration::hours(hours),
                keyword: keyword.to_string(),
                url: format!("https://example.com/sample/status/{i}"),
                retweet_count: rng.random_range(0..=50),
                like_count: rng.random_range(0..=200),
            }
        })
        .collect()
}
