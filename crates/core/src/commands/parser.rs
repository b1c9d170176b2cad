//! Keyword and shortcut command parsing.
//!
//! Intent resolution is a shortcut lookup followed by keyword scoring. Action
//! detection and entity extraction are independent scans over the same
//! normalized text and never influence the resolved intent or its confidence.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use rust_decimal::Decimal;

use crate::commands::registry::{intent_for_shortcut, intent_registry, SHORTCUT_SENTINEL};
use crate::domain::command::{ActionKeyword, CommandEntities, IntentId, ParsedCommand};

/// Confidence reported when text looked like a command but matched nothing.
pub const UNMATCHED_CONFIDENCE: f64 = 0.1;

/// Keyword score at which free-text confidence saturates at 1.0.
const FULL_CONFIDENCE_SCORE: f64 = 3.0;

/// Scanned in order; the first phrase found wins.
const ACTION_KEYWORDS: &[(ActionKeyword, &[&str])] = &[
    (ActionKeyword::Assign, &["assign"]),
    (ActionKeyword::Create, &["create", "add new"]),
    (ActionKeyword::Update, &["update", "change", "mark as"]),
    (ActionKeyword::Notify, &["notify", "alert"]),
    (ActionKeyword::Text, &["text", "sms"]),
    (ActionKeyword::Route, &["route", "dispatch"]),
    (ActionKeyword::Escalate, &["escalate"]),
    (ActionKeyword::Export, &["export", "download", "csv"]),
    (ActionKeyword::Schedule, &["schedule"]),
    (ActionKeyword::CreateRoute, &["create route", "build route"]),
    (ActionKeyword::FollowUp, &["follow up", "follow-up", "followup"]),
];

/// (match phrase, canonical brand name)
const BRAND_KEYWORDS: &[(&str, &str)] = &[
    ("grabba r", "Grabba R"),
    ("hot mama", "Hot Mama"),
    ("hardware", "Hardware"),
    ("gas", "Gas"),
    ("black", "Black"),
    ("natural", "Natural"),
];

const STATUS_KEYWORDS: &[&str] = &[
    "unpaid",
    "paid",
    "overdue",
    "partial",
    "pending",
    "planned",
    "in_progress",
    "completed",
    "delivered",
    "late",
    "active",
    "inactive",
];

/// Parses operator text relative to `today`, which anchors relative dates.
pub fn parse_command(text: &str, today: NaiveDate) -> ParsedCommand {
    let normalized = text.trim().to_lowercase();
    let entities = extract_entities(&normalized, today);
    let action = detect_action(&normalized);

    if let Some(intent) = match_shortcut(&normalized) {
        return ParsedCommand {
            original_text: text.to_string(),
            intent,
            action,
            confidence: 1.0,
            entities,
            is_shortcut: true,
        };
    }

    let (intent, confidence) = match score_intents(&normalized) {
        Some((intent, score)) => (intent, (f64::from(score) / FULL_CONFIDENCE_SCORE).min(1.0)),
        None => (IntentId::Unknown, UNMATCHED_CONFIDENCE),
    };

    ParsedCommand {
        original_text: text.to_string(),
        intent,
        action,
        confidence,
        entities,
        is_shortcut: false,
    }
}

fn match_shortcut(normalized: &str) -> Option<IntentId> {
    let token = normalized.split_whitespace().next()?;
    if !token.starts_with(SHORTCUT_SENTINEL) {
        return None;
    }
    intent_for_shortcut(token)
}

/// Highest keyword score wins; ties keep the earlier registry entry.
fn score_intents(normalized: &str) -> Option<(IntentId, u32)> {
    let mut best: Option<(IntentId, u32)> = None;

    for definition in intent_registry() {
        let score: u32 = definition
            .keywords
            .iter()
            .filter(|keyword| normalized.contains(keyword.as_str()))
            .map(|keyword| keyword_weight(keyword))
            .sum();

        if score == 0 {
            continue;
        }
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((definition.id, score));
        }
    }

    best
}

fn keyword_weight(keyword: &str) -> u32 {
    u32::try_from(keyword.split_whitespace().count()).unwrap_or(u32::MAX)
}

fn detect_action(normalized: &str) -> Option<ActionKeyword> {
    ACTION_KEYWORDS
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|phrase| normalized.contains(phrase)))
        .map(|(action, _)| *action)
}

pub fn extract_entities(normalized: &str, today: NaiveDate) -> CommandEntities {
    let period = extract_relative_period(normalized, today);
    CommandEntities {
        brand: extract_brand(normalized),
        amount: extract_amount(normalized),
        days: extract_days(normalized),
        date: period.map(|(start, _)| start),
        date_end: period.map(|(_, end)| end),
        status: extract_status(normalized),
    }
}

fn extract_brand(normalized: &str) -> Option<String> {
    BRAND_KEYWORDS
        .iter()
        .find(|(phrase, _)| contains_phrase(normalized, phrase))
        .map(|(_, brand)| brand.to_string())
}

/// A `$`-prefixed figure wins; otherwise the first bare number that is not a
/// day count.
fn extract_amount(normalized: &str) -> Option<Decimal> {
    if let Some(captures) = dollar_pattern().captures(normalized) {
        if let Some(amount) = captures.get(1).and_then(|m| parse_decimal(m.as_str())) {
            return Some(amount);
        }
    }

    number_pattern()
        .captures_iter(normalized)
        .filter(|captures| captures.get(2).is_none())
        .find_map(|captures| captures.get(1).and_then(|m| parse_decimal(m.as_str())))
}

fn extract_days(normalized: &str) -> Option<u32> {
    days_pattern()
        .captures_iter(normalized)
        .find_map(|captures| captures.get(1).and_then(|m| m.as_str().parse::<u32>().ok()))
}

/// Returns an inclusive (start, end) period. Weeks start on Monday.
fn extract_relative_period(normalized: &str, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    if contains_phrase(normalized, "yesterday") {
        let day = today.checked_sub_signed(Duration::days(1))?;
        return Some((day, day));
    }
    if contains_phrase(normalized, "today") {
        return Some((today, today));
    }
    if contains_phrase(normalized, "this week") {
        let offset = i64::from(today.weekday().num_days_from_monday());
        let start = today.checked_sub_signed(Duration::days(offset))?;
        let end = start.checked_add_signed(Duration::days(6))?;
        return Some((start, end));
    }
    None
}

fn extract_status(normalized: &str) -> Option<String> {
    let tokens: Vec<&str> = normalized
        .split(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
        .filter(|token| !token.is_empty())
        .collect();

    STATUS_KEYWORDS
        .iter()
        .find(|status| tokens.contains(status))
        .map(|status| status.to_string())
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(&raw.replace(',', "")).ok()
}

fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    haystack.match_indices(phrase).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + phrase.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn dollar_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| compile(r"\$\s*(\d[\d,]*(?:\.\d+)?)"))
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| compile(r"\b(\d[\d,]*(?:\.\d+)?)\b(\s*days?\b)?"))
}

fn days_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| compile(r"\b(\d+)\s*days?\b"))
}

fn compile(pattern: &str) -> Regex {
    // Patterns are compile-time constants covered by the tests below.
    Regex::new(pattern).expect("static entity pattern must compile")
}
