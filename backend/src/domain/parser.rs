//! Message parsing for the ledger engine.
//!
//! Extracts a signed amount and a currency token from free-form chat text.
//! Absence of a transaction pattern is an expected outcome, not an error:
//! group chats are mostly chatter, and the engine silently ignores it.
//! Unsafe input (URLs, SQL metacharacter patterns, separator-only messages)
//! is screened out before matching and reported distinctly so it can be
//! logged but never applied.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Which grammar variant applies to the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Group chat message: the sign is mandatory
    ChatMessage,
    /// Inline query: the sign is optional and defaults to `+`
    InlineQuery,
}

/// Outcome of parsing one inbound text.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// A well-formed amount followed by a currency token. The token may be
    /// empty in the lenient variant; currency validation rejects it later.
    Transaction { amount: f64, currency_token: String },
    /// No transaction pattern present
    NoMatch,
    /// Screened out before matching
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Input is literally "0+0" or "+0"
    SeparatorOnly,
    /// Input contains an embedded URL
    ContainsUrl,
    /// Input contains SQL metacharacter patterns
    SqlPattern,
}

// Patterns are compiled once per process and reused across calls.
static CHAT_MESSAGE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([+-])(\d+(?:\.\d+)?)([a-zA-Zа-яА-Я$€]+)").expect("valid pattern"));

static INLINE_QUERY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([+-]?)(\d+(?:\.\d+)?)([a-zA-Zа-яА-Я$€]*)").expect("valid pattern"));

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").expect("valid pattern"));

static SQL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(SELECT|INSERT|UPDATE|DELETE|DROP|ALTER|CREATE|TRUNCATE|EXEC|UNION|--|;|')")
        .expect("valid pattern")
});

// A message that is nothing but a transaction is exempt from the SQL screen:
// currency tokens may contain keyword substrings (e.g. "+5drop") and must fall
// through to currency validation instead.
static BARE_TRANSACTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+(?:\.\d+)?[a-zA-Zа-яА-Я$€]+$").expect("valid pattern"));

/// Parse one inbound text. Only the first well-formed occurrence matches when
/// several are present.
pub fn parse_message(text: &str, mode: ParseMode) -> ParseOutcome {
    if text == "0+0" || text == "+0" {
        warn!("ignoring separator-only message: {text}");
        return ParseOutcome::Rejected(RejectReason::SeparatorOnly);
    }

    if URL_PATTERN.is_match(text) {
        warn!("ignoring message containing a URL");
        return ParseOutcome::Rejected(RejectReason::ContainsUrl);
    }

    if SQL_PATTERN.is_match(text) && !BARE_TRANSACTION_PATTERN.is_match(text) {
        warn!("ignoring message containing SQL metacharacters");
        return ParseOutcome::Rejected(RejectReason::SqlPattern);
    }

    let pattern = match mode {
        ParseMode::ChatMessage => &CHAT_MESSAGE_PATTERN,
        ParseMode::InlineQuery => &INLINE_QUERY_PATTERN,
    };

    let Some(captures) = pattern.captures(text) else {
        return ParseOutcome::NoMatch;
    };

    let amount: f64 = match captures[2].parse() {
        Ok(amount) => amount,
        Err(_) => return ParseOutcome::NoMatch,
    };
    let amount = if &captures[1] == "-" { -amount } else { amount };

    ParseOutcome::Transaction {
        amount,
        currency_token: captures[3].to_string(),
    }
}
