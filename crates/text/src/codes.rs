//! Code-shaped token extraction
//!
//! Scans raw messages for SKU-looking tokens using a fixed pattern
//! priority: bare numeric runs first, then letter+digit codes. Patterns
//! are compiled once at startup.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::normalize_code;

/// Bare numeric ids: 5+ digit runs ("00412877")
static NUMERIC_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{5,})\b").expect("numeric code pattern"));

/// Letter+digit codes with optional single separator ("K78", "N-35",
/// "n 35"). A space separator only counts after a lone letter, so
/// ordinary word+number phrases ("mesa 35") are not codes.
static ALNUM_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Za-z]\s\d{2,6}|[A-Za-z]{1,4}[\-\.]?\d{2,6})\b")
        .expect("alnum code pattern")
});

/// Extract code-shaped tokens from a raw message, normalized and in
/// pattern-priority order (numeric codes before letter+digit codes),
/// deduplicated.
pub fn extract_codes(message: &str) -> Vec<String> {
    let mut codes = Vec::new();

    for captures in NUMERIC_CODE.captures_iter(message) {
        if let Some(m) = captures.get(1) {
            push_unique(&mut codes, normalize_code(m.as_str()));
        }
    }
    for captures in ALNUM_CODE.captures_iter(message) {
        if let Some(m) = captures.get(1) {
            push_unique(&mut codes, normalize_code(m.as_str()));
        }
    }

    codes
}

/// First code-shaped token of a message, if any
pub fn extract_primary_code(message: &str) -> Option<String> {
    extract_codes(message).into_iter().next()
}

/// Whether a single token is itself code-shaped
pub fn looks_like_code(token: &str) -> bool {
    let trimmed = token.trim();
    NUMERIC_CODE.is_match(trimmed)
        || ALNUM_CODE
            .find(trimmed)
            .is_some_and(|m| m.as_str().len() == trimmed.len())
}

fn push_unique(codes: &mut Vec<String>, code: String) {
    if !code.is_empty() && !codes.contains(&code) {
        codes.push(code);
    }
}
