//! Text normalization and term matching shared by the rule engine.
//!
//! Matching is deliberately simple: word-boundary regex with naive
//! singular/plural tolerance, candidates tested longest-first so that
//! "peanut butter" out-ranks "peanut" when both are in play.

use regex::Regex;

/// Normalize free-form event text before matching: lowercase, strip
/// quoting/bracket punctuation, map every remaining punctuation character to
/// a space, then collapse whitespace. Punctuation acts as a word separator,
/// so "peanut-butter" still exposes "peanut" to the matcher.
pub fn normalize_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let unquoted: String = lowered
        .chars()
        .filter(|ch| !matches!(ch, '"' | '\'' | '`' | '(' | ')' | '[' | ']' | '{' | '}'))
        .collect();
    let stripped: String = unquoted
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || ch.is_whitespace() {
                ch
            } else {
                ' '
            }
        })
        .collect();
    collapse_whitespace(stripped.trim())
}

/// Normalize a declared allergy or candidate term key: lowercase, trim,
/// collapse internal whitespace, strip leading/trailing punctuation.
pub fn normalize_key(key: &str) -> String {
    let lowered = key.to_lowercase();
    let trimmed = lowered
        .trim()
        .trim_matches(|ch: char| !ch.is_alphanumeric());
    collapse_whitespace(trimmed)
}

/// Naive singular form: strip one trailing `s` when the term is longer than
/// one character. `cats` -> `cat`, `s` -> `s`.
pub fn singularize(term: &str) -> String {
    if term.len() > 1 {
        if let Some(stripped) = term.strip_suffix('s') {
            return stripped.to_string();
        }
    }
    term.to_string()
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Test `text` against `candidates`, longest term first (ties alphabetical
/// for determinism), and return the first candidate whose singular/plural
/// word-boundary pattern hits. Only the first hit is reported: one category
/// per event drives the verdict's severity, so later partial matches would
/// never be consulted anyway.
pub fn find_match<'a, I>(text: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let normalized = normalize_text(text);
    if normalized.is_empty() {
        return None;
    }

    let mut ordered: Vec<&str> = candidates.into_iter().collect();
    ordered.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    for candidate in ordered {
        let term = normalize_key(candidate);
        if term.is_empty() {
            continue;
        }
        if let Some(pattern) = boundary_pattern(&term) {
            if pattern.is_match(&normalized) {
                return Some(term);
            }
        }
    }

    None
}

/// Word-boundary pattern accepting the term and its naive plural/singular
/// counterpart (`cat` <-> `cats`).
fn boundary_pattern(term: &str) -> Option<Regex> {
    let singular = singularize(term);
    let escaped = regex::escape(&singular);
    Regex::new(&format!(r"\b{escaped}s?\b")).ok()
}
