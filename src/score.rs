//! Relevance scoring and snippet extraction.
//!
//! # Scoring
//!
//! For each query token (lower-cased ASCII word, longer than two chars):
//!
//! | Match | Weight |
//! |-------|--------|
//! | token in title tokens | +3 |
//! | token in content tokens | +1 |
//! | token longer than 4 chars, per title token in a substring relation | +1.5 |
//! | token longer than 4 chars, per content token in a substring relation | +0.5 |
//!
//! The sum is divided by the number of query tokens. If the whole lower-cased
//! query occurs verbatim in the lower-cased content, 5 is added on top. The
//! result is an unbounded relevance weight, not a probability.

use std::collections::HashSet;

const TITLE_MATCH: f64 = 3.0;
const CONTENT_MATCH: f64 = 1.0;
const TITLE_PARTIAL: f64 = 1.5;
const CONTENT_PARTIAL: f64 = 0.5;
const PHRASE_BONUS: f64 = 5.0;

/// Tokens must be longer than this to count at all.
const MIN_TOKEN_LEN: usize = 2;

/// Tokens must be longer than this to earn partial-match weight.
const PARTIAL_TOKEN_LEN: usize = 4;

/// Default characters of context on each side of a snippet match.
pub const SNIPPET_CONTEXT: usize = 200;

/// Lower-case, replace non-word characters with spaces, split on whitespace,
/// and drop tokens of two characters or fewer.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|t| t.len() > MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}

/// Score `query` against a document's `content` and `title`.
pub fn score(query: &str, content: &str, title: &str) -> f64 {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return 0.0;
    }

    let content_tokens: HashSet<String> = tokenize(content).into_iter().collect();
    let title_tokens: HashSet<String> = tokenize(title).into_iter().collect();

    let mut total = 0.0;
    for token in &query_tokens {
        if title_tokens.contains(token) {
            total += TITLE_MATCH;
        }
        if content_tokens.contains(token) {
            total += CONTENT_MATCH;
        }

        if token.len() > PARTIAL_TOKEN_LEN {
            total += TITLE_PARTIAL * partial_matches(token, &title_tokens) as f64;
            total += CONTENT_PARTIAL * partial_matches(token, &content_tokens) as f64;
        }
    }

    let normalized = total / query_tokens.len() as f64;

    if content.to_lowercase().contains(&query.to_lowercase()) {
        return normalized + PHRASE_BONUS;
    }
    normalized
}

/// Number of tokens that contain `token` or are contained in it.
fn partial_matches(token: &str, tokens: &HashSet<String>) -> usize {
    tokens
        .iter()
        .filter(|t| t.contains(token) || token.contains(t.as_str()))
        .count()
}

/// Excerpt of `content` around the first match of `query`.
///
/// Looks for the whole lower-cased query first, then for each query token in
/// order. Returns up to `context_length` characters on either side of the
/// match, with `...` marking truncation. Without any match, returns the first
/// `2 * context_length` characters followed by `...`.
pub fn extract_snippet(content: &str, query: &str, context_length: usize) -> String {
    let chars: Vec<char> = content.chars().collect();
    let (lower, origin) = lowercase_with_origin(&chars);

    let needle: Vec<char> = query.to_lowercase().chars().collect();
    let mut found = find_chars(&lower, &needle);
    if found.is_none() {
        found = tokenize(query).iter().find_map(|token| {
            let needle: Vec<char> = token.chars().collect();
            find_chars(&lower, &needle)
        });
    }

    let Some(pos) = found else {
        let head: String = chars.iter().take(context_length * 2).collect();
        return format!("{}...", head);
    };

    let matched_at = origin.get(pos).copied().unwrap_or(chars.len());
    let start = matched_at.saturating_sub(context_length);
    let end = (matched_at + context_length).min(chars.len());

    let mut snippet: String = chars[start..end].iter().collect();
    if start > 0 {
        snippet.insert_str(0, "...");
    }
    if end < chars.len() {
        snippet.push_str("...");
    }
    snippet
}

/// Lower-case char by char, remembering which source char each output char
/// came from. Some characters lower-case to more than one char.
fn lowercase_with_origin(chars: &[char]) -> (Vec<char>, Vec<usize>) {
    let mut lower = Vec::with_capacity(chars.len());
    let mut origin = Vec::with_capacity(chars.len());
    for (i, c) in chars.iter().enumerate() {
        for lc in c.to_lowercase() {
            lower.push(lc);
            origin.push(i);
        }
    }
    (lower, origin)
}

fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
