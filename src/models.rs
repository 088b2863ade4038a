//! Core data models for the documentation corpus.
//!
//! A full indexing pass produces an [`Index`] of [`Page`]s. [`Section`]s are
//! derived from a page's markdown on demand and never persisted. A
//! [`SearchResult`] borrows its page from the index it was computed against.
//!
//! Field names serialize in camelCase (`scrapedAt`, `updatedAt`, `baseUrl`,
//! `pagePath`, `matchedSections`) and timestamps as Unix epoch milliseconds,
//! which is the persisted index format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A heading found in a page's rendered markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading level, 1 through 6.
    pub level: u8,
    /// Heading text, trimmed.
    pub text: String,
    /// Explicit anchor from the markup, or [`derive_heading_id`] of `text`.
    pub id: String,
}

/// One documentation page, normalized to markdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Site-relative path; the page's identifier within an index.
    pub path: String,
    pub title: String,
    /// Absolute URL the page was fetched from.
    pub url: String,
    /// Page body as markdown text.
    pub content: String,
    pub headings: Vec<Heading>,
    pub category: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub scraped_at: DateTime<Utc>,
}

/// A heading-delimited span of a page's markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub title: String,
    pub anchor: String,
    pub content: String,
    /// Path of the page this section was cut from.
    pub page_path: String,
}

/// A scored page match for one query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult<'a> {
    /// Unbounded relevance weight; always > 0 for returned results.
    pub score: f64,
    pub page: &'a Page,
    /// Up to three sections that score > 0 against the same query.
    pub matched_sections: Vec<Section>,
    pub snippet: String,
}

/// Immutable snapshot of every indexed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub pages: Vec<Page>,
    pub version: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    pub base_url: String,
}

impl Index {
    /// Age of the snapshot relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.updated_at
    }
}

/// Lightweight listing entry returned by `list_all_pages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    pub path: String,
    pub title: String,
    pub category: String,
}

/// Derive a heading id from its text: lower-case, whitespace runs become `-`.
pub fn derive_heading_id(text: &str) -> String {
    hyphenate_whitespace(&text.to_lowercase())
}

/// Derive a section anchor from its title.
///
/// Lower-cases, turns whitespace runs into `-`, then drops every character
/// that is not an ASCII letter, digit, `_` or `-`.
pub fn derive_section_anchor(title: &str) -> String {
    hyphenate_whitespace(&title.to_lowercase())
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

fn hyphenate_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_id_collapses_whitespace() {
        assert_eq!(derive_heading_id("MCP  Servers\tGuide"), "mcp-servers-guide");
        assert_eq!(derive_heading_id("Intro"), "intro");
    }

    #[test]
    fn test_heading_id_keeps_punctuation() {
        assert_eq!(derive_heading_id("What's new?"), "what's-new?");
    }

    #[test]
    fn test_section_anchor_strips_non_word() {
        assert_eq!(derive_section_anchor("What's New?"), "whats-new");
        assert_eq!(derive_section_anchor("Step 1: Install"), "step-1-install");
        assert_eq!(derive_section_anchor("snake_case"), "snake_case");
    }

    #[test]
    fn test_section_anchor_empty() {
        assert_eq!(derive_section_anchor(""), "");
        assert_eq!(derive_section_anchor("!!!"), "");
    }

    #[test]
    fn test_index_serializes_camel_case_millis() {
        let ts = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let index = Index {
            pages: vec![Page {
                path: "/docs/".to_string(),
                title: "Intro".to_string(),
                url: "https://example.com/docs/".to_string(),
                content: "# Intro".to_string(),
                headings: vec![],
                category: "Getting Started".to_string(),
                scraped_at: ts,
            }],
            version: "1.0.0".to_string(),
            updated_at: ts,
            base_url: "https://example.com/docs".to_string(),
        };
        let value = serde_json::to_value(&index).unwrap();
        assert_eq!(value["updatedAt"], 1_700_000_000_123i64);
        assert_eq!(value["baseUrl"], "https://example.com/docs");
        assert_eq!(value["pages"][0]["scrapedAt"], 1_700_000_000_123i64);

        let back: Index = serde_json::from_value(value).unwrap();
        assert_eq!(back, index);
    }
}
