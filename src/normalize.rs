//! Page normalization: raw HTML to a [`Page`].
//!
//! Owns the content-container priority, the minimum-length acceptance rule,
//! markdown whitespace cleanup, title and heading extraction, and page
//! categorization. Element-level conversion lives in [`crate::markdown`].

use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::config::SiteConfig;
use crate::fetch::Fetcher;
use crate::markdown;
use crate::models::{derive_heading_id, Heading, Page};

/// Category for the docs root and single-segment paths.
pub const ROOT_CATEGORY: &str = "Getting Started";

/// Category for slugs missing from the lookup table.
pub const DEFAULT_CATEGORY: &str = "General";

/// Content containers, tried in order.
pub const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    ".content",
    ".docs-content",
    r#"[role="main"]"#,
    ".markdown-body",
];

/// A container is accepted once its markdown is longer than this.
const MIN_CONTENT_CHARS: usize = 100;

static CONTENT: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    CONTENT_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("content selector"))
        .collect()
});

static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").expect("body selector"));

static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").expect("h1 selector"));

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("title selector"));

static HEADINGS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6").expect("heading selector")
});

static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank line regex"));

/// Fetch `path` and normalize it. Any failure is logged and yields `None`.
pub async fn scrape_page(fetcher: &dyn Fetcher, path: &str, site: &SiteConfig) -> Option<Page> {
    let url = site.page_url(path);
    debug!(url = %url, "scraping");

    match fetcher.fetch(&url).await {
        Ok(html) => Some(normalize_html(path, &html, site, Utc::now())),
        Err(e) => {
            warn!(url = %url, error = %e, "failed to scrape page");
            None
        }
    }
}

/// Build a [`Page`] from already-fetched HTML.
pub fn normalize_html(path: &str, html: &str, site: &SiteConfig, scraped_at: DateTime<Utc>) -> Page {
    let document = Html::parse_document(html);

    Page {
        path: path.to_string(),
        title: extract_title(&document, path, &site.title_suffix),
        url: site.page_url(path),
        content: extract_content(&document),
        headings: extract_headings(&document),
        category: categorize(path, &site.categories),
        scraped_at,
    }
}

/// Markdown of the first content container that is long enough, else of the
/// whole body.
fn extract_content(document: &Html) -> String {
    for selector in CONTENT.iter() {
        if document.select(selector).next().is_none() {
            continue;
        }
        let content = tidy_markdown(&markdown::convert(document, selector));
        if content.chars().count() > MIN_CONTENT_CHARS {
            return content;
        }
    }
    tidy_markdown(&markdown::convert(document, &BODY))
}

/// Collapse runs of three or more newlines to two and trim both ends.
pub fn tidy_markdown(markdown: &str) -> String {
    BLANK_LINES.replace_all(markdown, "\n\n").trim().to_string()
}

/// First `h1`, else `<title>` minus the site suffix, else the last path
/// segment, else `"Untitled"`.
fn extract_title(document: &Html, path: &str, title_suffix: &str) -> String {
    if let Some(h1) = document.select(&H1).next() {
        let text = markdown::visible_text(h1);
        let text = text.trim();
        if !text.is_empty() {
            return text.to_string();
        }
    }

    if let Some(title) = document.select(&TITLE).next() {
        let text = markdown::visible_text(title);
        let text = if title_suffix.is_empty() {
            text
        } else {
            text.replacen(title_suffix, "", 1)
        };
        let text = text.trim();
        if !text.is_empty() {
            return text.to_string();
        }
    }

    match path.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment.to_string(),
        _ => "Untitled".to_string(),
    }
}

/// Every non-empty `h1`-`h6` in document order.
fn extract_headings(document: &Html) -> Vec<Heading> {
    document
        .select(&HEADINGS)
        .filter_map(|el| {
            let level = el.value().name()[1..].parse::<u8>().ok()?;
            let text = markdown::visible_text(el).trim().to_string();
            if text.is_empty() {
                return None;
            }
            let id = match el.value().attr("id") {
                Some(id) if !id.is_empty() => id.to_string(),
                _ => derive_heading_id(&text),
            };
            Some(Heading { level, text, id })
        })
        .collect()
}

/// Map a page path to its category via the second path segment.
pub fn categorize(path: &str, categories: &HashMap<String, String>) -> String {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    if parts.len() <= 1 {
        return ROOT_CATEGORY.to_string();
    }

    categories
        .get(parts[1])
        .cloned()
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}
