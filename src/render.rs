//! Markdown text for query results.
//!
//! These strings are what agents read: MCP tool results, the `docs://index`
//! resource, and the CLI's stdout all come from here.

use chrono::SecondsFormat;
use std::fmt::Write;

use crate::models::{Index, Page, PageSummary, SearchResult};
use crate::search::{list_categories, search_by_category};

/// Shown when no index has been loaded or built.
pub const INDEX_UNAVAILABLE: &str = "Documentation index not available.";

/// Ranked search results, or a hint when nothing matched.
pub fn search_results(query: &str, results: &[SearchResult<'_>]) -> String {
    if results.is_empty() {
        return format!(
            "No results found for \"{}\". Try different keywords or browse by category.",
            query
        );
    }

    let formatted: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let sections: Vec<String> = result
                .matched_sections
                .iter()
                .map(|s| format!("  - {}", s.title))
                .collect();
            let sections = if sections.is_empty() {
                String::new()
            } else {
                format!("**Relevant sections:**\n{}", sections.join("\n"))
            };

            format!(
                "### {}. {}\n**URL:** {}\n**Category:** {}\n**Relevance:** {:.2}\n\n{}\n\n{}",
                i + 1,
                result.page.title,
                result.page.url,
                result.page.category,
                result.score,
                result.snippet,
                sections
            )
        })
        .collect();

    format!(
        "# Search Results for \"{}\"\n\nFound {} matching pages:\n\n{}",
        query,
        results.len(),
        formatted.join("\n\n---\n\n")
    )
}

/// Full page view with URL and category header.
pub fn page(page: &Page) -> String {
    format!(
        "# {}\n\n**URL:** {}\n**Category:** {}\n\n---\n\n{}",
        page.title, page.url, page.category, page.content
    )
}

/// Miss message for a page lookup, with suggestions when there are any.
pub fn page_not_found(input: &str, suggestions: &[PageSummary]) -> String {
    let listing = if suggestions.is_empty() {
        "No suggestions available.".to_string()
    } else {
        suggestions
            .iter()
            .map(|p| format!("  - {}: {}", p.path, p.title))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!("Page not found: {}\n\nDid you mean:\n{}", input, listing)
}

/// Pages of one category, or the list of valid categories on a miss.
pub fn category_pages(index: &Index, category: &str) -> String {
    let pages = search_by_category(index, category);
    if pages.is_empty() {
        let available: Vec<String> = list_categories(index)
            .iter()
            .map(|c| format!("  - {}", c))
            .collect();
        return format!(
            "No pages found in category \"{}\".\n\nAvailable categories:\n{}",
            category,
            available.join("\n")
        );
    }

    let list: Vec<String> = pages
        .iter()
        .map(|p| format!("- [{}]({})", p.title, p.url))
        .collect();
    format!("# {} Documentation\n\n{}", category, list.join("\n"))
}

/// Pages whose category is exactly `category`, in index order.
fn pages_in<'a>(index: &'a Index, category: &'a str) -> impl Iterator<Item = &'a Page> + 'a {
    index.pages.iter().filter(move |page| page.category == category)
}

/// Every category with its page count.
pub fn categories(index: &Index, site_name: &str) -> String {
    let info: Vec<String> = list_categories(index)
        .iter()
        .map(|c| {
            format!(
                "- **{}** ({} pages)",
                c,
                pages_in(index, c).count()
            )
        })
        .collect();
    format!(
        "# {} Documentation Categories\n\n{}\n\nUse `list_docs_by_category` to see pages in a specific category.",
        site_name,
        info.join("\n")
    )
}

/// Whole-site overview: metadata, then pages grouped by category.
pub fn browse(index: &Index, site_name: &str) -> String {
    let mut out = format!("# {} Documentation\n\n", site_name);
    let _ = writeln!(out, "**Base URL:** {}", index.base_url);
    let _ = writeln!(out, "**Total Pages:** {}", index.pages.len());
    let _ = writeln!(
        out,
        "**Last Updated:** {}\n",
        index.updated_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    );

    for category in list_categories(index) {
        let pages: Vec<&Page> = pages_in(index, &category).collect();
        let _ = writeln!(out, "## {} ({} pages)\n", category, pages.len());
        for page in pages {
            let _ = writeln!(out, "- [{}]({})", page.title, page.url);
        }
        out.push('\n');
    }
    out
}

/// Table of contents served as the `docs://index` resource.
pub fn index_toc(index: &Index, site_name: &str) -> String {
    let mut out = format!("# {} Documentation Index\n\n", site_name);
    for category in list_categories(index) {
        let _ = writeln!(out, "## {}\n", category);
        for page in pages_in(index, &category) {
            let _ = writeln!(out, "- [{}]({}) - `{}`", page.title, page.url, page.path);
        }
        out.push('\n');
    }
    out
}
