//! Query operations over an [`Index`] snapshot.
//!
//! All functions are read-only and borrow the index, so any number of
//! callers can run them concurrently against the same `Arc<Index>`.

use std::collections::BTreeSet;

use crate::models::{Index, Page, PageSummary, SearchResult};
use crate::score::{extract_snippet, score, SNIPPET_CONTEXT};
use crate::sections::extract_sections;

/// Default number of results for [`search`].
pub const DEFAULT_LIMIT: usize = 10;

/// Matched sections kept per result.
const MAX_MATCHED_SECTIONS: usize = 3;

/// Score every page against `query` and return the best `limit` matches.
///
/// Pages scoring zero or less are excluded. Each result carries up to three
/// positively scoring sections and a snippet. Ordering is by descending
/// score; ties keep index order.
pub fn search<'a>(index: &'a Index, query: &str, limit: usize) -> Vec<SearchResult<'a>> {
    let mut results: Vec<SearchResult<'a>> = index
        .pages
        .iter()
        .filter_map(|page| {
            let page_score = score(query, &page.content, &page.title);
            if page_score <= 0.0 {
                return None;
            }

            let matched_sections = extract_sections(page)
                .into_iter()
                .filter(|section| score(query, &section.content, &section.title) > 0.0)
                .take(MAX_MATCHED_SECTIONS)
                .collect();

            Some(SearchResult {
                score: page_score,
                page,
                matched_sections,
                snippet: extract_snippet(&page.content, query, SNIPPET_CONTEXT),
            })
        })
        .collect();

    // Stable sort keeps index order among equal scores.
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(limit);
    results
}

/// Pages whose category equals `category`, ignoring case.
pub fn search_by_category<'a>(index: &'a Index, category: &str) -> Vec<&'a Page> {
    let wanted = category.to_lowercase();
    index
        .pages
        .iter()
        .filter(|page| page.category.to_lowercase() == wanted)
        .collect()
}

/// Find a page by path, tolerating a missing leading slash and a trailing
/// slash difference.
pub fn get_page_by_path<'a>(index: &'a Index, path: &str) -> Option<&'a Page> {
    let wanted = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    let with_slash = format!("{}/", wanted);
    let bare = strip_one_slash(&wanted);

    index.pages.iter().find(|page| {
        page.path == wanted || page.path == with_slash || strip_one_slash(&page.path) == bare
    })
}

fn strip_one_slash(path: &str) -> &str {
    path.strip_suffix('/').unwrap_or(path)
}

/// Pages offered when a lookup misses.
const MAX_SUGGESTIONS: usize = 5;

/// Turn user input into a lookup path under `docs_prefix`.
///
/// Input that does not already start with the prefix is treated as relative
/// to it: `config` and `/config` both become `/docs/config`.
pub fn resolve_doc_path(input: &str, docs_prefix: &str) -> String {
    let prefix = docs_prefix.trim_end_matches('/');
    if input.starts_with(prefix) {
        return input.to_string();
    }
    let relative = input.strip_prefix('/').unwrap_or(input);
    format!("{}/{}", prefix, relative)
}

/// Up to five pages whose path contains the last segment of `input`.
pub fn suggest_pages(index: &Index, input: &str) -> Vec<PageSummary> {
    let needle = input.rsplit('/').next().unwrap_or("");
    list_all_pages(index)
        .into_iter()
        .filter(|page| page.path.contains(needle))
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Distinct categories in sorted order.
pub fn list_categories(index: &Index) -> Vec<String> {
    index
        .pages
        .iter()
        .map(|page| page.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Path, title and category of every page, in index order.
pub fn list_all_pages(index: &Index) -> Vec<PageSummary> {
    index
        .pages
        .iter()
        .map(|page| PageSummary {
            path: page.path.clone(),
            title: page.title.clone(),
            category: page.category.clone(),
        })
        .collect()
}
