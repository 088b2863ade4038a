//! Page discovery from the documentation site's navigation.
//!
//! Discovery never fails outward: if the docs root cannot be fetched the
//! configured fallback path list is used instead. The docs root itself is
//! always part of the result.
//!
//! Paths are deduplicated by their normalized form while the first-seen
//! original href is kept as the value to fetch.

use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{info, warn};

use crate::config::SiteConfig;
use crate::fetch::Fetcher;

/// Links inside navigation regions, scanned first.
static NAV_LINKS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"nav a[href], aside a[href], [role="navigation"] a[href]"#)
        .expect("nav link selector")
});

/// Links inside the main content region, scanned second.
static MAIN_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("main a[href], article a[href]").expect("main link selector"));

/// Normalize a site-relative path for deduplication.
///
/// The docs root (with or without trailing slashes) becomes `<prefix>/`;
/// every other path loses its trailing slashes.
pub fn normalize_path(path: &str, docs_prefix: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    let root = docs_prefix.trim_end_matches('/');
    if trimmed == root {
        format!("{}/", root)
    } else {
        trimmed.to_string()
    }
}

/// Strip any `#fragment` and `?query` suffix from an href.
fn clean_href(href: &str) -> &str {
    let href = href.split('#').next().unwrap_or(href);
    href.split('?').next().unwrap_or(href)
}

/// Extract candidate doc hrefs from a page, navigation links first.
///
/// Only hrefs starting with `docs_prefix` are kept. Returned values are
/// cleaned of fragment and query but not normalized or deduplicated.
pub fn collect_doc_links(html: &str, docs_prefix: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    for selector in [&*NAV_LINKS, &*MAIN_LINKS] {
        for element in document.select(selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if href.starts_with(docs_prefix) {
                links.push(clean_href(href).to_string());
            }
        }
    }

    links
}

/// Ordered set of paths keyed by normalized form.
struct PathSet<'a> {
    docs_prefix: &'a str,
    seen: HashSet<String>,
    paths: Vec<String>,
}

impl<'a> PathSet<'a> {
    fn new(docs_prefix: &'a str) -> Self {
        Self {
            docs_prefix,
            seen: HashSet::new(),
            paths: Vec::new(),
        }
    }

    /// Insert `path` unless its normalized form is already present.
    fn insert(&mut self, path: &str) {
        let normalized = normalize_path(path, self.docs_prefix);
        if normalized.is_empty() {
            return;
        }
        if self.seen.insert(normalized) {
            self.paths.push(path.to_string());
        }
    }

    fn len(&self) -> usize {
        self.paths.len()
    }

    fn into_paths(self) -> Vec<String> {
        self.paths
    }
}

/// Discover every documentation page path reachable from the docs root.
pub async fn discover_pages(fetcher: &dyn Fetcher, site: &SiteConfig) -> Vec<String> {
    let mut paths = PathSet::new(&site.docs_prefix);
    paths.insert(&site.root_path());

    let root_url = site.docs_url();
    info!(url = %root_url, "discovering documentation pages from navigation");

    match fetcher.fetch(&root_url).await {
        Ok(html) => {
            for href in collect_doc_links(&html, &site.docs_prefix) {
                paths.insert(&href);
            }
            info!(pages = paths.len(), "discovered unique documentation pages");
        }
        Err(e) => {
            warn!(error = %e, "failed to discover pages, using fallback list");
            for path in &site.fallback_paths {
                paths.insert(path);
            }
        }
    }

    paths.into_paths()
}
