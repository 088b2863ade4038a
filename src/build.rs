//! Index builds.
//!
//! A build is one sequential pass: discover page paths, then fetch and
//! normalize each page with a fixed pause between requests. Pages that fail
//! are skipped; a pass that yields nothing is a [`BuildError::NoPages`].

use chrono::Utc;
use std::time::Duration;
use tracing::info;

use crate::config::{Config, SiteConfig};
use crate::discovery::discover_pages;
use crate::error::BuildError;
use crate::fetch::Fetcher;
use crate::models::{derive_heading_id, Heading, Index, Page};
use crate::normalize::{scrape_page, DEFAULT_CATEGORY};

/// Version stamped on every index produced by [`build_index`].
pub const INDEX_VERSION: &str = "1.0.0";

/// Version stamped on the embedded cold-start index.
pub const FALLBACK_VERSION: &str = "1.0.0-fallback";

/// Run a full discovery and scrape pass.
///
/// Pages are fetched one at a time, pausing `index.request_delay_ms` after
/// each request whether or not it succeeded.
pub async fn build_index(fetcher: &dyn Fetcher, config: &Config) -> Result<Index, BuildError> {
    let site = &config.site;
    let paths = discover_pages(fetcher, site).await;
    let delay = Duration::from_millis(config.index.request_delay_ms);

    let mut pages = Vec::with_capacity(paths.len());
    for path in &paths {
        if let Some(page) = scrape_page(fetcher, path, site).await {
            pages.push(page);
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    if pages.is_empty() {
        return Err(BuildError::NoPages {
            discovered: paths.len(),
        });
    }

    info!(
        pages = pages.len(),
        discovered = paths.len(),
        "built documentation index"
    );

    Ok(Index {
        pages,
        version: INDEX_VERSION.to_string(),
        updated_at: Utc::now(),
        base_url: site.docs_url(),
    })
}

/// Minimal single-page index used when the first build fails and nothing
/// has been loaded yet.
pub fn fallback_index(site: &SiteConfig) -> Index {
    let now = Utc::now();
    let path = site.root_path();
    let url = site.page_url(&path);
    let title = format!("{} Documentation", site.name);
    let live = "Live documentation";

    let content = format!(
        "# {title}\n\n\
         The full {name} documentation index is not available yet.\n\n\
         ## {live}\n\n\
         Browse the documentation directly at {url}\n\n\
         Run `sitedocs index` to build the complete index.",
        title = title,
        name = site.name,
        live = live,
        url = url,
    );

    let headings = vec![
        Heading {
            level: 1,
            id: derive_heading_id(&title),
            text: title.clone(),
        },
        Heading {
            level: 2,
            id: derive_heading_id(live),
            text: live.to_string(),
        },
    ];

    Index {
        pages: vec![Page {
            path,
            title,
            url,
            content,
            headings,
            category: DEFAULT_CATEGORY.to_string(),
            scraped_at: now,
        }],
        version: FALLBACK_VERSION.to_string(),
        updated_at: now,
        base_url: site.docs_url(),
    }
}
