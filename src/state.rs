//! The process-wide index cell.
//!
//! [`IndexCell`] owns the one mutable piece of state in a serving process:
//! the current [`Index`] snapshot. Readers get an `Arc<Index>` and keep it
//! for as long as they like; a refresh builds a complete new index before
//! swapping it in, so nobody ever observes a partial build.
//!
//! Refresh policy:
//!
//! - no index held: build and wait for it (cold start)
//! - index older than `stale_after_hours`: keep serving it and rebuild in a
//!   detached task
//! - build failure: keep the previous index; on cold start install
//!   [`fallback_index`]
//!
//! Only one build runs at a time.

use chrono::{Duration, Utc};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::build::{build_index, fallback_index};
use crate::config::Config;
use crate::error::BuildError;
use crate::fetch::Fetcher;
use crate::models::Index;
use crate::store::{load_index, save_index};

pub struct IndexCell {
    current: RwLock<Option<Arc<Index>>>,
    refresh_lock: Mutex<()>,
    fetcher: Arc<dyn Fetcher>,
    config: Arc<Config>,
}

impl IndexCell {
    /// An empty cell. Nothing is loaded or fetched until asked.
    pub fn new(fetcher: Arc<dyn Fetcher>, config: Arc<Config>) -> Self {
        Self {
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            fetcher,
            config,
        }
    }

    /// A cell pre-populated with `index`.
    pub fn with_index(fetcher: Arc<dyn Fetcher>, config: Arc<Config>, index: Index) -> Self {
        let cell = Self::new(fetcher, config);
        cell.replace(index);
        cell
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The currently held index, if any.
    pub fn snapshot(&self) -> Option<Arc<Index>> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Swap in a new index and return it.
    pub fn replace(&self, index: Index) -> Arc<Index> {
        let index = Arc::new(index);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(index.clone());
        index
    }

    /// True when no index is held or the held one has outlived the
    /// configured staleness threshold.
    pub fn is_stale(&self) -> bool {
        match self.snapshot() {
            Some(index) => is_expired(&index, &self.config),
            None => true,
        }
    }

    /// Load the persisted index from `index.path` into the cell.
    pub fn load_persisted(&self) -> Option<Arc<Index>> {
        let path = &self.config.index.path;
        let index = load_index(path)?;
        let age_hours = index.age(Utc::now()).num_minutes() as f64 / 60.0;
        info!(
            path = %path.display(),
            pages = index.pages.len(),
            age_hours = %format!("{:.1}", age_hours),
            "loaded docs index"
        );
        Some(self.replace(index))
    }

    /// Rebuild the index now, waiting for any build already in flight.
    ///
    /// On failure the held index is kept (or the fallback installed if the
    /// cell was empty) and the build error is returned.
    pub async fn refresh(&self) -> Result<Arc<Index>, BuildError> {
        let _guard = self.refresh_lock.lock().await;
        self.rebuild().await
    }

    /// Return an index that is fresh enough to serve.
    ///
    /// Waits for a build only when the cell is empty. A stale index is
    /// returned immediately while a detached task rebuilds it.
    pub async fn ensure_fresh(self: &Arc<Self>) -> Arc<Index> {
        if let Some(index) = self.snapshot() {
            if is_expired(&index, &self.config) {
                self.spawn_refresh();
            }
            return index;
        }

        let _guard = self.refresh_lock.lock().await;
        // Another caller may have finished a build while we waited.
        if let Some(index) = self.snapshot() {
            return index;
        }
        info!("no index held, building before serving");
        match self.rebuild().await {
            Ok(index) => index,
            Err(_) => match self.snapshot() {
                Some(index) => index,
                None => self.replace(fallback_index(&self.config.site)),
            },
        }
    }

    /// Startup: load the persisted index, then refresh it in the background
    /// when stale, or build it in the foreground when absent.
    pub async fn warm_start(self: &Arc<Self>) -> Arc<Index> {
        match self.load_persisted() {
            Some(index) => {
                if is_expired(&index, &self.config) {
                    info!("index is stale, refreshing in background");
                    self.spawn_refresh();
                }
                index
            }
            None => {
                info!("no persisted index found, scraping docs");
                self.ensure_fresh().await
            }
        }
    }

    /// Start a detached rebuild unless one is already running.
    fn spawn_refresh(self: &Arc<Self>) {
        let cell = Arc::clone(self);
        tokio::spawn(async move {
            let Ok(_guard) = cell.refresh_lock.try_lock() else {
                return;
            };
            if cell.is_stale() {
                let _ = cell.rebuild().await;
            }
        });
    }

    /// Build, persist and swap. Callers hold `refresh_lock`.
    async fn rebuild(&self) -> Result<Arc<Index>, BuildError> {
        match build_index(self.fetcher.as_ref(), &self.config).await {
            Ok(index) => {
                if self.config.index.persist {
                    if let Err(e) = save_index(&index, &self.config.index.path) {
                        warn!(error = %e, "failed to persist refreshed index");
                    }
                }
                info!(pages = index.pages.len(), "refreshed index");
                Ok(self.replace(index))
            }
            Err(e) => {
                warn!(error = %e, "failed to refresh index");
                if self.snapshot().is_none() {
                    self.replace(fallback_index(&self.config.site));
                }
                Err(e)
            }
        }
    }
}

fn is_expired(index: &Index, config: &Config) -> bool {
    index.age(Utc::now()) > staleness_threshold(config.index.stale_after_hours)
}

/// `hours` as a duration, saturating at [`Duration::MAX`].
fn staleness_threshold(hours: u64) -> Duration {
    i64::try_from(hours)
        .ok()
        .and_then(Duration::try_hours)
        .unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Serves canned HTML by URL and counts requests.
    struct MapFetcher {
        pages: HashMap<String, String>,
        calls: AtomicUsize,
    }

    impl MapFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, html)| (url.to_string(), html.to_string()))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Fetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pages.get(url).cloned().ok_or(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    fn config(tmp: &TempDir) -> Arc<Config> {
        let mut config = Config::default();
        config.index.path = tmp.path().join("index.json");
        config.index.request_delay_ms = 0;
        Arc::new(config)
    }

    fn live_site() -> MapFetcher {
        MapFetcher::new(&[
            (
                "https://opencode.ai/docs",
                r#"<html><body><nav><a href="/docs/agents">Agents</a></nav><main><h1>Intro</h1><p>Welcome.</p></main></body></html>"#,
            ),
            (
                "https://opencode.ai/docs/",
                "<html><body><main><h1>Intro</h1><p>Welcome.</p></main></body></html>",
            ),
            (
                "https://opencode.ai/docs/agents",
                "<html><body><main><h1>Agents</h1><p>Configure agents.</p></main></body></html>",
            ),
        ])
    }

    fn aged(index: Index, hours: i64) -> Index {
        Index {
            updated_at: Utc::now() - Duration::hours(hours),
            ..index
        }
    }

    #[tokio::test]
    async fn test_empty_cell_builds_on_first_use() {
        let tmp = TempDir::new().unwrap();
        let cell = Arc::new(IndexCell::new(Arc::new(live_site()), config(&tmp)));
        assert!(cell.snapshot().is_none());
        assert!(cell.is_stale());

        let index = cell.ensure_fresh().await;
        assert_eq!(index.version, "1.0.0");
        assert_eq!(index.pages.len(), 2);
        assert!(!cell.is_stale());
        assert!(tmp.path().join("index.json").exists());
    }

    #[tokio::test]
    async fn test_cold_start_failure_installs_fallback() {
        let tmp = TempDir::new().unwrap();
        let cell = Arc::new(IndexCell::new(Arc::new(MapFetcher::new(&[])), config(&tmp)));

        let index = cell.ensure_fresh().await;
        assert_eq!(index.version, "1.0.0-fallback");
        assert!(!tmp.path().join("index.json").exists());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_index() {
        let tmp = TempDir::new().unwrap();
        let previous = fallback_index(&Config::default().site);
        let previous = Index {
            version: "previous".to_string(),
            ..previous
        };
        let cell = IndexCell::with_index(Arc::new(MapFetcher::new(&[])), config(&tmp), previous);

        let result = cell.refresh().await;
        assert!(matches!(result, Err(BuildError::NoPages { .. })));
        assert_eq!(cell.snapshot().unwrap().version, "previous");
    }

    #[tokio::test]
    async fn test_fresh_index_is_served_without_fetching() {
        let tmp = TempDir::new().unwrap();
        let fetcher = Arc::new(live_site());
        let index = fallback_index(&Config::default().site);
        let cell = Arc::new(IndexCell::with_index(fetcher.clone(), config(&tmp), index));

        let served = cell.ensure_fresh().await;
        assert_eq!(served.version, "1.0.0-fallback");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stale_index_served_then_replaced() {
        let tmp = TempDir::new().unwrap();
        let stale = aged(fallback_index(&Config::default().site), 48);
        let cell = Arc::new(IndexCell::with_index(Arc::new(live_site()), config(&tmp), stale));
        assert!(cell.is_stale());

        let served = cell.ensure_fresh().await;
        assert_eq!(served.version, "1.0.0-fallback");

        // Yield until the detached rebuild swaps the index.
        for _ in 0..100 {
            if !cell.is_stale() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(cell.snapshot().unwrap().version, "1.0.0");
    }

    #[tokio::test]
    async fn test_warm_start_loads_persisted_index() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);
        let fetcher = Arc::new(live_site());
        save_index(&fallback_index(&config.site), &config.index.path).unwrap();

        let cell = Arc::new(IndexCell::new(fetcher.clone(), config));
        let index = cell.warm_start().await;
        assert_eq!(index.version, "1.0.0-fallback");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_persist_disabled_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let mut config = (*config(&tmp)).clone();
        config.index.persist = false;
        let cell = IndexCell::new(Arc::new(live_site()), Arc::new(config));

        cell.refresh().await.unwrap();
        assert!(!tmp.path().join("index.json").exists());
    }

    #[test]
    fn test_staleness_threshold_saturates() {
        assert_eq!(staleness_threshold(24), Duration::hours(24));
        assert_eq!(staleness_threshold(3_000_000_000_000_000), Duration::MAX);
        assert_eq!(staleness_threshold(u64::MAX), Duration::MAX);
    }

    #[test]
    fn test_huge_threshold_keeps_fresh_index_fresh() {
        let tmp = TempDir::new().unwrap();
        let mut config = (*config(&tmp)).clone();
        config.index.stale_after_hours = u64::MAX;
        let index = fallback_index(&config.site);
        let cell = IndexCell::with_index(Arc::new(MapFetcher::new(&[])), Arc::new(config), index);
        assert!(!cell.is_stale());
    }
}
