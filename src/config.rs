//! TOML configuration.
//!
//! Every section is optional. A missing config file is not an error: the
//! binary falls back to [`Config::minimal`], which targets the OpenCode
//! documentation site.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `[index].path`.
pub const INDEX_PATH_ENV: &str = "SITEDOCS_INDEX";

/// Upper bound for `[index].stale_after_hours` (one hundred years).
pub const MAX_STALE_AFTER_HOURS: u64 = 24 * 365 * 100;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_docs_prefix")]
    pub docs_prefix: String,
    #[serde(default = "default_site_name")]
    pub name: String,
    #[serde(default = "default_title_suffix")]
    pub title_suffix: String,
    /// Paths indexed when the docs root cannot be fetched.
    #[serde(default = "default_fallback_paths")]
    pub fallback_paths: Vec<String>,
    /// Second path segment (slug) to category name.
    #[serde(default = "default_categories")]
    pub categories: HashMap<String, String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            docs_prefix: default_docs_prefix(),
            name: default_site_name(),
            title_suffix: default_title_suffix(),
            fallback_paths: default_fallback_paths(),
            categories: default_categories(),
        }
    }
}

impl SiteConfig {
    /// The docs root in its canonical trailing-slash form, e.g. `/docs/`.
    pub fn root_path(&self) -> String {
        format!("{}/", self.docs_prefix.trim_end_matches('/'))
    }

    /// Absolute URL of the docs root without trailing slash.
    pub fn docs_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.docs_prefix.trim_end_matches('/')
        )
    }

    /// Absolute URL for a site-relative path.
    pub fn page_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

fn default_base_url() -> String {
    "https://opencode.ai".to_string()
}
fn default_docs_prefix() -> String {
    "/docs".to_string()
}
fn default_site_name() -> String {
    "OpenCode".to_string()
}
fn default_title_suffix() -> String {
    " | OpenCode".to_string()
}
fn default_fallback_paths() -> Vec<String> {
    [
        "/docs/config",
        "/docs/providers",
        "/docs/network",
        "/docs/enterprise",
        "/docs/troubleshooting",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

fn default_categories() -> HashMap<String, String> {
    const TABLE: &[(&str, &str)] = &[
        ("config", "Getting Started"),
        ("providers", "Getting Started"),
        ("network", "Getting Started"),
        ("enterprise", "Getting Started"),
        ("troubleshooting", "Getting Started"),
        ("1-0", "Getting Started"),
        ("tui", "Usage"),
        ("cli", "Usage"),
        ("web", "Usage"),
        ("ide", "Usage"),
        ("zen", "Usage"),
        ("share", "Usage"),
        ("github", "Usage"),
        ("gitlab", "Usage"),
        ("tools", "Configure"),
        ("rules", "Configure"),
        ("agents", "Configure"),
        ("models", "Configure"),
        ("themes", "Configure"),
        ("keybinds", "Configure"),
        ("commands", "Configure"),
        ("formatters", "Configure"),
        ("permissions", "Configure"),
        ("lsp", "Configure"),
        ("mcp-servers", "Configure"),
        ("acp", "Configure"),
        ("skills", "Configure"),
        ("custom-tools", "Configure"),
        ("sdk", "Develop"),
        ("server", "Develop"),
        ("plugins", "Develop"),
        ("ecosystem", "Develop"),
    ];
    TABLE
        .iter()
        .map(|(slug, category)| (slug.to_string(), category.to_string()))
        .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_index_path")]
    pub path: PathBuf,
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: u64,
    /// Pause between page fetches during a build.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    /// Mirror every refreshed index to `path`.
    #[serde(default = "default_persist")]
    pub persist: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
            stale_after_hours: default_stale_after_hours(),
            request_delay_ms: default_request_delay_ms(),
            persist: default_persist(),
        }
    }
}

fn default_index_path() -> PathBuf {
    PathBuf::from("./data/docs-index.json")
}
fn default_stale_after_hours() -> u64 {
    24
}
fn default_request_delay_ms() -> u64 {
    300
}
fn default_persist() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    format!("sitedocs/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

impl Config {
    /// Built-in defaults, used when no config file exists.
    pub fn minimal() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var(INDEX_PATH_ENV) {
            if !path.trim().is_empty() {
                self.index.path = PathBuf::from(path);
            }
        }
    }
}

/// Load and validate a config file; fall back to [`Config::minimal`] when
/// `path` does not exist.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::minimal())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.apply_env();
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let base = &config.site.base_url;
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        bail!("site.base_url must start with http:// or https://, got '{}'", base);
    }

    if !config.site.docs_prefix.starts_with('/') {
        bail!(
            "site.docs_prefix must start with '/', got '{}'",
            config.site.docs_prefix
        );
    }

    if config.index.stale_after_hours == 0 {
        bail!("index.stale_after_hours must be > 0");
    }

    if config.index.stale_after_hours > MAX_STALE_AFTER_HOURS {
        bail!(
            "index.stale_after_hours must be <= {}, got {}",
            MAX_STALE_AFTER_HOURS,
            config.index.stale_after_hours
        );
    }

    if config.fetch.timeout_secs == 0 {
        bail!("fetch.timeout_secs must be > 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_src)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.site.docs_prefix, "/docs");
        assert_eq!(config.index.stale_after_hours, 24);
        assert_eq!(config.index.request_delay_ms, 300);
        assert_eq!(
            config.site.categories.get("mcp-servers").map(String::as_str),
            Some("Configure")
        );
    }

    #[test]
    fn test_site_urls() {
        let config = parse(
            r#"
[site]
base_url = "https://example.com/"
docs_prefix = "/guide/"
"#,
        )
        .unwrap();
        assert_eq!(config.site.root_path(), "/guide/");
        assert_eq!(config.site.docs_url(), "https://example.com/guide");
        assert_eq!(
            config.site.page_url("/guide/intro"),
            "https://example.com/guide/intro"
        );
    }

    #[test]
    fn test_custom_categories_replace_defaults() {
        let config = parse(
            r#"
[site.categories]
intro = "Basics"
"#,
        )
        .unwrap();
        assert_eq!(config.site.categories.len(), 1);
        assert_eq!(config.site.categories["intro"], "Basics");
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let err = parse("[site]\nbase_url = \"opencode.ai\"").unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_rejects_relative_prefix() {
        let err = parse("[site]\ndocs_prefix = \"docs\"").unwrap_err();
        assert!(err.to_string().contains("docs_prefix"));
    }

    #[test]
    fn test_rejects_zero_staleness() {
        assert!(parse("[index]\nstale_after_hours = 0").is_err());
    }

    #[test]
    fn test_rejects_huge_staleness() {
        let err = parse("[index]\nstale_after_hours = 3000000000000000").unwrap_err();
        assert!(err.to_string().contains("stale_after_hours"));
        assert!(parse("[index]\nstale_after_hours = 876000").is_ok());
        assert!(parse("[index]\nstale_after_hours = 876001").is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = load_or_default(&tmp.path().join("nope.toml")).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:3000");
    }
}
