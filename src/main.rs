//! # sitedocs CLI
//!
//! Builds a documentation index and serves it to agents.
//!
//! ## Usage
//!
//! ```bash
//! sitedocs --config ./config/sitedocs.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sitedocs index` | Scrape the site and save the index |
//! | `sitedocs search "<query>"` | Search the saved index |
//! | `sitedocs get <path>` | Print one page |
//! | `sitedocs categories` | Categories with page counts |
//! | `sitedocs list` | Browse all pages, or one category with `--category` |
//! | `sitedocs serve mcp` | MCP server over stdio |
//! | `sitedocs serve http` | HTTP API with MCP at `/mcp` |
//!
//! Query commands read the saved index only and never scrape.
//! Logs go to stderr; set `RUST_LOG` to change the level.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use sitedocs::build::build_index;
use sitedocs::config::{self, Config};
use sitedocs::fetch::HttpFetcher;
use sitedocs::mcp;
use sitedocs::server;
use sitedocs::state::IndexCell;
use sitedocs::store::{load_index, save_index};
use sitedocs::tools::{ToolContext, ToolRegistry, DEFAULT_TOOL_LIMIT};

/// Documentation site indexer and MCP server.
///
/// All commands accept `--config` pointing to a TOML file. When the file
/// does not exist the built-in defaults are used.
#[derive(Parser)]
#[command(
    name = "sitedocs",
    about = "Index a documentation site and serve it to agents over MCP",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/sitedocs.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the documentation site and save the index.
    ///
    /// Discovers pages from the site navigation and fetches them one at a
    /// time with the configured delay between requests.
    Index {
        /// Write the index here instead of `[index].path`.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Search the saved index.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results to return.
        #[arg(long, default_value_t = DEFAULT_TOOL_LIMIT)]
        limit: usize,
    },

    /// Print a page by path (e.g. `/docs/config` or `config`).
    Get {
        path: String,
    },

    /// List categories with page counts.
    Categories,

    /// Browse every page, grouped by category.
    List {
        /// Only list pages in this category (case-insensitive).
        #[arg(long)]
        category: Option<String>,
    },

    /// Start a server.
    Serve {
        #[command(subcommand)]
        service: ServeService,
    },
}

#[derive(Subcommand)]
enum ServeService {
    /// MCP over stdin/stdout.
    ///
    /// Loads the saved index (building it first when there is none) and
    /// refreshes it when it goes stale.
    Mcp,
    /// JSON HTTP API plus MCP Streamable HTTP at `/mcp`.
    ///
    /// Binds to `[server].bind`.
    Http,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = Arc::new(config::load_or_default(&cli.config)?);

    match cli.command {
        Commands::Index { output } => {
            let fetcher = HttpFetcher::new(&cfg.fetch)?;
            let index = build_index(&fetcher, &cfg).await?;
            let path = output.unwrap_or_else(|| cfg.index.path.clone());
            save_index(&index, &path)?;
            println!("Indexed {} pages to {}", index.pages.len(), path.display());
        }
        Commands::Search { query, limit } => {
            let text = run_query(&cfg, "search_docs", json!({ "query": query, "limit": limit })).await?;
            println!("{}", text);
        }
        Commands::Get { path } => {
            let text = run_query(&cfg, "get_doc_page", json!({ "path": path })).await?;
            println!("{}", text);
        }
        Commands::Categories => {
            let text = run_query(&cfg, "list_doc_categories", json!({})).await?;
            println!("{}", text);
        }
        Commands::List { category } => {
            let text = match category {
                Some(category) => {
                    run_query(&cfg, "list_docs_by_category", json!({ "category": category }))
                        .await?
                }
                None => run_query(&cfg, "browse_docs", json!({})).await?,
            };
            println!("{}", text);
        }
        Commands::Serve { service } => {
            let fetcher = Arc::new(HttpFetcher::new(&cfg.fetch)?);
            let cell = Arc::new(IndexCell::new(fetcher, cfg.clone()));
            match service {
                ServeService::Mcp => mcp::serve_stdio(cell).await?,
                ServeService::Http => {
                    cell.load_persisted();
                    server::run_server(cell).await?;
                }
            }
        }
    }

    Ok(())
}

/// Run a built-in tool against the saved index and return its text.
async fn run_query(cfg: &Arc<Config>, tool: &str, params: Value) -> Result<String> {
    let path = &cfg.index.path;
    let Some(index) = load_index(path) else {
        bail!(
            "No documentation index at {}. Run `sitedocs index` first.",
            path.display()
        );
    };

    let fetcher = Arc::new(HttpFetcher::new(&cfg.fetch)?);
    let cell = Arc::new(IndexCell::with_index(fetcher, cfg.clone(), index));
    let ctx = ToolContext::read_only(cell);

    let registry = ToolRegistry::with_builtins();
    let Some(tool) = registry.find(tool) else {
        bail!("unknown tool: {}", tool);
    };
    let result = tool.execute(params, &ctx).await?;
    Ok(match result {
        Value::String(text) => text,
        other => serde_json::to_string_pretty(&other)?,
    })
}
