//! # sitedocs
//!
//! Indexes a documentation website into a searchable corpus and serves it
//! to agents over MCP and a JSON HTTP API.
//!
//! A build discovers page paths from the site's navigation, fetches each
//! page in turn, and normalizes its HTML into markdown with a title,
//! heading outline and category. Queries score pages and their
//! heading-delimited sections against free text.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌─────────────┐
//! │ Discovery  │──▶│ Normalize  │──▶│    Index    │──▶ JSON file
//! │ nav links  │   │ HTML → md  │   │ (immutable) │
//! └────────────┘   └────────────┘   └──────┬──────┘
//!                                          │ IndexCell (atomic swap)
//!                        ┌─────────────────┼─────────────────┐
//!                        ▼                 ▼                 ▼
//!                   ┌─────────┐      ┌──────────┐      ┌──────────┐
//!                   │   CLI   │      │ MCP stdio│      │   HTTP   │
//!                   └─────────┘      └──────────┘      │ + /mcp   │
//!                                                      └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! sitedocs index                    # scrape and save the index
//! sitedocs search "mcp servers"     # query the saved index
//! sitedocs serve mcp                # MCP over stdio
//! sitedocs serve http               # JSON API + MCP at /mcp
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Fetch and build errors |
//! | [`fetch`] | Page fetching |
//! | [`discovery`] | Page discovery from navigation |
//! | [`markdown`] | HTML to markdown conversion |
//! | [`normalize`] | HTML to [`models::Page`] |
//! | [`sections`] | Heading-delimited sections |
//! | [`score`] | Relevance scoring and snippets |
//! | [`search`] | Query operations |
//! | [`build`] | Index builds and the fallback index |
//! | [`store`] | JSON persistence |
//! | [`state`] | The shared index cell |
//! | [`render`] | Markdown text for results |
//! | [`tools`] | Agent-callable tools |
//! | [`mcp`] | MCP protocol bridge |
//! | [`server`] | HTTP server |

pub mod build;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fetch;
pub mod markdown;
pub mod mcp;
pub mod models;
pub mod normalize;
pub mod render;
pub mod score;
pub mod search;
pub mod sections;
pub mod server;
pub mod state;
pub mod store;
pub mod tools;
