//! HTTP API tests against a live listener on an ephemeral port.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use sitedocs::config::Config;
use sitedocs::error::FetchError;
use sitedocs::fetch::Fetcher;
use sitedocs::models::Index;
use sitedocs::normalize::normalize_html;
use sitedocs::server::{router, AppState};
use sitedocs::state::IndexCell;
use sitedocs::tools::ToolRegistry;

/// Refuses every request; the held index is fresh so nothing should fetch.
struct Offline;

#[async_trait]
impl Fetcher for Offline {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        Err(FetchError::Status {
            url: url.to_string(),
            status: 503,
        })
    }
}

fn fixture_index(config: &Config) -> Index {
    let site = &config.site;
    let pages = [
        (
            "/docs/",
            "<main><h1>Intro</h1><p>OpenCode is an AI coding agent built for the terminal.</p></main>",
        ),
        (
            "/docs/mcp-servers/",
            "<main><h1>MCP servers</h1><p>Add tools with the Model Context Protocol.</p>\
             <h2>Local</h2><p>Local MCP servers run a command.</p>\
             <h2>Remote</h2><p>Remote MCP servers use a url.</p></main>",
        ),
        (
            "/docs/agents",
            "<main><h1>Agents</h1><p>Agents are specialized assistants with their own prompts.</p></main>",
        ),
    ];

    Index {
        pages: pages
            .iter()
            .map(|(path, html)| normalize_html(path, html, site, Utc::now()))
            .collect(),
        version: "1.0.0".to_string(),
        updated_at: Utc::now(),
        base_url: site.docs_url(),
    }
}

/// Start the router on 127.0.0.1:0 and return its base URL.
async fn spawn_server() -> String {
    let config = Arc::new(Config::default());
    let index = fixture_index(&config);
    let cell = Arc::new(IndexCell::with_index(Arc::new(Offline), config, index));
    let app = router(AppState::new(cell, Arc::new(ToolRegistry::with_builtins())));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn get_json(url: &str) -> (u16, Value) {
    let resp = reqwest::get(url).await.unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn test_health() {
    let base = spawn_server().await;
    let (status, body) = get_json(&format!("{}/health", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["pages"], 3);
    assert!(body["lastUpdated"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_info_lists_endpoints() {
    let base = spawn_server().await;
    let (status, body) = get_json(&format!("{}/", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["name"], "sitedocs");
    assert!(body["endpoints"]["/mcp"].is_string());
}

#[tokio::test]
async fn test_search_requires_query() {
    let base = spawn_server().await;
    let (status, body) = get_json(&format!("{}/search", base)).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "bad_request");
    assert_eq!(body["error"]["message"], "missing query parameter: q");

    let (status, _) = get_json(&format!("{}/search?q=", base)).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_search_results() {
    let base = spawn_server().await;
    let (status, body) = get_json(&format!("{}/search?q=remote%20mcp&limit=abc", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["query"], "remote mcp");
    assert_eq!(body["results"][0]["path"], "/docs/mcp-servers/");
    assert_eq!(body["results"][0]["category"], "Configure");
    assert!(body["results"][0]["score"].as_f64().unwrap() > 0.0);
    assert_eq!(
        body["count"].as_u64().unwrap() as usize,
        body["results"].as_array().unwrap().len()
    );

    let (_, body) = get_json(&format!("{}/search?q=zzzz", base)).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_page_lookup() {
    let base = spawn_server().await;
    let (status, body) = get_json(&format!("{}/page?path=/docs/agents/", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["title"], "Agents");
    assert_eq!(body["url"], "https://opencode.ai/docs/agents");
    assert!(body["scrapedAt"].is_i64());

    let (status, body) = get_json(&format!("{}/page?path=/docs/missing", base)).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "not_found");
    assert_eq!(body["error"]["message"], "page not found: /docs/missing");

    let (status, _) = get_json(&format!("{}/page", base)).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_list_and_categories() {
    let base = spawn_server().await;
    let (_, body) = get_json(&format!("{}/list", base)).await;
    assert_eq!(body["count"], 3);
    assert_eq!(body["pages"][1]["path"], "/docs/mcp-servers/");

    let (_, body) = get_json(&format!("{}/categories", base)).await;
    assert_eq!(
        body["categories"],
        json!([
            { "name": "Configure", "pages": 2 },
            { "name": "Getting Started", "pages": 1 }
        ])
    );
}

#[tokio::test]
async fn test_tools_list() {
    let base = spawn_server().await;
    let (status, body) = get_json(&format!("{}/tools/list", base)).await;
    assert_eq!(status, 200);
    let names: Vec<&str> = body["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "search_docs",
            "get_doc_page",
            "list_docs_by_category",
            "list_doc_categories",
            "browse_docs"
        ]
    );
    assert_eq!(body["tools"][0]["builtin"], true);
}

#[tokio::test]
async fn test_tool_call() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/tools/search_docs", base))
        .json(&json!({ "query": "agents" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    let text = body["result"].as_str().unwrap();
    assert!(text.starts_with("# Search Results for \"agents\""));
    assert!(text.contains("**URL:** https://opencode.ai/docs/agents"));

    let resp = client
        .post(format!("{}/tools/get_doc_page", base))
        .json(&json!({ "path": "mcp-servers" }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["result"].as_str().unwrap().starts_with("# MCP servers"));
}

#[tokio::test]
async fn test_tool_call_errors() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/tools/search_docs", base))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let resp = client
        .post(format!("{}/tools/search_docs", base))
        .json(&json!({ "query": 42 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let resp = client
        .post(format!("{}/tools/nope", base))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let base = spawn_server().await;
    let (status, body) = get_json(&format!("{}/nowhere", base)).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "not_found");
}
