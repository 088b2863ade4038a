//! HTTP server.
//!
//! Exposes the documentation index as a JSON API plus the MCP Streamable
//! HTTP transport. Every data route calls [`IndexCell::ensure_fresh`], so the
//! first request after startup (or after the staleness threshold) triggers
//! a build.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Server info and endpoint table |
//! | `GET`  | `/health` | Status, page count, last update |
//! | `GET`  | `/search?q=&limit=` | Ranked search results |
//! | `GET`  | `/page?path=` | One page by path |
//! | `GET`  | `/list` | Every page |
//! | `GET`  | `/categories` | Categories with page counts |
//! | `GET`  | `/tools/list` | Registered tools with schemas |
//! | `POST` | `/tools/{name}` | Call a tool by name |
//! | `*`    | `/mcp` | MCP Streamable HTTP |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "missing query parameter: q" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `tool_error` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpService,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::mcp::McpBridge;
use crate::models::Page;
use crate::search::{get_page_by_path, list_categories, search};
use crate::state::IndexCell;
use crate::tools::{validate_params, ToolContext, ToolInfo, ToolRegistry};

/// Result count for `/search` without a usable `limit`.
const DEFAULT_HTTP_LIMIT: usize = 5;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    cell: Arc<IndexCell>,
    tools: Arc<ToolRegistry>,
}

impl AppState {
    pub fn new(cell: Arc<IndexCell>, tools: Arc<ToolRegistry>) -> Self {
        Self { cell, tools }
    }
}

/// Build the full router, including the `/mcp` transport.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let bridge = McpBridge::new(state.cell.clone(), state.tools.clone());
    let mcp = StreamableHttpService::new(
        move || Ok(bridge.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    Router::new()
        .route("/", get(handle_info))
        .route("/health", get(handle_health))
        .route("/search", get(handle_search))
        .route("/page", get(handle_page))
        .route("/list", get(handle_list))
        .route("/categories", get(handle_categories))
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .nest_service("/mcp", mcp)
        .fallback(handle_not_found)
        .layer(cors)
        .with_state(state)
}

/// Bind `[server].bind` and serve until the process is terminated.
pub async fn run_server(cell: Arc<IndexCell>) -> anyhow::Result<()> {
    let bind_addr = cell.config().server.bind.clone();
    let state = AppState::new(cell, Arc::new(ToolRegistry::with_builtins()));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", bind_addr, e))?;
    info!(addr = %bind_addr, "docs server listening");
    info!(url = %format!("http://{}/mcp", bind_addr), "MCP endpoint");

    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn tool_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "tool_error".to_string(),
        message: message.into(),
    }
}

// ============ GET / and /health ============

async fn handle_info(State(state): State<AppState>) -> Json<Value> {
    let index = state.cell.ensure_fresh().await;
    let site = &state.cell.config().site;
    Json(json!({
        "name": "sitedocs",
        "version": env!("CARGO_PKG_VERSION"),
        "description": format!("Search and read the {} documentation", site.name),
        "pages": index.pages.len(),
        "lastUpdated": index.updated_at.timestamp_millis(),
        "docs": site.docs_url(),
        "endpoints": {
            "/health": "Health check",
            "/search": "Search documentation (GET ?q=query&limit=5)",
            "/page": "Get page content (GET ?path=/docs/...)",
            "/list": "List all pages",
            "/categories": "List categories with page counts",
            "/tools/list": "List callable tools",
            "/tools/{name}": "Call a tool (POST JSON parameters)",
            "/mcp": "MCP Streamable HTTP endpoint"
        }
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: String,
    version: String,
    pages: usize,
    /// Epoch milliseconds of the held index.
    last_updated: i64,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let index = state.cell.ensure_fresh().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        pages: index.pages.len(),
        last_updated: index.updated_at.timestamp_millis(),
    })
}

// ============ GET /search ============

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
    limit: Option<String>,
}

#[derive(Serialize)]
struct SearchHit {
    title: String,
    url: String,
    path: String,
    category: String,
    score: f64,
    snippet: String,
    sections: Vec<String>,
}

/// Lenient `limit` parsing: anything missing, non-numeric or zero falls
/// back to the default.
fn parse_limit(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_HTTP_LIMIT)
}

async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, AppError> {
    let query = params.q.unwrap_or_default();
    if query.is_empty() {
        return Err(bad_request("missing query parameter: q"));
    }
    let limit = parse_limit(params.limit.as_deref());

    let index = state.cell.ensure_fresh().await;
    let results: Vec<SearchHit> = search(&index, &query, limit)
        .into_iter()
        .map(|r| SearchHit {
            title: r.page.title.clone(),
            url: r.page.url.clone(),
            path: r.page.path.clone(),
            category: r.page.category.clone(),
            score: r.score,
            snippet: r.snippet,
            sections: r.matched_sections.into_iter().map(|s| s.title).collect(),
        })
        .collect();

    Ok(Json(json!({
        "query": query,
        "count": results.len(),
        "results": results,
    })))
}

// ============ GET /page ============

#[derive(Deserialize)]
struct PageParams {
    path: Option<String>,
}

async fn handle_page(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page>, AppError> {
    let path = params.path.unwrap_or_default();
    if path.is_empty() {
        return Err(bad_request("missing query parameter: path"));
    }

    let index = state.cell.ensure_fresh().await;
    get_page_by_path(&index, &path)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found(format!("page not found: {}", path)))
}

// ============ GET /list and /categories ============

async fn handle_list(State(state): State<AppState>) -> Json<Value> {
    let index = state.cell.ensure_fresh().await;
    let pages: Vec<Value> = index
        .pages
        .iter()
        .map(|page| {
            json!({
                "path": page.path,
                "title": page.title,
                "url": page.url,
                "category": page.category,
            })
        })
        .collect();
    Json(json!({ "count": pages.len(), "pages": pages }))
}

async fn handle_categories(State(state): State<AppState>) -> Json<Value> {
    let index = state.cell.ensure_fresh().await;
    let categories: Vec<Value> = list_categories(&index)
        .into_iter()
        .map(|name| {
            let pages = index.pages.iter().filter(|p| p.category == name).count();
            json!({ "name": name, "pages": pages })
        })
        .collect();
    Json(json!({ "categories": categories }))
}

// ============ GET /tools/list ============

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    let tools = state
        .tools
        .tools()
        .iter()
        .map(|t| ToolInfo::from_tool(t.as_ref()))
        .collect();
    Json(ToolListResponse { tools })
}

// ============ POST /tools/{name} ============

/// Validate parameters, run the tool, and wrap its output as
/// `{ "result": ... }`.
async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let tool = state
        .tools
        .find(&name)
        .ok_or_else(|| not_found(format!("no tool registered with name: {}", name)))?;

    let params = validate_params(&tool.parameters_schema(), &params)
        .map_err(|e| bad_request(e.to_string()))?;

    let ctx = ToolContext::new(state.cell.clone());
    let result = tool
        .execute(params, &ctx)
        .await
        .map_err(|e| tool_error(format!("{}: {}", name, e)))?;

    Ok(Json(json!({ "result": result })))
}

// ============ Fallback ============

async fn handle_not_found() -> AppError {
    not_found("no such endpoint; see / for the endpoint list")
}
