//! Agent-callable tools.
//!
//! Every query operation is exposed as a [`Tool`]: a name, a description,
//! a JSON Schema for its parameters, and an async `execute` that returns
//! rendered markdown. The same [`ToolRegistry`] backs the MCP bridge, the
//! HTTP `/tools` routes, and the CLI query commands.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              ToolRegistry                │
//! │  search_docs      get_doc_page           │
//! │  list_docs_by_category                   │
//! │  list_doc_categories   browse_docs       │
//! └──────────────┬───────────────────────────┘
//!                ▼
//!     ToolContext → IndexCell → Arc<Index>
//! ```

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::config::Config;
use crate::models::Index;
use crate::render;
use crate::search::{get_page_by_path, resolve_doc_path, search, suggest_pages};
use crate::state::IndexCell;

/// Result count used when `search_docs` is called without `limit`.
pub const DEFAULT_TOOL_LIMIT: usize = 5;

// ═══════════════════════════════════════════════════════════════════════
// Tool Trait
// ═══════════════════════════════════════════════════════════════════════

/// A tool that agents can discover and call.
///
/// Tools are listed over MCP `tools/list` and `GET /tools/list`, and
/// invoked over MCP `tools/call` and `POST /tools/{name}`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Route and protocol name, a lowercase identifier with underscores.
    fn name(&self) -> &str;

    /// One-line description for agent discovery.
    fn description(&self) -> &str;

    /// Whether this tool ships with the crate. Defaults to `false`.
    fn is_builtin(&self) -> bool {
        false
    }

    /// JSON Schema (`type: "object"`) for the tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Run the tool. `params` is always a JSON object.
    ///
    /// Returns the rendered text as a JSON string. Errors are reserved for
    /// malformed parameters; "not found" outcomes are ordinary text.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

// ═══════════════════════════════════════════════════════════════════════
// ToolContext
// ═══════════════════════════════════════════════════════════════════════

/// Index access for tool execution.
pub struct ToolContext {
    cell: Arc<IndexCell>,
    refresh: bool,
}

impl ToolContext {
    /// Context that refreshes the index lazily before each call.
    pub fn new(cell: Arc<IndexCell>) -> Self {
        Self {
            cell,
            refresh: true,
        }
    }

    /// Context that only reads what the cell already holds and never
    /// triggers a build.
    pub fn read_only(cell: Arc<IndexCell>) -> Self {
        Self {
            cell,
            refresh: false,
        }
    }

    pub fn config(&self) -> &Config {
        self.cell.config()
    }

    /// The index to answer from, or `None` when there is nothing to serve.
    pub async fn index(&self) -> Option<Arc<Index>> {
        if self.refresh {
            Some(self.cell.ensure_fresh().await)
        } else {
            self.cell.snapshot()
        }
    }
}

fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    match params.get(key).and_then(Value::as_str) {
        Some(value) => Ok(value),
        None => bail!("missing required parameter: {}", key),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Tools
// ═══════════════════════════════════════════════════════════════════════

/// Ranked full-text search.
pub struct SearchDocsTool;

#[async_trait]
impl Tool for SearchDocsTool {
    fn name(&self) -> &str {
        "search_docs"
    }

    fn description(&self) -> &str {
        "Search the documentation for relevant information. Use this to find docs about configuration, usage, MCP servers, agents, and more."
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search query - what you want to find in the docs" },
                "limit": { "type": "integer", "description": "Maximum number of results to return", "default": DEFAULT_TOOL_LIMIT }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = required_str(&params, "query")?;
        let limit = params
            .get("limit")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_TOOL_LIMIT);

        let Some(index) = ctx.index().await else {
            return Ok(Value::String(render::INDEX_UNAVAILABLE.to_string()));
        };
        let results = search(&index, query, limit);
        Ok(Value::String(render::search_results(query, &results)))
    }
}

/// Single page by path, with suggestions on a miss.
pub struct GetDocPageTool;

#[async_trait]
impl Tool for GetDocPageTool {
    fn name(&self) -> &str {
        "get_doc_page"
    }

    fn description(&self) -> &str {
        "Get the full content of a specific documentation page by its path."
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "The doc page path (e.g., \"/docs/config\" or \"mcp-servers\")" }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let path = required_str(&params, "path")?;
        let Some(index) = ctx.index().await else {
            return Ok(Value::String(render::INDEX_UNAVAILABLE.to_string()));
        };

        let lookup = resolve_doc_path(path, &ctx.config().site.docs_prefix);
        let text = match get_page_by_path(&index, &lookup) {
            Some(page) => render::page(page),
            None => render::page_not_found(path, &suggest_pages(&index, path)),
        };
        Ok(Value::String(text))
    }
}

/// Pages of one category.
pub struct ListDocsByCategoryTool;

#[async_trait]
impl Tool for ListDocsByCategoryTool {
    fn name(&self) -> &str {
        "list_docs_by_category"
    }

    fn description(&self) -> &str {
        "List all documentation pages in a specific category."
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "category": { "type": "string", "description": "Category name (e.g., \"Configure\", \"Usage\", \"Develop\")" }
            },
            "required": ["category"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let category = required_str(&params, "category")?;
        let Some(index) = ctx.index().await else {
            return Ok(Value::String(render::INDEX_UNAVAILABLE.to_string()));
        };
        Ok(Value::String(render::category_pages(&index, category)))
    }
}

/// Categories with page counts.
pub struct ListDocCategoriesTool;

#[async_trait]
impl Tool for ListDocCategoriesTool {
    fn name(&self) -> &str {
        "list_doc_categories"
    }

    fn description(&self) -> &str {
        "List all available categories in the documentation."
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
        let Some(index) = ctx.index().await else {
            return Ok(Value::String(render::INDEX_UNAVAILABLE.to_string()));
        };
        Ok(Value::String(render::categories(
            &index,
            &ctx.config().site.name,
        )))
    }
}

/// Whole-site overview.
pub struct BrowseDocsTool;

#[async_trait]
impl Tool for BrowseDocsTool {
    fn name(&self) -> &str {
        "browse_docs"
    }

    fn description(&self) -> &str {
        "Get an overview of the entire documentation structure."
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
        let Some(index) = ctx.index().await else {
            return Ok(Value::String(render::INDEX_UNAVAILABLE.to_string()));
        };
        Ok(Value::String(render::browse(&index, &ctx.config().site.name)))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Parameter Validation
// ═══════════════════════════════════════════════════════════════════════

/// Tool descriptor as listed by `GET /tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub builtin: bool,
    /// JSON Schema for the tool's parameters.
    pub parameters: Value,
}

impl ToolInfo {
    pub fn from_tool(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            builtin: tool.is_builtin(),
            parameters: tool.parameters_schema(),
        }
    }
}

/// Check `params` against a tool schema and fill in defaults.
///
/// Required keys must be present and every known key must have the
/// declared JSON type. Missing optional keys with a `default` get it.
/// Unknown keys pass through untouched.
pub fn validate_params(schema: &Value, params: &Value) -> Result<Value> {
    let given = match params {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => bail!("parameters must be an object, got {}", json_type_name(other)),
    };

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for key in required.iter().filter_map(Value::as_str) {
            if !given.contains_key(key) {
                bail!("missing required parameter: {}", key);
            }
        }
    }

    let mut result = given.clone();
    let properties = schema.get("properties").and_then(Value::as_object);
    for (name, prop) in properties.into_iter().flatten() {
        match given.get(name) {
            Some(value) => {
                let Some(expected) = prop.get("type").and_then(Value::as_str) else {
                    continue;
                };
                let ok = match expected {
                    "string" => value.is_string(),
                    "integer" => value.is_i64() || value.is_u64(),
                    "number" => value.is_number(),
                    "boolean" => value.is_boolean(),
                    "array" => value.is_array(),
                    "object" => value.is_object(),
                    _ => true,
                };
                if !ok {
                    bail!(
                        "parameter '{}' must be of type '{}', got {}",
                        name,
                        expected,
                        json_type_name(value)
                    );
                }
            }
            None => {
                if let Some(default) = prop.get("default") {
                    result.insert(name.clone(), default.clone());
                }
            }
        }
    }

    Ok(Value::Object(result))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Registry of callable tools.
///
/// Use [`ToolRegistry::with_builtins`] for the five documentation tools,
/// then optionally [`register`](ToolRegistry::register) more.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty tool registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Create a registry pre-loaded with the built-in documentation tools.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SearchDocsTool));
        registry.register(Box::new(GetDocPageTool));
        registry.register(Box::new(ListDocsByCategoryTool));
        registry.register(Box::new(ListDocCategoriesTool));
        registry.register(Box::new(BrowseDocsTool));
        registry
    }

    /// Register a tool.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    /// Get all registered tools.
    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    /// Find a tool by name.
    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
