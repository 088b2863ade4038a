//! MCP JSON-RPC protocol bridge.
//!
//! Adapts the [`ToolRegistry`] and the current index to the Model Context
//! Protocol, served over stdio (`sitedocs serve mcp`) or as a Streamable
//! HTTP endpoint mounted at `/mcp` by [`crate::server`].
//!
//! * **Tools** map to MCP tools via `list_tools` / `call_tool`.
//! * The index table of contents is the `docs://index` resource.

use anyhow::{Context, Result};
use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, ServiceExt};
use tracing::info;

use crate::render;
use crate::state::IndexCell;
use crate::tools::{validate_params, ToolContext, ToolRegistry};

/// URI of the table-of-contents resource.
pub const INDEX_RESOURCE_URI: &str = "docs://index";

/// Serves the tool registry and index resource over MCP.
///
/// Each MCP session gets a clone; everything is behind `Arc`, so all
/// sessions share the same index cell.
#[derive(Clone)]
pub struct McpBridge {
    cell: Arc<IndexCell>,
    tools: Arc<ToolRegistry>,
}

impl McpBridge {
    pub fn new(cell: Arc<IndexCell>, tools: Arc<ToolRegistry>) -> Self {
        Self { cell, tools }
    }

    /// Convert a registry tool into an rmcp `Tool` descriptor.
    fn to_mcp_tool(tool: &dyn crate::tools::Tool) -> Tool {
        let input_schema: Arc<serde_json::Map<String, serde_json::Value>> =
            match tool.parameters_schema() {
                serde_json::Value::Object(map) => Arc::new(map),
                _ => Arc::new(serde_json::Map::new()),
            };

        Tool {
            name: Cow::Owned(tool.name().to_string()),
            title: None,
            description: Some(Cow::Owned(tool.description().to_string())),
            input_schema,
            output_schema: None,
            annotations: Some(ToolAnnotations::new().read_only(true)),
            execution: None,
            icons: None,
            meta: None,
        }
    }

    fn index_resource(&self) -> Resource {
        let mut raw = RawResource::new(
            INDEX_RESOURCE_URI,
            format!("{} documentation index", self.cell.config().site.name),
        );
        raw.description = Some("Table of contents of every indexed page, by category".to_string());
        raw.mime_type = Some("text/markdown".to_string());
        raw.no_annotation()
    }

    /// Render the `docs://index` resource body.
    pub async fn index_toc(&self) -> String {
        let index = self.cell.ensure_fresh().await;
        render::index_toc(&index, &self.cell.config().site.name)
    }
}

impl ServerHandler for McpBridge {
    fn get_info(&self) -> ServerInfo {
        let site = &self.cell.config().site;
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: "sitedocs".to_string(),
                title: Some(format!("{} Docs", site.name)),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: Some(site.docs_url()),
            },
            instructions: Some(format!(
                "Search and read the {} documentation. Use search_docs for questions, \
                 get_doc_page to read a page by path, and browse_docs or \
                 list_doc_categories to see what is available.",
                site.name
            )),
        }
    }

    // ── Tools ────────────────────────────────────────────────────────────

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools: Vec<Tool> = self
            .tools
            .tools()
            .iter()
            .map(|t| Self::to_mcp_tool(t.as_ref()))
            .collect();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tools.find(name).map(Self::to_mcp_tool)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool = self.tools.find(&request.name).ok_or_else(|| {
            McpError::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("no tool registered with name: {}", request.name),
                None,
            )
        })?;

        let params = request
            .arguments
            .map(serde_json::Value::Object)
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));
        let params = match validate_params(&tool.parameters_schema(), &params) {
            Ok(params) => params,
            Err(e) => return Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
        };

        let ctx = ToolContext::new(self.cell.clone());
        match tool.execute(params, &ctx).await {
            Ok(serde_json::Value::String(text)) => {
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Ok(other) => {
                let text = serde_json::to_string_pretty(&other).unwrap_or_default();
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
        }
    }

    // ── Resources ────────────────────────────────────────────────────────

    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListResourcesResult::with_all_items(vec![
            self.index_resource()
        ])))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        if request.uri != INDEX_RESOURCE_URI {
            return Err(McpError::resource_not_found(
                format!("no resource with uri: {}", request.uri),
                None,
            ));
        }

        let text = self.index_toc().await;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, INDEX_RESOURCE_URI)],
        })
    }
}

/// Run the MCP server over stdin/stdout until the client disconnects.
///
/// The cell is warmed first: a persisted index is loaded (and refreshed in
/// the background when stale), or built before the first request.
pub async fn serve_stdio(cell: Arc<IndexCell>) -> Result<()> {
    let index = cell.warm_start().await;
    info!(
        pages = index.pages.len(),
        tools = "search_docs, get_doc_page, list_docs_by_category, list_doc_categories, browse_docs",
        "docs MCP server running on stdio"
    );

    let bridge = McpBridge::new(cell, Arc::new(ToolRegistry::with_builtins()));
    let service = bridge
        .serve(rmcp::transport::stdio())
        .await
        .context("Failed to start MCP stdio transport")?;
    service
        .waiting()
        .await
        .context("MCP stdio transport terminated abnormally")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::fallback_index;
    use crate::config::Config;
    use crate::error::FetchError;
    use crate::fetch::Fetcher;
    use async_trait::async_trait;

    struct Offline;

    #[async_trait]
    impl Fetcher for Offline {
        async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError> {
            Err(FetchError::Status {
                url: url.to_string(),
                status: 503,
            })
        }
    }

    fn bridge() -> McpBridge {
        let config = Arc::new(Config::default());
        let index = fallback_index(&config.site);
        let cell = IndexCell::with_index(Arc::new(Offline), config, index);
        McpBridge::new(Arc::new(cell), Arc::new(ToolRegistry::with_builtins()))
    }

    #[test]
    fn test_server_info() {
        let info = bridge().get_info();
        assert_eq!(info.server_info.name, "sitedocs");
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_some());
    }

    #[test]
    fn test_tool_descriptors() {
        let b = bridge();
        let tool = b.get_tool("search_docs").unwrap();
        assert_eq!(tool.name, "search_docs");
        assert_eq!(tool.input_schema["required"], serde_json::json!(["query"]));
        assert!(b.get_tool("missing").is_none());
    }

    #[test]
    fn test_index_resource_descriptor() {
        let resource = bridge().index_resource();
        assert_eq!(resource.raw.uri, "docs://index");
        assert_eq!(resource.raw.mime_type.as_deref(), Some("text/markdown"));
    }

    #[tokio::test]
    async fn test_index_toc_lists_fallback_page() {
        let toc = bridge().index_toc().await;
        assert!(toc.starts_with("# OpenCode Documentation Index\n\n## General\n\n"));
        assert!(toc.contains("- [OpenCode Documentation](https://opencode.ai/docs/) - `/docs/`"));
    }
}
