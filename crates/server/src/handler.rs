//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the worker.
use crate::tools::{
    CacheListParams, FetchParams, MenuDayParams, MessageParams, SyncParams, fetch_impl, list_impl, menu_dates_impl,
    menu_day_impl, message_impl, sweep_impl, sync_impl,
};

use mealsw_client::Worker;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The MCP server handler for meal-sw.
#[derive(Clone)]
pub struct MealSwServer {
    tool_router: ToolRouter<Self>,
    worker: Worker,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl MealSwServer {
    /// Create a new server handler around an already constructed worker.
    pub fn new(worker: Worker) -> Self {
        Self { tool_router: Self::tool_router(), worker }
    }

    /// Route a request through the worker.
    ///
    /// API paths are network-first with cache fallback; other GETs are cache-first.
    #[tool(description = "Send a request through the offline layer. Reports how it was served: network, cache-hit, \
                          fallback or synthetic.")]
    async fn sw_fetch(&self, params: Parameters<FetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    /// Post a control message.
    #[tool(description = "Post a control message to the worker: \"skip-waiting\" or \"get-version\".")]
    async fn sw_message(&self, params: Parameters<MessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.worker, params.0).await
    }

    /// List partitions, or the entries of one partition.
    #[tool(description = "List cache partitions with entry counts, or the stored requests of one partition.")]
    async fn cache_list(&self, params: Parameters<CacheListParams>) -> Result<CallToolResult, McpError> {
        list_impl(self.worker.db(), params.0).await
    }

    /// Run the eviction sweep now.
    #[tool(description = "Run one cache eviction sweep now. Returns per-partition counts.")]
    async fn cache_sweep(&self) -> Result<CallToolResult, McpError> {
        sweep_impl(&self.worker).await
    }

    /// Fire a background sync event.
    #[tool(description = "Fire a background sync event (default tag \"background-sync\").")]
    async fn sw_sync(&self, params: Parameters<SyncParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.worker, params.0).await
    }

    /// Fetch the menu for one day through the worker.
    #[tool(description = "Get the cafeteria menu for a date (YYYY-MM-DD), optionally filtered by meal types.")]
    async fn menu_day(&self, params: Parameters<MenuDayParams>) -> Result<CallToolResult, McpError> {
        menu_day_impl(&self.worker, params.0).await
    }

    /// Fetch the list of dates that have menus.
    #[tool(description = "List the dates that have menus available.")]
    async fn menu_dates(&self) -> Result<CallToolResult, McpError> {
        menu_dates_impl(&self.worker).await
    }
}

impl ServerHandler for MealSwServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "meal-sw".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
