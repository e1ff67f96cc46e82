//! MCP server handler implementation.
//!
//! Routes tool calls from the host runtime to the agent.
use std::sync::Arc;

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

use offgrid_client::Agent;
use offgrid_core::CacheDb;

use crate::tools::{
    AgentFetchParams, AgentMessageParams, AgentPushParams, CacheInspectParams, NotificationClickParams,
    activate_impl, click_impl, fetch_impl, inspect_impl, install_impl, message_impl, push_impl,
};

/// The MCP server handler for the caching agent.
#[derive(Clone)]
pub struct OffgridServer {
    agent: Arc<Agent>,
    cache: Arc<CacheDb>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl OffgridServer {
    /// Create a new server handler around an agent and its store.
    pub fn new(agent: Arc<Agent>, cache: Arc<CacheDb>) -> Self {
        Self { agent, cache, tool_router: Self::tool_router() }
    }

    #[tool(description = "Serve an intercepted request. Returns how it was handled (strategy) and the response, \
                          or handled=false when the host should perform it itself.")]
    async fn agent_fetch(&self, params: Parameters<AgentFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.agent, params.0).await
    }

    #[tool(description = "Install this deploy's generation: pre-cache shell assets (all required) and external \
                          assets (best-effort).")]
    async fn agent_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.agent).await
    }

    #[tool(description = "Activate the installed generation, delete every other cache store and take control.")]
    async fn agent_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.agent).await
    }

    #[tool(description = "Post a control message: {\"type\": \"skip-waiting\"} or {\"type\": \"clear-cache\"}.")]
    async fn agent_message(&self, params: Parameters<AgentMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.agent, params.0).await
    }

    #[tool(description = "Deliver a push. Returns the notification the host should display.")]
    async fn agent_push(&self, params: Parameters<AgentPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.agent, params.0).await
    }

    #[tool(description = "Handle a notification click given the host's open windows. Returns close=true plus the \
                          window to focus or the URL to open.")]
    async fn agent_notification_click(
        &self, params: Parameters<NotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        click_impl(&self.agent, params.0).await
    }

    #[tool(description = "Inspect lifecycle state, cache stores and, optionally, one entry of the active store.")]
    async fn cache_inspect(&self, params: Parameters<CacheInspectParams>) -> Result<CallToolResult, McpError> {
        inspect_impl(&self.agent, &self.cache, params.0).await
    }
}

impl ServerHandler for OffgridServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "offgrid-agent".into(),
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
