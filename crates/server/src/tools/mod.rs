//! MCP tool implementations.
//!
//! Each tool maps one host signal onto the [`offgrid_client::Agent`] and
//! returns its outcome as pretty-printed JSON text.

pub mod cache;
pub mod fetch;
pub mod lifecycle;
pub mod notify;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

pub use cache::{CacheInspectParams, inspect_impl};
pub use fetch::{AgentFetchParams, fetch_impl};
pub use lifecycle::{AgentMessageParams, activate_impl, install_impl, message_impl};
pub use notify::{AgentPushParams, NotificationClickParams, click_impl, push_impl};

pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(ToolError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
