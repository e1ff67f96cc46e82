//! agent_install, agent_activate and agent_message tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use offgrid_client::Agent;

use super::json_result;

/// Input parameters for agent_message.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AgentMessageParams {
    /// Message posted by a page, e.g. `{"type": "skip-waiting"}`.
    pub message: serde_json::Value,
}

/// Implementation of the agent_install tool.
pub async fn install_impl(agent: &Agent) -> Result<CallToolResult, McpError> {
    let report = agent.handle_install().await?;
    json_result(&report)
}

/// Implementation of the agent_activate tool.
pub async fn activate_impl(agent: &Agent) -> Result<CallToolResult, McpError> {
    let report = agent.handle_activate().await?;
    json_result(&report)
}

/// Implementation of the agent_message tool.
pub async fn message_impl(agent: &Agent, params: AgentMessageParams) -> Result<CallToolResult, McpError> {
    let outcome = agent.handle_message(&params.message).await?;
    json_result(&outcome)
}
