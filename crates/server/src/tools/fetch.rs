//! agent_fetch tool implementation.
//!
//! Hands an intercepted request to the agent and reports how it was served.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use offgrid_client::{Agent, FetchOutcome};
use offgrid_core::RequestDescriptor;

use super::json_result;
use crate::error::ToolError;

/// Input parameters for agent_fetch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AgentFetchParams {
    /// Absolute request URL.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// The request's Accept header, if any.
    #[serde(default)]
    pub accept: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for agent_fetch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AgentFetchOutput {
    /// False when the host should perform the request itself.
    pub handled: bool,
    pub strategy: Option<String>,
    pub status: Option<u16>,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8, lossily.
    pub body: Option<String>,
    pub body_bytes: usize,
}

impl From<FetchOutcome> for AgentFetchOutput {
    fn from(outcome: FetchOutcome) -> Self {
        match outcome {
            FetchOutcome::PassThrough => {
                Self { handled: false, strategy: None, status: None, headers: Vec::new(), body: None, body_bytes: 0 }
            }
            FetchOutcome::Respond { strategy, response } => Self {
                handled: true,
                strategy: Some(strategy.as_str().to_string()),
                status: Some(response.status),
                body: Some(String::from_utf8_lossy(&response.body).into_owned()),
                body_bytes: response.body.len(),
                headers: response.headers,
            },
        }
    }
}

/// Implementation of the agent_fetch tool.
pub async fn fetch_impl(agent: &Agent, params: AgentFetchParams) -> Result<CallToolResult, McpError> {
    if params.method.trim().is_empty() {
        return Err(ToolError::InvalidInput("method cannot be empty".into()).into());
    }
    let url = Url::parse(params.url.trim()).map_err(|e| ToolError::InvalidInput(format!("{}: {e}", params.url)))?;

    let request = RequestDescriptor::new(&params.method, url, params.accept);
    let outcome = agent.handle_fetch(&request).await?;

    json_result(&AgentFetchOutput::from(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{agent, output, shell_network};

    fn params(method: &str, url: &str) -> AgentFetchParams {
        AgentFetchParams { url: url.into(), method: method.into(), accept: None }
    }

    #[tokio::test]
    async fn test_fetch_passes_through_before_install() {
        let (agent, _) = agent(shell_network()).await;
        let result = fetch_impl(&agent, params("GET", "https://app.example/app.css")).await.unwrap();
        assert_eq!(output(&result)["handled"], false);
    }

    #[tokio::test]
    async fn test_fetch_cache_first_after_activation() {
        let (agent, _) = agent(shell_network()).await;
        agent.handle_install().await.unwrap();
        agent.handle_activate().await.unwrap();

        let result = fetch_impl(&agent, params("GET", "https://app.example/app.css")).await.unwrap();
        let out = output(&result);
        assert_eq!(out["handled"], true);
        assert_eq!(out["strategy"], "cache-first");
        assert_eq!(out["status"], 200);
        assert_eq!(out["body"], "body{}");
    }

    #[tokio::test]
    async fn test_fetch_post_is_not_handled() {
        let (agent, _) = agent(shell_network()).await;
        agent.handle_install().await.unwrap();
        agent.handle_activate().await.unwrap();

        let result = fetch_impl(&agent, params("post", "https://app.example/api")).await.unwrap();
        assert_eq!(output(&result)["handled"], false);
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let (agent, _) = agent(shell_network()).await;
        let result = fetch_impl(&agent, params("GET", "not a url")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fetch_network_only_failure_is_error() {
        let (agent, _) = agent(shell_network()).await;
        agent.handle_install().await.unwrap();
        agent.handle_activate().await.unwrap();

        let result = fetch_impl(&agent, params("GET", "https://firestore.googleapis.com/v1/doc")).await;
        let err = result.unwrap_err();
        assert_eq!(err.code.0, -32008);
    }
}
