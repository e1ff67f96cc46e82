//! agent_push and agent_notification_click tool implementations.
//!
//! The MCP caller is the host runtime. Notifications and window operations
//! the agent asks for are collected and returned for the host to perform.

use async_trait::async_trait;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use offgrid_client::{Agent, Notification, NotificationClick, Notifier, WindowClient, WindowClients};
use offgrid_core::Error;

use super::json_result;

/// Input parameters for agent_push.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AgentPushParams {
    /// Push payload text; the configured default body is used when absent.
    #[serde(default)]
    pub payload: Option<String>,
}

/// An open window reported by the host.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WindowParam {
    pub id: String,
    pub url: String,
}

/// Input parameters for agent_notification_click.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NotificationClickParams {
    /// URL attached to the clicked notification.
    #[serde(default)]
    pub url: Option<String>,

    /// Identifier of the clicked action button.
    #[serde(default)]
    pub action: Option<String>,

    /// Every window the host currently has open, in its enumeration order.
    #[serde(default)]
    pub windows: Vec<WindowParam>,
}

/// Collects notifications for the host to display.
#[derive(Default)]
struct Outbox {
    shown: Mutex<Vec<Notification>>,
}

#[async_trait]
impl Notifier for Outbox {
    async fn show_notification(&self, notification: &Notification) -> Result<(), Error> {
        self.shown.lock().await.push(notification.clone());
        Ok(())
    }
}

/// Window registry backed by the host's report. Focus and open are left to the host.
struct ReportedWindows {
    windows: Vec<WindowClient>,
}

#[async_trait]
impl WindowClients for ReportedWindows {
    async fn match_all(&self) -> Result<Vec<WindowClient>, Error> {
        Ok(self.windows.clone())
    }

    async fn focus(&self, _client: &WindowClient) -> Result<(), Error> {
        Ok(())
    }

    async fn open_window(&self, _url: &str) -> Result<(), Error> {
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct PushOutput {
    notifications: Vec<Notification>,
}

/// Implementation of the agent_push tool.
pub async fn push_impl(agent: &Agent, params: AgentPushParams) -> Result<CallToolResult, McpError> {
    let outbox = Outbox::default();
    agent.handle_push(params.payload.as_deref(), &outbox).await?;

    let notifications = outbox.shown.into_inner();
    json_result(&PushOutput { notifications })
}

/// Implementation of the agent_notification_click tool.
pub async fn click_impl(agent: &Agent, params: NotificationClickParams) -> Result<CallToolResult, McpError> {
    let windows = ReportedWindows {
        windows: params
            .windows
            .into_iter()
            .map(|w| WindowClient { id: w.id, url: w.url })
            .collect(),
    };
    let click = NotificationClick { url: params.url, action: params.action };

    let outcome = agent.handle_notification_click(&click, &windows).await?;
    json_result(&outcome)
}
