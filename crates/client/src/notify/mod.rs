//! Push notifications and window focus.
//!
//! The host runtime owns notification display and the window registry; the
//! agent only decides what to show and which window to focus or open.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use offgrid_core::{AppConfig, Error, locator};

/// Vibration pattern attached to every notification, in milliseconds.
pub const VIBRATE_PATTERN: [u32; 3] = [100, 50, 100];

/// A notification ready to be shown by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub vibrate: Vec<u32>,
    /// Window opened when the notification is clicked and no app window exists.
    pub url: String,
}

/// An open window known to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowClient {
    pub id: String,
    pub url: String,
}

/// What a notification click did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum WindowAction {
    Focused { id: String, url: String },
    Opened { url: String },
}

/// What a notification click asks of the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClickOutcome {
    /// Close the clicked notification. Always set.
    pub close: bool,
    #[serde(flatten)]
    pub window: WindowAction,
}

/// Displays notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn show_notification(&self, notification: &Notification) -> Result<(), Error>;
}

/// The host's window registry.
#[async_trait]
pub trait WindowClients: Send + Sync {
    /// All window clients, controlled or not, in the host's enumeration order.
    async fn match_all(&self) -> Result<Vec<WindowClient>, Error>;
    async fn focus(&self, client: &WindowClient) -> Result<(), Error>;
    async fn open_window(&self, url: &str) -> Result<(), Error>;
}

/// Builds notifications for push payloads.
#[derive(Debug, Clone)]
pub struct NotificationTemplate {
    pub title: String,
    pub default_body: String,
    pub icon: Option<String>,
    /// The app's base path; click targets default here.
    pub base: Url,
}

impl NotificationTemplate {
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let base = locator::parse_scope(&config.scope).map_err(|e| Error::InvalidLocator(e.to_string()))?;
        let icon = config
            .notification_icon
            .as_deref()
            .map(|i| locator::resolve(&base, i).map(String::from).map_err(|e| Error::InvalidLocator(e.to_string())))
            .transpose()?;
        Ok(Self { title: config.app_name.clone(), default_body: config.notification_body.clone(), icon, base })
    }

    /// Notification for a push; an absent or blank payload uses the default body.
    pub fn for_push(&self, payload: Option<&str>) -> Notification {
        let body = payload
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(&self.default_body)
            .to_string();
        Notification {
            title: self.title.clone(),
            body,
            icon: self.icon.clone(),
            badge: self.icon.clone(),
            vibrate: VIBRATE_PATTERN.to_vec(),
            url: self.base.as_str().to_string(),
        }
    }
}

/// Focus the first window under `base`, or open `target` if none is.
pub async fn focus_or_open(clients: &dyn WindowClients, base: &Url, target: &str) -> Result<WindowAction, Error> {
    let windows = clients.match_all().await?;

    let matching = windows
        .into_iter()
        .find(|w| Url::parse(&w.url).is_ok_and(|u| locator::within_scope(base, &u)));

    match matching {
        Some(window) => {
            clients.focus(&window).await?;
            tracing::debug!(id = %window.id, url = %window.url, "focused existing window");
            Ok(WindowAction::Focused { id: window.id, url: window.url })
        }
        None => {
            clients.open_window(target).await?;
            tracing::debug!(url = %target, "opened new window");
            Ok(WindowAction::Opened { url: target.to_string() })
        }
    }
}
