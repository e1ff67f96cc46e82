//! The caching agent: one entry point per host signal.
//!
//! | signal             | entry point                   |
//! |--------------------|-------------------------------|
//! | intercepted fetch  | [`Agent::handle_fetch`]       |
//! | install            | [`Agent::handle_install`]     |
//! | activate           | [`Agent::handle_activate`]    |
//! | control message    | [`Agent::handle_message`]     |
//! | push               | [`Agent::handle_push`]        |
//! | notification click | [`Agent::handle_notification_click`] |
//!
//! Each call is an independent task; suspension points are the store and
//! network operations underneath.

use std::sync::Arc;

use serde_json::Value;

use offgrid_core::{
    AppConfig, AssetManifest, CacheStore, Error, Generation, RequestDescriptor, Response, Route, RoutingPolicy,
    Strategy, locator,
};

use crate::control::{ControlMessage, ControlOutcome};
use crate::fetch::Network;
use crate::lifecycle::{ActivateReport, InstallReport, Lifecycle};
use crate::notify::{ClickOutcome, Notification, NotificationTemplate, Notifier, WindowClients, focus_or_open};
use crate::strategy::{Executor, OfflineFallback, offline_document};

/// Result of an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not handled; the host performs the request itself.
    PassThrough,
    Respond { strategy: Strategy, response: Response },
}

/// A click on a shown notification.
#[derive(Debug, Clone, Default)]
pub struct NotificationClick {
    /// URL attached to the notification.
    pub url: Option<String>,
    /// Action button identifier, if a button was clicked.
    pub action: Option<String>,
}

/// Routes host signals to the classifier, strategies and lifecycle.
pub struct Agent {
    generation: Generation,
    manifest: AssetManifest,
    policy: RoutingPolicy,
    lifecycle: Lifecycle,
    executor: Executor,
    notifications: NotificationTemplate,
}

impl Agent {
    /// Build an agent for the deploy described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLocator` if the scope or any configured locator cannot
    /// be resolved.
    pub fn new(config: &AppConfig, store: Arc<dyn CacheStore>, network: Arc<dyn Network>) -> Result<Self, Error> {
        let manifest = AssetManifest::from_config(config)?;
        let policy = RoutingPolicy::from_config(config, &manifest);
        let scope = locator::parse_scope(&config.scope).map_err(|e| Error::InvalidLocator(e.to_string()))?;
        let fallback = OfflineFallback::new(
            offline_document(&scope, config.offline_document.as_deref())?,
            config.offline_status,
            config.app_name.clone(),
        );

        Ok(Self {
            generation: config.generation_id(),
            manifest,
            policy,
            lifecycle: Lifecycle::new(store.clone(), network.clone()),
            executor: Executor::new(store, network, fallback),
            notifications: NotificationTemplate::from_config(config)?,
        })
    }

    /// Generation this deploy installs.
    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Serve an intercepted request.
    ///
    /// Requests pass through untouched when they are not `GET`, when their
    /// scheme is not http(s), or while no generation controls the pages.
    ///
    /// # Errors
    ///
    /// Only `NetworkFailure`, and only from network-only requests and
    /// cache-first misses without a stub.
    pub async fn handle_fetch(&self, request: &RequestDescriptor) -> Result<FetchOutcome, Error> {
        let strategy = match self.policy.classify(request) {
            Route::PassThrough => return Ok(FetchOutcome::PassThrough),
            Route::Handle(strategy) => strategy,
        };

        let state = self.lifecycle.state().await;
        let Some(generation) = state.active.filter(|_| state.controlling) else {
            tracing::debug!(url = %request.url, "no active generation, passing through");
            return Ok(FetchOutcome::PassThrough);
        };

        tracing::debug!(url = %request.url, strategy = strategy.as_str(), %generation, "intercepted");
        let response = self.executor.execute(strategy, &generation, request).await?;
        Ok(FetchOutcome::Respond { strategy, response })
    }

    /// Install this deploy's generation.
    pub async fn handle_install(&self) -> Result<InstallReport, Error> {
        self.lifecycle.install(&self.generation, &self.manifest).await
    }

    pub async fn handle_activate(&self) -> Result<ActivateReport, Error> {
        self.lifecycle.activate().await
    }

    /// Pick this deploy's generation back up from a previous run's store.
    pub async fn resume(&self) -> Result<bool, Error> {
        self.lifecycle.resume(&self.generation, &self.manifest).await
    }

    /// Handle a posted control message. Unknown messages are ignored.
    pub async fn handle_message(&self, message: &Value) -> Result<ControlOutcome, Error> {
        match ControlMessage::parse(message) {
            Some(ControlMessage::SkipWaiting) => {
                let activated = self.lifecycle.skip_waiting().await?;
                Ok(ControlOutcome::SkipWaiting { activated })
            }
            Some(ControlMessage::ClearCache) => {
                let deleted = self.lifecycle.clear_active().await?;
                Ok(ControlOutcome::CacheCleared { deleted })
            }
            None => {
                tracing::debug!(%message, "ignoring unknown control message");
                Ok(ControlOutcome::Ignored)
            }
        }
    }

    /// Show a notification for a push payload.
    pub async fn handle_push(&self, payload: Option<&str>, notifier: &dyn Notifier) -> Result<Notification, Error> {
        let notification = self.notifications.for_push(payload);
        notifier.show_notification(&notification).await?;
        Ok(notification)
    }

    /// Close the clicked notification, then focus an app window or open one
    /// at the notification's URL.
    pub async fn handle_notification_click(
        &self, click: &NotificationClick, clients: &dyn WindowClients,
    ) -> Result<ClickOutcome, Error> {
        let base = &self.notifications.base;
        let target = match click.url.as_deref() {
            Some(url) => locator::resolve(base, url).map_err(|e| Error::InvalidLocator(format!("{url}: {e}")))?,
            None => base.clone(),
        };
        if let Some(action) = &click.action {
            tracing::debug!(%action, "notification action clicked");
        }

        let window = focus_or_open(clients, base, target.as_str()).await?;
        Ok(ClickOutcome { close: true, window })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FlakyStore, RecordingHost, ScriptedNetwork};
    use crate::notify::{WindowAction, WindowClient};
    use serde_json::json;
    use url::Url;

    const SCOPE: &str = "https://app.example/";

    struct Fixture {
        store: Arc<FlakyStore>,
        network: Arc<ScriptedNetwork>,
        agent: Agent,
    }

    fn config(version: &str) -> AppConfig {
        AppConfig {
            app_name: "Skore Point".into(),
            cache_prefix: "skore-point".into(),
            cache_version: version.into(),
            scope: SCOPE.into(),
            shell_assets: vec!["/".into(), "/index.html".into()],
            external_assets: vec!["https://lib.example/x.js".into()],
            offline_document: None,
            ..Default::default()
        }
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(FlakyStore::new().await);
        let network = Arc::new(ScriptedNetwork::new());
        network.respond("https://app.example/", 200, "text/html", "<html>root</html>");
        network.respond("https://app.example/index.html", 200, "text/html", "<html>index</html>");
        let agent = Agent::new(&config("v1"), store.clone(), network.clone()).unwrap();
        Fixture { store, network, agent }
    }

    async fn activated() -> Fixture {
        let f = fixture().await;
        f.agent.handle_install().await.unwrap();
        f.agent.handle_activate().await.unwrap();
        f
    }

    fn request(method: &str, url: &str, accept: Option<&str>) -> RequestDescriptor {
        RequestDescriptor::new(method, Url::parse(url).unwrap(), accept.map(String::from))
    }

    #[tokio::test]
    async fn test_install_skips_unreachable_external() {
        let f = fixture().await;
        f.network.fail("https://lib.example/x.js");

        let report = f.agent.handle_install().await.unwrap();
        assert_eq!(report.generation.as_str(), "skore-point-v1");

        let gen_name = report.generation.as_str();
        assert!(f.store.match_entry(gen_name, "GET", "https://app.example/").await.unwrap().is_some());
        assert!(f.store.match_entry(gen_name, "GET", "https://app.example/index.html").await.unwrap().is_some());
        assert!(f.store.match_entry(gen_name, "GET", "https://lib.example/x.js").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_passes_through_before_activation() {
        let f = fixture().await;
        f.network.respond("https://app.example/app.js", 200, "application/javascript", "x");
        f.agent.handle_install().await.unwrap();

        let outcome = f.agent.handle_fetch(&request("GET", "https://app.example/app.js", None)).await.unwrap();
        assert_eq!(outcome, FetchOutcome::PassThrough);
    }

    #[tokio::test]
    async fn test_non_get_is_pass_through() {
        let f = activated().await;
        let calls_before = f.network.total_calls();
        let puts_before = f.store.put_attempts();

        for method in ["POST", "PUT", "PATCH", "DELETE"] {
            let outcome = f.agent.handle_fetch(&request(method, "https://app.example/api/scores", None)).await.unwrap();
            assert_eq!(outcome, FetchOutcome::PassThrough);
        }

        assert_eq!(f.network.total_calls(), calls_before);
        assert_eq!(f.store.put_attempts(), puts_before);
    }

    #[tokio::test]
    async fn test_realtime_requests_never_cached() {
        let f = activated().await;
        let urls = [
            "https://firestore.googleapis.com/v1/projects/demo/documents/scores",
            "https://demo-default-rtdb.firebaseio.com/live.json",
            "https://demo.firebasestorage.app/o/avatar.png",
        ];
        for url in urls {
            f.network.respond(url, 200, "application/json", "{}");
        }
        let puts_before = f.store.put_attempts();

        for url in urls {
            let outcome = f.agent.handle_fetch(&request("GET", url, Some("text/html"))).await.unwrap();
            assert!(matches!(outcome, FetchOutcome::Respond { strategy: Strategy::NetworkOnly, .. }));
        }

        assert_eq!(f.store.put_attempts(), puts_before);
        for name in f.store.store_names().await.unwrap() {
            for url in urls {
                assert!(f.store.match_entry(&name, "GET", url).await.unwrap().is_none());
            }
        }
    }

    #[tokio::test]
    async fn test_html_navigation_is_network_first_with_404_cached() {
        let f = activated().await;
        f.network.respond("https://app.example/page", 404, "text/html", "gone");

        let outcome = f
            .agent
            .handle_fetch(&request("GET", "https://app.example/page", Some("text/html")))
            .await
            .unwrap();
        let FetchOutcome::Respond { strategy, response } = outcome else {
            panic!("expected a response");
        };
        assert_eq!(strategy, Strategy::NetworkFirst);
        assert_eq!(response.status, 404);

        let stored = f
            .store
            .match_entry("skore-point-v1", "GET", "https://app.example/page")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&stored.response.body[..], b"gone");
    }

    #[tokio::test]
    async fn test_offline_navigation_with_fragment_serves_cached_document() {
        let f = activated().await;
        f.network.fail("https://app.example/index.html");

        let outcome = f
            .agent
            .handle_fetch(&request("GET", "https://app.example/index.html#scores", Some("text/html")))
            .await
            .unwrap();
        let FetchOutcome::Respond { strategy, response } = outcome else {
            panic!("expected a response");
        };
        assert_eq!(strategy, Strategy::NetworkFirst);
        assert_eq!(response.status, 200);
        assert_eq!(&response.body[..], b"<html>index</html>");
    }

    #[tokio::test]
    async fn test_resume_after_restart_intercepts_again() {
        let f = activated().await;
        let restarted = Agent::new(&config("v1"), f.store.clone(), f.network.clone()).unwrap();
        assert!(restarted.resume().await.unwrap());

        f.network.fail("https://app.example/");
        let outcome = restarted.handle_fetch(&request("GET", "https://app.example/", Some("text/html"))).await.unwrap();
        let FetchOutcome::Respond { response, .. } = outcome else {
            panic!("expected a response");
        };
        assert_eq!(&response.body[..], b"<html>root</html>");
    }

    #[tokio::test]
    async fn test_resume_ignores_other_generation() {
        let f = activated().await;
        let next = Agent::new(&config("v2"), f.store.clone(), f.network.clone()).unwrap();
        assert!(!next.resume().await.unwrap());
        assert_eq!(next.lifecycle().active_generation().await, None);
    }

    #[tokio::test]
    async fn test_offline_without_document_synthesizes_page() {
        let f = activated().await;

        let outcome = f.agent.handle_fetch(&request("GET", "https://app.example/page", None)).await.unwrap();
        let FetchOutcome::Respond { response, .. } = outcome else {
            panic!("expected a response");
        };
        assert_eq!(response.status, 503);
        assert!(String::from_utf8_lossy(&response.body).contains("Skore Point"));
    }

    #[tokio::test]
    async fn test_cache_first_network_failure_propagates() {
        let f = activated().await;
        let result = f.agent.handle_fetch(&request("GET", "https://app.example/logo.png", None)).await;
        assert!(matches!(result, Err(Error::NetworkFailure(_))));
    }

    #[tokio::test]
    async fn test_new_deploy_replaces_generation() {
        let f = activated().await;
        let next = Agent::new(&config("v2"), f.store.clone(), f.network.clone()).unwrap();

        next.handle_install().await.unwrap();
        let report = next.handle_activate().await.unwrap();

        assert_eq!(report.deleted, vec!["skore-point-v1"]);
        assert_eq!(f.store.store_names().await.unwrap(), vec!["skore-point-v2"]);
    }

    #[tokio::test]
    async fn test_message_skip_waiting_activates() {
        let f = fixture().await;
        f.agent.handle_install().await.unwrap();

        let outcome = f.agent.handle_message(&json!({"type": "skip-waiting"})).await.unwrap();
        assert!(matches!(outcome, ControlOutcome::SkipWaiting { activated: Some(_) }));
        assert_eq!(f.agent.lifecycle().active_generation().await.unwrap().as_str(), "skore-point-v1");
    }

    #[tokio::test]
    async fn test_message_clear_cache_leaves_no_cache() {
        let f = activated().await;
        f.network.respond("https://app.example/app.css", 200, "text/css", "body{}");

        let outcome = f.agent.handle_message(&json!({"type": "CLEAR_CACHE"})).await.unwrap();
        assert_eq!(outcome, ControlOutcome::CacheCleared { deleted: true });
        assert!(f.store.store_names().await.unwrap().is_empty());

        // requests still succeed; writes into the cleared generation are dropped
        let outcome = f.agent.handle_fetch(&request("GET", "https://app.example/app.css", None)).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Respond { strategy: Strategy::CacheFirst, .. }));
        assert!(f.store.store_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_message_unknown_ignored() {
        let f = activated().await;
        let outcome = f.agent.handle_message(&json!({"type": "reload"})).await.unwrap();
        assert_eq!(outcome, ControlOutcome::Ignored);
        assert_eq!(f.store.store_names().await.unwrap(), vec!["skore-point-v1"]);
    }

    #[tokio::test]
    async fn test_push_shows_notification() {
        let f = fixture().await;
        let host = RecordingHost::default();

        let shown = f.agent.handle_push(None, &host).await.unwrap();
        assert_eq!(shown.title, "Skore Point");
        assert_eq!(shown.body, "New update available");
        assert_eq!(host.shown.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_notification_click_opens_base_when_no_window() {
        let f = fixture().await;
        let host = RecordingHost {
            clients: vec![WindowClient { id: "1".into(), url: "https://elsewhere.example/".into() }],
            ..Default::default()
        };

        let outcome = f.agent.handle_notification_click(&NotificationClick::default(), &host).await.unwrap();
        assert!(outcome.close);
        assert_eq!(outcome.window, WindowAction::Opened { url: SCOPE.into() });
    }

    #[tokio::test]
    async fn test_notification_click_focuses_app_window() {
        let f = fixture().await;
        let host = RecordingHost {
            clients: vec![WindowClient { id: "7".into(), url: "https://app.example/index.html".into() }],
            ..Default::default()
        };
        let click = NotificationClick { url: Some("./".into()), action: Some("open".into()) };

        let outcome = f.agent.handle_notification_click(&click, &host).await.unwrap();
        assert!(outcome.close);
        assert!(matches!(outcome.window, WindowAction::Focused { ref id, .. } if id == "7"));
    }
}
