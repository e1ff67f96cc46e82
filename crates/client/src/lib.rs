//! Runtime side of the offgrid caching agent.
//!
//! [`Agent`] receives host signals (intercepted fetches, install and activate
//! triggers, control messages, pushes, notification clicks) and dispatches
//! them to the strategy executors and the generation lifecycle. The store
//! and the network are injected as trait objects so the same agent drives a
//! real SQLite store over HTTP or scripted fakes in tests.

pub mod agent;
pub mod control;
pub mod fetch;
pub mod lifecycle;
pub mod notify;
pub mod strategy;

#[cfg(test)]
mod testing;

pub use agent::{Agent, FetchOutcome, NotificationClick};
pub use control::{ControlMessage, ControlOutcome};
pub use fetch::{FetchConfig, HttpNetwork, Network};
pub use lifecycle::{ActivateReport, InstallReport, Lifecycle, LifecycleState, Phase};
pub use notify::{ClickOutcome, Notification, NotificationTemplate, Notifier, WindowAction, WindowClient, WindowClients};
pub use strategy::{Executor, OfflineFallback};
