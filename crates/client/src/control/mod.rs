//! Out-of-band control channel.
//!
//! Pages post `{ "type": "skip-waiting" }` or `{ "type": "clear-cache" }`.
//! The upper-case spellings (`SKIP_WAITING`, `CLEAR_CACHE`) are accepted too.
//! Anything else is ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lifecycle::ActivateReport;

/// A recognised control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    #[serde(rename = "skip-waiting", alias = "SKIP_WAITING")]
    SkipWaiting,
    #[serde(rename = "clear-cache", alias = "CLEAR_CACHE")]
    ClearCache,
}

impl ControlMessage {
    /// Parse a posted message; `None` for unknown or malformed payloads.
    pub fn parse(message: &Value) -> Option<Self> {
        Self::deserialize(message).ok()
    }
}

/// What handling a control message did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum ControlOutcome {
    Ignored,
    SkipWaiting { activated: Option<ActivateReport> },
    CacheCleared { deleted: bool },
}
