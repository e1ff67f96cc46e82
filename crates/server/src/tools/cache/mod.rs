//! Cache-related MCP tools.
//!
//! This module provides read-only views of the generation stores.

pub mod inspect;

pub use inspect::{CacheInspectParams, inspect_impl};
