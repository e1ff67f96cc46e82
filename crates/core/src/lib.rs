//! Core types and shared functionality for offgrid.
//!
//! This crate provides:
//! - The request routing policy (classifier)
//! - Generational cache store with SQLite backend
//! - Locator resolution and asset manifests
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod locator;
pub mod manifest;
pub mod request;

pub use cache::{CacheDb, CacheStore, Snapshot};
pub use classify::{Route, RoutingPolicy, Strategy};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use manifest::AssetManifest;
pub use request::{Generation, RequestDescriptor, Response};
