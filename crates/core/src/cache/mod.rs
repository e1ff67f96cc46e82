//! Generational response cache.
//!
//! Responses are stored per generation (a named store namespace) and keyed
//! by method and resolved locator. Only whole generations are ever deleted;
//! there is no per-entry expiry or eviction.
//!
//! [`CacheStore`] is the seam the strategies and lifecycle work against;
//! [`CacheDb`] is the SQLite implementation.

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod store;

use async_trait::async_trait;

use crate::Error;
use crate::request::Response;

pub use connection::CacheDb;
pub use store::Snapshot;

/// Underlying connection error carried by [`Error::StoreUnavailable`].
pub use tokio_rusqlite::Error as StoreError;

/// Open/match/put/delete over named cache generations.
///
/// Every operation may fail with [`Error::StoreUnavailable`].
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Open a store, creating it if it does not exist.
    async fn open_store(&self, name: &str) -> Result<(), Error>;

    /// Look up a stored response in one store.
    async fn match_entry(&self, name: &str, method: &str, locator: &str) -> Result<Option<Snapshot>, Error>;

    /// Store a response, replacing any previous one (last write wins).
    ///
    /// Returns `false` without writing when the store no longer exists.
    async fn put_entry(&self, name: &str, method: &str, locator: &str, response: &Response) -> Result<bool, Error>;

    /// Delete a store with all of its entries. Returns whether it existed.
    async fn delete_store(&self, name: &str) -> Result<bool, Error>;

    /// Names of all stores, oldest first.
    async fn store_names(&self) -> Result<Vec<String>, Error>;
}
