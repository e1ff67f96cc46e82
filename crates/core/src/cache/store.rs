//! SQLite implementation of [`CacheStore`].

use async_trait::async_trait;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, types::Type};

use super::CacheStore;
use super::connection::CacheDb;
use super::hash::compute_entry_key;
use crate::Error;
use crate::request::Response;

/// A stored copy of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub store: String,
    pub method: String,
    pub locator: String,
    pub response: Response,
    /// RFC 3339 time the entry was written.
    pub stored_at: String,
}

#[async_trait]
impl CacheStore for CacheDb {
    async fn open_store(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![name, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn match_entry(&self, name: &str, method: &str, locator: &str) -> Result<Option<Snapshot>, Error> {
        let store = name.to_string();
        let key_hash = compute_entry_key(method, locator);
        self.conn
            .call(move |conn| -> Result<Option<Snapshot>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, locator, status, headers_json, body, stored_at
                     FROM entries WHERE store = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![store, key_hash], |row| {
                    let headers_json: String = row.get(3)?;
                    let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)
                        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
                    let body: Vec<u8> = row.get(4)?;
                    Ok(Snapshot {
                        store: store.clone(),
                        method: row.get(0)?,
                        locator: row.get(1)?,
                        response: Response::new(row.get(2)?, headers, body),
                        stored_at: row.get(5)?,
                    })
                });

                match result {
                    Ok(snapshot) => Ok(Some(snapshot)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn put_entry(&self, name: &str, method: &str, locator: &str, response: &Response) -> Result<bool, Error> {
        let store = name.to_string();
        let method = method.to_string();
        let locator = locator.to_string();
        let key_hash = compute_entry_key(&method, &locator);
        let status = response.status;
        let headers_json = serde_json::to_string(&response.headers)
            .map_err(|e| Error::InvalidInput(format!("unserializable headers: {e}")))?;
        let body = response.body.to_vec();
        let stored_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let written = conn.execute(
                    "INSERT INTO entries (store, key_hash, method, locator, status, headers_json, body, stored_at)
                     SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8
                     WHERE EXISTS (SELECT 1 FROM stores WHERE name = ?1)
                     ON CONFLICT(store, key_hash) DO UPDATE SET
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![store, key_hash, method, locator, status, headers_json, body, stored_at],
                )?;
                Ok(written > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM stores WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY rowid")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }
}

impl CacheDb {
    /// Number of entries held by a store.
    pub async fn entry_count(&self, name: &str) -> Result<u64, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE store = ?1", params![name], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
