//! Scripted network, failing store and recording host used by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use offgrid_core::cache::StoreError;
use offgrid_core::{CacheDb, CacheStore, Error, RequestDescriptor, Response, Snapshot};

use crate::fetch::Network;
use crate::notify::{Notification, Notifier, WindowClient, WindowClients};

enum Scripted {
    Respond(Response),
    Fail,
}

/// A network whose answers are set per URL. Unscripted URLs fail.
#[derive(Default)]
pub struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, status: u16, content_type: &str, body: &str) {
        let response = Response::new(status, vec![("content-type".into(), content_type.into())], body.to_string());
        self.routes.lock().unwrap().insert(url.to_string(), Scripted::Respond(response));
    }

    pub fn fail(&self, url: &str) {
        self.routes.lock().unwrap().insert(url.to_string(), Scripted::Fail);
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<Response, Error> {
        let url = request.url.as_str().to_string();
        self.calls.lock().unwrap().push(url.clone());
        match self.routes.lock().unwrap().get(&url) {
            Some(Scripted::Respond(response)) => Ok(response.clone()),
            Some(Scripted::Fail) | None => Err(Error::NetworkFailure(format!("scripted failure: {url}"))),
        }
    }
}

/// Delegates to an in-memory [`CacheDb`] but can be told to reject writes.
pub struct FlakyStore {
    pub inner: CacheDb,
    fail_puts: AtomicBool,
    vanish: Mutex<Option<String>>,
    puts: AtomicUsize,
}

impl FlakyStore {
    pub async fn new() -> Self {
        Self {
            inner: CacheDb::open_in_memory().await.unwrap(),
            fail_puts: AtomicBool::new(false),
            vanish: Mutex::new(None),
            puts: AtomicUsize::new(0),
        }
    }

    pub fn fail_puts(&self) {
        self.fail_puts.store(true, Ordering::SeqCst);
    }

    /// Delete store `name` right before the next write into it, as a
    /// concurrent activation would.
    pub fn vanish_on_put(&self, name: &str) {
        *self.vanish.lock().unwrap() = Some(name.to_string());
    }

    pub fn put_attempts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for FlakyStore {
    async fn open_store(&self, name: &str) -> Result<(), Error> {
        self.inner.open_store(name).await
    }

    async fn match_entry(&self, name: &str, method: &str, locator: &str) -> Result<Option<Snapshot>, Error> {
        self.inner.match_entry(name, method, locator).await
    }

    async fn put_entry(&self, name: &str, method: &str, locator: &str, response: &Response) -> Result<bool, Error> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(Error::StoreUnavailable(StoreError::ConnectionClosed));
        }
        let vanish = self.vanish.lock().unwrap().as_deref() == Some(name);
        if vanish {
            self.inner.delete_store(name).await?;
        }
        self.inner.put_entry(name, method, locator, response).await
    }

    async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        self.inner.delete_store(name).await
    }

    async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.inner.store_names().await
    }
}

/// Records notifications and window operations instead of performing them.
#[derive(Default)]
pub struct RecordingHost {
    pub clients: Vec<WindowClient>,
    pub shown: Mutex<Vec<Notification>>,
    pub focused: Mutex<Vec<String>>,
    pub opened: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for RecordingHost {
    async fn show_notification(&self, notification: &Notification) -> Result<(), Error> {
        self.shown.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

#[async_trait]
impl WindowClients for RecordingHost {
    async fn match_all(&self) -> Result<Vec<WindowClient>, Error> {
        Ok(self.clients.clone())
    }

    async fn focus(&self, client: &WindowClient) -> Result<(), Error> {
        self.focused.lock().unwrap().push(client.id.clone());
        Ok(())
    }

    async fn open_window(&self, url: &str) -> Result<(), Error> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}
