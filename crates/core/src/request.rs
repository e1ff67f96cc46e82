//! Request descriptors, responses and generation identifiers.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

/// An intercepted request, read-only input to classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// Upper-cased HTTP method.
    pub method: String,
    pub url: Url,
    /// Value of the `Accept` header, if the request carried one.
    pub accept: Option<String>,
}

impl RequestDescriptor {
    /// The fragment is dropped; it never reaches the server and is not part
    /// of the cache key.
    pub fn new(method: &str, mut url: Url, accept: Option<String>) -> Self {
        url.set_fragment(None);
        Self { method: method.trim().to_ascii_uppercase(), url, accept }
    }

    /// A plain `GET` with no `Accept` header, as issued for install-time population.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url, None)
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// The locator used as the cache key.
    pub fn locator(&self) -> &str {
        self.url.as_str()
    }

    /// Literal suffix after the last `.` of the final path segment.
    pub fn extension(&self) -> Option<&str> {
        let segment = self.url.path().rsplit('/').next()?;
        let (stem, ext) = segment.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() { None } else { Some(ext) }
    }
}

/// A response: live from the network, read back from the store, or synthesized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self { status, headers, body: body.into() }
    }

    /// Case-insensitive header lookup, first match wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Identifier of one cache generation; doubles as the store name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Generation(String);

impl Generation {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Generation {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
