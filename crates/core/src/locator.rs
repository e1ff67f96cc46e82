//! Locator resolution for consistent cache keys.
//!
//! Asset lists mix relative paths (`./index.html`) and absolute URLs; every
//! locator is resolved against the agent's scope before it touches the store.

use url::Url;

/// Error type for locator resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LocatorError {
    #[error("empty locator")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid locator: {0}")]
    Invalid(String),
}

/// Parse the scope URL every relative locator is resolved against.
///
/// The scope must be an absolute `http`/`https` URL. A trailing slash is
/// appended so that `./x` resolves beneath the scope instead of beside it.
pub fn parse_scope(input: &str) -> Result<Url, LocatorError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(LocatorError::Empty);
    }

    let with_slash = if trimmed.ends_with('/') { trimmed.to_string() } else { format!("{trimmed}/") };
    let parsed = Url::parse(&with_slash).map_err(|e| LocatorError::Invalid(e.to_string()))?;
    normalize(parsed)
}

/// Resolve a locator against the scope.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Join relative locators onto the scope
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn resolve(scope: &Url, locator: &str) -> Result<Url, LocatorError> {
    let trimmed = locator.trim();

    if trimmed.is_empty() {
        return Err(LocatorError::Empty);
    }

    let joined = scope.join(trimmed).map_err(|e| LocatorError::Invalid(e.to_string()))?;
    normalize(joined)
}

fn normalize(mut parsed: Url) -> Result<Url, LocatorError> {
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(LocatorError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        parsed
            .set_host(Some(&lowered))
            .map_err(|e| LocatorError::Invalid(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Whether `url` lies at or beneath the scope's path on the same origin.
pub fn within_scope(scope: &Url, url: &Url) -> bool {
    scope.origin() == url.origin() && url.path().starts_with(scope.path())
}
