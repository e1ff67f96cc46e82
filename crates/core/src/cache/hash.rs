//! Cache entry key generation.

use sha2::{Digest, Sha256};

/// Compute the key of a cached response within one generation.
///
/// Only the method and the resolved locator participate; request headers
/// never vary the entry.
pub fn compute_entry_key(method: &str, locator: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(locator.as_bytes());
    hex::encode(hasher.finalize())
}
