//! Request-addressed cache key generation.

use sha2::{Digest, Sha256};
use url::Url;

use crate::http::Method;

/// Compute the partition key for a request.
///
/// The fragment never takes part in matching.
pub fn compute_request_key(method: &Method, url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);

    let mut hasher = Sha256::new();
    hasher.update(method.as_str().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_str().as_bytes());
    hex::encode(hasher.finalize())
}
