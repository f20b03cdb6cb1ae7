//! Cache key helpers.

use serde::Serialize;

/// Builds a cache key from a prefix and JSON-encoded parameters.
///
/// `create_cache_key("openai-optimize", &["gpt-4", "job text"])` produces
/// `openai-optimize:"gpt-4":"job text"`.
pub fn create_cache_key<P: Serialize>(prefix: &str, params: &[P]) -> serde_json::Result<String> {
    let mut key = prefix.to_string();
    for param in params {
        key.push(':');
        key.push_str(&serde_json::to_string(param)?);
    }
    Ok(key)
}
