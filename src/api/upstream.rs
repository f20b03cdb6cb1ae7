//! Upstream HTTP calls made through the coordinator.

use crate::error::{RequestError, Result};

/// A successful upstream response, cached as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

/// Performs one GET against `url`.
///
/// Non-success statuses become errors tagged from the status code, so the
/// coordinator retries 502/503/504 and 429 but not 4xx client errors.
pub async fn get(client: &reqwest::Client, url: &str) -> Result<UpstreamResponse> {
    let response = client.get(url).send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(RequestError::from_status(status.as_u16(), &body));
    }

    Ok(UpstreamResponse {
        status: status.as_u16(),
        body,
    })
}
