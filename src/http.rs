//! Shared HTTP plumbing for the proxy and geocoder clients

use crate::error::NetworkError;
use crate::{Result, YouAreHereError};
use std::time::Duration;

/// Header carrying the static client key expected by the proxy
pub const CLIENT_KEY_HEADER: &str = "x-client-key";

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("youarehere/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by all collaborators
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| YouAreHereError::ConfigError(format!("Failed to build HTTP client: {}", e)))
}

/// Join a base URL and a path without doubling or dropping the slash
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Map a non-2xx response to [`NetworkError::Status`], keeping a short body excerpt
pub async fn ensure_success(response: reqwest::Response) -> std::result::Result<reqwest::Response, NetworkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string()
    } else {
        body.chars().take(200).collect()
    };

    Err(NetworkError::Status {
        status: status.as_u16(),
        message,
    })
}
