//! Shared HTTP client plumbing

use crate::config::HttpConfig;
use crate::domain::{NimbusError, Result};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Build the reqwest client used by every REST adapter
pub fn build_http_client(config: &HttpConfig) -> Result<Client> {
    ClientBuilder::new()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .connect_timeout(Duration::from_secs(config.timeout_seconds.min(30)))
        .user_agent(concat!("nimbus/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| NimbusError::Configuration(format!("Failed to create HTTP client: {e}")))
}

/// Seconds from a `Retry-After` header, when it holds an integer
pub fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Trim a response body for inclusion in an error message
pub fn truncate_body(body: &str) -> String {
    const LIMIT: usize = 512;
    if body.len() <= LIMIT {
        return body.to_string();
    }
    let mut end = LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
