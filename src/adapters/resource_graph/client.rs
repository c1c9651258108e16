//! Azure Resource Graph REST client

use super::models::{ErrorResponse, QueryRequestBody, QueryResponseBody, API_VERSION};
use super::source::{QueryPage, QueryRequest, QuerySource};
use crate::adapters::auth::{TokenProvider, MANAGEMENT_SCOPE};
use crate::adapters::http::{build_http_client, retry_after_secs, truncate_body};
use crate::adapters::retry::retry_with_backoff;
use crate::config::{HttpConfig, RetryConfig};
use crate::domain::ids::SubscriptionId;
use crate::domain::{ResourceGraphError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;

/// Resource Graph query client
///
/// Each [`QuerySource::query`] call is one POST, retried on transient
/// failures.
///
/// # Example
///
/// ```no_run
/// use nimbus::adapters::auth::StaticTokenProvider;
/// use nimbus::adapters::resource_graph::{QueryRequest, QuerySource, ResourceGraphClient};
/// use nimbus::config::HttpConfig;
/// use std::sync::Arc;
///
/// # async fn example() -> nimbus::domain::Result<()> {
/// let tokens = Arc::new(StaticTokenProvider::new("token"));
/// let client = ResourceGraphClient::new(&HttpConfig::default(), Vec::new(), tokens)?;
/// let page = client.query(&QueryRequest::first_page("Resources | limit 5", 5)).await?;
/// println!("{} of {} records", page.records.len(), page.total_records);
/// # Ok(())
/// # }
/// ```
pub struct ResourceGraphClient {
    client: Client,
    endpoint: String,
    subscriptions: Vec<SubscriptionId>,
    tokens: Arc<dyn TokenProvider>,
    retry: RetryConfig,
}

impl ResourceGraphClient {
    /// Create a client for the management endpoint in `http`
    ///
    /// An empty `subscriptions` list queries every subscription the identity can read.
    pub fn new(
        http: &HttpConfig,
        subscriptions: Vec<SubscriptionId>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self> {
        Ok(Self {
            client: build_http_client(http)?,
            endpoint: http.management_endpoint.trim_end_matches('/').to_string(),
            subscriptions,
            tokens,
            retry: http.retry.clone(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/providers/Microsoft.ResourceGraph/resources?api-version={API_VERSION}",
            self.endpoint
        )
    }

    async fn send_page(&self, request: &QueryRequest) -> Result<QueryPage> {
        let token = self.tokens.bearer_token(MANAGEMENT_SCOPE).await?;
        let body = QueryRequestBody::new(request, &self.subscriptions);

        let response = self
            .client
            .post(self.url())
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ResourceGraphError::Timeout(e.to_string())
                } else {
                    ResourceGraphError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_secs(response.headers());
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &text, retry_after).into());
        }

        let text = response
            .text()
            .await
            .map_err(|e| ResourceGraphError::InvalidResponse(e.to_string()))?;
        let body: QueryResponseBody = serde_json::from_str(&text).map_err(|e| {
            ResourceGraphError::InvalidResponse(format!("Failed to parse query response: {e}"))
        })?;

        if body.result_truncated.as_deref() == Some("true") {
            tracing::warn!(
                skip = request.skip,
                count = body.count,
                "Resource Graph reported a truncated page"
            );
        }

        Ok(body.into())
    }
}

fn status_error(status: StatusCode, body: &str, retry_after: Option<u64>) -> ResourceGraphError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| format!("{}: {}", e.error.code, e.error.message))
        .unwrap_or_else(|_| truncate_body(body));

    if status == StatusCode::TOO_MANY_REQUESTS {
        ResourceGraphError::Throttled {
            message,
            retry_after_secs: retry_after,
        }
    } else if status.is_server_error() {
        ResourceGraphError::ServerError {
            status: status.as_u16(),
            message,
        }
    } else {
        ResourceGraphError::ClientError {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl QuerySource for ResourceGraphClient {
    async fn query(&self, request: &QueryRequest) -> Result<QueryPage> {
        retry_with_backoff(&self.retry, "resource_graph_query", || self.send_page(request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_mapping() {
        let body = r#"{"error": {"code": "BadRequest", "message": "Query is invalid"}}"#;
        match status_error(StatusCode::BAD_REQUEST, body, None) {
            ResourceGraphError::ClientError { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "BadRequest: Query is invalid");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "", Some(4)),
            ResourceGraphError::Throttled {
                retry_after_secs: Some(4),
                ..
            }
        ));

        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "oops", None),
            ResourceGraphError::ServerError { status: 502, .. }
        ));
    }
}
