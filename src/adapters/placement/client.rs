//! Compute Placement Score REST client

use super::models::{PlacementScoreRequest, PlacementScoreResponse};
use crate::adapters::auth::{TokenProvider, MANAGEMENT_SCOPE};
use crate::adapters::http::{build_http_client, retry_after_secs, truncate_body};
use crate::adapters::retry::retry_with_backoff;
use crate::config::{HttpConfig, PlacementConfig, RetryConfig};
use crate::domain::{PlacementError, Result, SubscriptionId};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::sync::Arc;

/// A service that generates placement scores
#[async_trait]
pub trait PlacementScoreSource: Send + Sync {
    /// Request scores for one payload
    ///
    /// # Errors
    ///
    /// Any non-success status is returned as [`PlacementError::RequestFailed`].
    async fn generate(&self, request: &PlacementScoreRequest) -> Result<PlacementScoreResponse>;
}

/// Placement Score client bound to one subscription and location
pub struct PlacementScoreClient {
    client: Client,
    endpoint: String,
    subscription_id: SubscriptionId,
    location: String,
    api_version: String,
    tokens: Arc<dyn TokenProvider>,
    retry: RetryConfig,
}

impl PlacementScoreClient {
    pub fn new(
        http: &HttpConfig,
        placement: &PlacementConfig,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self> {
        Ok(Self {
            client: build_http_client(http)?,
            endpoint: http.management_endpoint.trim_end_matches('/').to_string(),
            subscription_id: placement.subscription_id.clone(),
            location: placement.location.clone(),
            api_version: placement.api_version.clone(),
            tokens,
            retry: http.retry.clone(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/subscriptions/{}/providers/Microsoft.Compute/locations/{}/placementScores/regular/generate?api-version={}",
            self.endpoint, self.subscription_id, self.location, self.api_version
        )
    }

    async fn send(&self, request: &PlacementScoreRequest) -> Result<PlacementScoreResponse> {
        let token = self.tokens.bearer_token(MANAGEMENT_SCOPE).await?;

        let response = self
            .client
            .post(self.url())
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PlacementError::Timeout(e.to_string())
                } else {
                    PlacementError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        let retry_after = retry_after_secs(response.headers());
        let text = response
            .text()
            .await
            .map_err(|e| PlacementError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            return Err(PlacementError::RequestFailed {
                status: status.as_u16(),
                body: truncate_body(&text),
                retry_after_secs: retry_after,
            }
            .into());
        }

        let body = serde_json::from_str(&text).map_err(|e| {
            PlacementError::InvalidResponse(format!("Failed to parse placement scores: {e}"))
        })?;
        Ok(body)
    }
}

#[async_trait]
impl PlacementScoreSource for PlacementScoreClient {
    async fn generate(&self, request: &PlacementScoreRequest) -> Result<PlacementScoreResponse> {
        tracing::debug!(
            subscription_id = %self.subscription_id,
            location = %self.location,
            sizes = request.desired_sizes.len(),
            regions = request.desired_locations.len(),
            "Requesting placement scores"
        );
        retry_with_backoff(&self.retry, "placement_scores", || self.send(request)).await
    }
}
