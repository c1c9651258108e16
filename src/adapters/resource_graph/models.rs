//! Resource Graph REST wire models
//!
//! `POST /providers/Microsoft.ResourceGraph/resources?api-version=2021-03-01`

use super::source::{QueryPage, QueryRequest, Record};
use crate::domain::ids::SubscriptionId;
use serde::{Deserialize, Serialize};

/// Resource Graph API version
pub const API_VERSION: &str = "2021-03-01";

/// Request body
#[derive(Debug, Serialize)]
pub struct QueryRequestBody<'a> {
    pub query: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscriptions: Option<&'a [SubscriptionId]>,

    pub options: QueryRequestOptions<'a>,
}

/// Paging and format options
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequestOptions<'a> {
    #[serde(rename = "$top")]
    pub top: usize,

    #[serde(rename = "$skip")]
    pub skip: usize,

    #[serde(rename = "$skipToken", skip_serializing_if = "Option::is_none")]
    pub skip_token: Option<&'a str>,

    pub result_format: &'static str,
}

impl<'a> QueryRequestBody<'a> {
    /// Build the body for one page
    pub fn new(request: &'a QueryRequest, subscriptions: &'a [SubscriptionId]) -> Self {
        Self {
            query: &request.query,
            subscriptions: (!subscriptions.is_empty()).then_some(subscriptions),
            options: QueryRequestOptions {
                top: request.page_size,
                skip: request.skip,
                skip_token: request.skip_token.as_deref(),
                result_format: "objectArray",
            },
        }
    }
}

/// Response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponseBody {
    pub total_records: u64,

    #[serde(default)]
    pub count: u64,

    #[serde(default)]
    pub result_truncated: Option<String>,

    #[serde(rename = "$skipToken", default)]
    pub skip_token: Option<String>,

    #[serde(default)]
    pub data: Vec<Record>,
}

impl From<QueryResponseBody> for QueryPage {
    fn from(body: QueryResponseBody) -> Self {
        QueryPage {
            records: body.data,
            total_records: body.total_records,
            skip_token: body.skip_token.filter(|t| !t.is_empty()),
        }
    }
}

/// Error envelope returned on non-success status codes
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error code and message
#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
