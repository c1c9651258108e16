//! Query collaborator of the export loop
//!
//! [`QuerySource`] is the seam between the paginated export loop and the
//! service that answers paged queries. [`QueryRequest`] is the immutable
//! request descriptor; [`QueryPage`] is one page of results.

use crate::domain::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// One result row: column name to value, in the column order the service returned
pub type Record = Map<String, Value>;

/// Immutable paged-query descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    /// Query text
    pub query: String,
    /// Maximum records per page (`$top`)
    pub page_size: usize,
    /// Records to skip (`$skip`)
    pub skip: usize,
    /// Continuation token from the previous page (`$skipToken`)
    pub skip_token: Option<String>,
}

impl QueryRequest {
    /// Request for the first page: skip 0, no token
    pub fn first_page(query: impl Into<String>, page_size: usize) -> Self {
        Self {
            query: query.into(),
            page_size,
            skip: 0,
            skip_token: None,
        }
    }

    /// Request for the following page
    ///
    /// Advances the skip offset by one page and carries `skip_token` forward.
    ///
    /// # Examples
    ///
    /// ```
    /// use nimbus::adapters::resource_graph::QueryRequest;
    ///
    /// let first = QueryRequest::first_page("Resources", 1000);
    /// let second = first.next_page(Some("token-1".to_string()));
    /// assert_eq!(second.skip, 1000);
    /// assert_eq!(second.skip_token.as_deref(), Some("token-1"));
    /// assert_eq!(first.skip, 0);
    /// ```
    pub fn next_page(&self, skip_token: Option<String>) -> Self {
        Self {
            query: self.query.clone(),
            page_size: self.page_size,
            skip: self.skip + self.page_size,
            skip_token,
        }
    }
}

/// One page of query results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    /// Records in retrieval order
    pub records: Vec<Record>,
    /// Total matching records as reported by the service
    pub total_records: u64,
    /// Token for the next page, absent on the last page
    pub skip_token: Option<String>,
}

/// A service that answers paged queries
#[async_trait]
pub trait QuerySource: Send + Sync {
    /// Execute one page of the query
    async fn query(&self, request: &QueryRequest) -> Result<QueryPage>;
}
