//! Blob Storage upload client

use crate::adapters::auth::{TokenProvider, STORAGE_SCOPE};
use crate::adapters::http::{build_http_client, retry_after_secs, truncate_body};
use crate::adapters::retry::retry_with_backoff;
use crate::config::{HttpConfig, RetryConfig, StorageConfig};
use crate::domain::{BlobName, BlobStorageError, ContainerName, NimbusError, Result};
use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG};
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Storage REST API version sent in `x-ms-version`
pub const STORAGE_API_VERSION: &str = "2023-11-03";

/// Confirmation of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub container: ContainerName,
    pub blob_name: BlobName,
    pub bytes: u64,
    pub etag: Option<String>,
}

/// Destination for finished artifacts
#[async_trait]
pub trait BlobUploader: Send + Sync {
    /// Upload the file at `artifact_path` as `container/blob_name`, overwriting any existing blob
    async fn upload(
        &self,
        artifact_path: &Path,
        container: &ContainerName,
        blob_name: &BlobName,
    ) -> Result<UploadReceipt>;
}

/// Block blob uploader for one storage account
pub struct BlobStorageClient {
    client: Client,
    account_url: Url,
    tokens: Arc<dyn TokenProvider>,
    retry: RetryConfig,
}

impl BlobStorageClient {
    pub fn new(
        storage: &StorageConfig,
        http: &HttpConfig,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self> {
        let account_url = Url::parse(&storage.account_url).map_err(|e| {
            NimbusError::Configuration(format!("Invalid storage.account_url: {e}"))
        })?;

        Ok(Self {
            client: build_http_client(http)?,
            account_url,
            tokens,
            retry: http.retry.clone(),
        })
    }

    /// Full URL of `container/blob_name`
    pub fn blob_url(&self, container: &ContainerName, blob_name: &BlobName) -> Result<Url> {
        let mut url = self.account_url.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|_| {
                NimbusError::Configuration(format!(
                    "storage.account_url cannot be a base URL: {}",
                    self.account_url
                ))
            })?
            .pop_if_empty()
            .push(container.as_str())
            .extend(blob_name.as_str().split('/'));
        Ok(url)
    }

    async fn put_blob(
        &self,
        url: &Url,
        blob_name: &BlobName,
        body: &[u8],
    ) -> Result<Option<String>> {
        let token = self.tokens.bearer_token(STORAGE_SCOPE).await?;

        let response = self
            .client
            .put(url.clone())
            .bearer_auth(token)
            .header("x-ms-blob-type", "BlockBlob")
            .header("x-ms-version", STORAGE_API_VERSION)
            .header(CONTENT_TYPE, content_type_for(blob_name))
            .header(CONTENT_LENGTH, body.len())
            .body(body.to_vec())
            .send()
            .await
            .map_err(|e| BlobStorageError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_secs(response.headers());
            let text = response.text().await.unwrap_or_default();
            return Err(BlobStorageError::UploadFailed {
                status: status.as_u16(),
                message: truncate_body(&text),
                retry_after_secs: retry_after,
            }
            .into());
        }

        Ok(response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string))
    }
}

#[async_trait]
impl BlobUploader for BlobStorageClient {
    async fn upload(
        &self,
        artifact_path: &Path,
        container: &ContainerName,
        blob_name: &BlobName,
    ) -> Result<UploadReceipt> {
        let body = tokio::fs::read(artifact_path).await.map_err(|e| {
            BlobStorageError::ArtifactUnreadable {
                path: artifact_path.display().to_string(),
                message: e.to_string(),
            }
        })?;
        let url = self.blob_url(container, blob_name)?;

        tracing::debug!(
            container = %container,
            blob_name = %blob_name,
            bytes = body.len(),
            "Uploading artifact"
        );

        let etag = retry_with_backoff(&self.retry, "blob_upload", || {
            self.put_blob(&url, blob_name, &body)
        })
        .await?;

        Ok(UploadReceipt {
            container: container.clone(),
            blob_name: blob_name.clone(),
            bytes: body.len() as u64,
            etag,
        })
    }
}

/// MIME type for a blob, derived from its extension
pub fn content_type_for(blob_name: &BlobName) -> &'static str {
    match blob_name.extension().as_deref() {
        Some("csv") => "text/csv",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::StaticTokenProvider;

    fn client(account_url: &str) -> BlobStorageClient {
        let storage = StorageConfig {
            account_url: account_url.to_string(),
            container_name: ContainerName::new("exports").unwrap(),
        };
        BlobStorageClient::new(
            &storage,
            &HttpConfig::default(),
            Arc::new(StaticTokenProvider::new("t")),
        )
        .unwrap()
    }

    #[test]
    fn test_blob_url() {
        let container = ContainerName::new("exports").unwrap();
        let blob = BlobName::new("azure_disks_20240115.csv").unwrap();

        let url = client("https://acct.blob.core.windows.net")
            .blob_url(&container, &blob)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://acct.blob.core.windows.net/exports/azure_disks_20240115.csv"
        );

        let url = client("https://acct.blob.core.windows.net/")
            .blob_url(&container, &blob)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://acct.blob.core.windows.net/exports/azure_disks_20240115.csv"
        );
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(
            content_type_for(&BlobName::new("a.csv").unwrap()),
            "text/csv"
        );
        assert_eq!(
            content_type_for(&BlobName::new("a.xlsx").unwrap()),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(
            content_type_for(&BlobName::new("a.bin").unwrap()),
            "application/octet-stream"
        );
    }
}
