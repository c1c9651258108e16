//! Domain error types
//!
//! This module defines the error hierarchy for Nimbus. Adapter errors are
//! domain-specific and don't expose third-party HTTP or SDK types.

use thiserror::Error;

/// Main Nimbus error type
///
/// This is the primary error type used throughout the application.
/// It wraps the adapter-specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum NimbusError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Azure Resource Graph errors
    #[error("Resource Graph error: {0}")]
    ResourceGraph(#[from] ResourceGraphError),

    /// Compute Placement Score errors
    #[error("Placement Score error: {0}")]
    Placement(#[from] PlacementError),

    /// Blob Storage errors
    #[error("Blob Storage error: {0}")]
    BlobStorage(#[from] BlobStorageError),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Network/connection errors
    #[error("Connection error: {0}")]
    Connection(String),

    /// Export process errors
    #[error("Export error: {0}")]
    Export(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// CSV writer errors
    #[error("CSV error: {0}")]
    Csv(String),

    /// Spreadsheet writer errors
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl NimbusError {
    /// Whether retrying the failed operation may succeed
    ///
    /// Connection failures, timeouts, throttling and server-side (5xx) errors
    /// are transient. Client errors and malformed responses are not.
    pub fn is_transient(&self) -> bool {
        match self {
            NimbusError::Connection(_) => true,
            NimbusError::ResourceGraph(e) => e.is_transient(),
            NimbusError::Placement(e) => e.is_transient(),
            NimbusError::BlobStorage(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Server-provided retry hint in seconds, if any
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            NimbusError::ResourceGraph(ResourceGraphError::Throttled {
                retry_after_secs, ..
            })
            | NimbusError::Placement(PlacementError::RequestFailed {
                retry_after_secs, ..
            })
            | NimbusError::BlobStorage(BlobStorageError::UploadFailed {
                retry_after_secs, ..
            }) => *retry_after_secs,
            _ => None,
        }
    }
}

/// Azure Resource Graph errors
///
/// Errors that occur when querying the Resource Graph REST API.
#[derive(Debug, Error)]
pub enum ResourceGraphError {
    /// Failed to reach the service
    #[error("Failed to connect to Resource Graph: {0}")]
    ConnectionFailed(String),

    /// Request timed out
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Throttled (429)
    #[error("Request throttled (429): {message}")]
    Throttled {
        message: String,
        retry_after_secs: Option<u64>,
    },

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// The continuation token never ran out
    #[error("Page limit of {0} exceeded while following continuation tokens")]
    PageLimitExceeded(usize),
}

impl ResourceGraphError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            ResourceGraphError::ConnectionFailed(_)
                | ResourceGraphError::Timeout(_)
                | ResourceGraphError::Throttled { .. }
                | ResourceGraphError::ServerError { .. }
        )
    }
}

/// Compute Placement Score errors
#[derive(Debug, Error)]
pub enum PlacementError {
    /// Failed to reach the service
    #[error("Failed to connect to Placement Score API: {0}")]
    ConnectionFailed(String),

    /// Request timed out
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// The API answered with a non-success status
    #[error("Placement Score request failed with status {status}: {body}")]
    RequestFailed {
        status: u16,
        body: String,
        retry_after_secs: Option<u64>,
    },

    /// Response body did not match the expected shape
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

impl PlacementError {
    fn is_transient(&self) -> bool {
        match self {
            PlacementError::ConnectionFailed(_) | PlacementError::Timeout(_) => true,
            PlacementError::RequestFailed { status, .. } => *status == 429 || *status >= 500,
            PlacementError::InvalidResponse(_) => false,
        }
    }
}

/// Blob Storage errors
#[derive(Debug, Error)]
pub enum BlobStorageError {
    /// Failed to reach the storage account
    #[error("Failed to connect to storage account: {0}")]
    ConnectionFailed(String),

    /// The PUT request was rejected
    #[error("Upload failed with status {status}: {message}")]
    UploadFailed {
        status: u16,
        message: String,
        retry_after_secs: Option<u64>,
    },

    /// The local artifact could not be read
    #[error("Failed to read artifact {path}: {message}")]
    ArtifactUnreadable { path: String, message: String },
}

impl BlobStorageError {
    fn is_transient(&self) -> bool {
        match self {
            BlobStorageError::ConnectionFailed(_) => true,
            BlobStorageError::UploadFailed { status, .. } => *status == 429 || *status >= 500,
            BlobStorageError::ArtifactUnreadable { .. } => false,
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for NimbusError {
    fn from(err: std::io::Error) -> Self {
        NimbusError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for NimbusError {
    fn from(err: serde_json::Error) -> Self {
        NimbusError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for NimbusError {
    fn from(err: toml::de::Error) -> Self {
        NimbusError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<csv::Error> for NimbusError {
    fn from(err: csv::Error) -> Self {
        NimbusError::Csv(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for NimbusError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        NimbusError::Spreadsheet(err.to_string())
    }
}
