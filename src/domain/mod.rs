//! Domain types for Nimbus.
//!
//! The domain layer provides:
//! - **Validated identifiers** ([`SubscriptionId`], [`ContainerName`], [`BlobName`])
//! - **Error types** ([`NimbusError`], [`ResourceGraphError`], [`PlacementError`], [`BlobStorageError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, NimbusError>`]:
//!
//! ```rust
//! use nimbus::domain::{NimbusError, Result};
//! use nimbus::domain::ContainerName;
//!
//! fn container(name: &str) -> Result<ContainerName> {
//!     ContainerName::new(name).map_err(NimbusError::Validation)
//! }
//! # assert!(container("exports").is_ok());
//! ```

pub mod errors;
pub mod ids;
pub mod result;

pub use errors::{BlobStorageError, NimbusError, PlacementError, ResourceGraphError};
pub use ids::{BlobName, ContainerName, SubscriptionId};
pub use result::Result;
