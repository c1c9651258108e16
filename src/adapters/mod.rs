//! External system integrations for Nimbus.
//!
//! This module provides adapters for the Azure services the jobs talk to:
//!
//! - [`auth`] - Azure AD bearer tokens (managed identity or client secret)
//! - [`resource_graph`] - Resource Graph paged queries
//! - [`placement`] - Compute Placement Score generation
//! - [`blob`] - Blob Storage uploads
//! - [`retry`] - exponential backoff for transient failures
//!
//! # Design Pattern
//!
//! Each service sits behind a trait ([`resource_graph::QuerySource`],
//! [`placement::PlacementScoreSource`], [`blob::BlobUploader`],
//! [`auth::TokenProvider`]) so the jobs can be exercised with in-memory
//! implementations. The REST clients map HTTP failures into the domain error
//! types and never leak `reqwest` errors.
//!
//! ```rust,no_run
//! use nimbus::adapters::auth::AzureTokenProvider;
//! use nimbus::adapters::blob::{BlobStorageClient, BlobUploader};
//! use nimbus::config::load_config;
//! use nimbus::domain::BlobName;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("nimbus.toml")?;
//! let tokens = Arc::new(AzureTokenProvider::from_config(&config.identity)?);
//! let uploader = BlobStorageClient::new(&config.storage, &config.http, tokens)?;
//!
//! let blob = BlobName::new("report.csv")?;
//! let receipt = uploader
//!     .upload(Path::new("/tmp/report.csv"), &config.storage.container_name, &blob)
//!     .await?;
//! println!("Uploaded {} bytes", receipt.bytes);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod blob;
pub mod http;
pub mod placement;
pub mod resource_graph;
pub mod retry;
