// Nimbus - Scheduled Azure inventory exports
// Copyright (c) 2025 Nimbus Contributors
// Licensed under the MIT License

//! # Nimbus - Azure inventory exports
//!
//! Nimbus runs two periodic jobs that query Azure and drop the results into a
//! Blob Storage container:
//!
//! - **Disk inventory**: pages an Azure Resource Graph query over managed disks
//!   into a CSV file
//! - **Placement score**: asks the Compute Placement Score API how likely a set
//!   of VM sizes can be allocated per region and writes the scores to an xlsx
//!   workbook
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Export loop, jobs and scheduling
//! - [`adapters`] - Azure REST integrations (Resource Graph, Compute, Blob Storage, AAD)
//! - [`domain`] - Error types and validated identifiers
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nimbus::adapters::auth::AzureTokenProvider;
//! use nimbus::config::load_config;
//! use nimbus::core::jobs::{DiskInventoryJob, Job};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("nimbus.toml")?;
//!     let tokens = Arc::new(AzureTokenProvider::from_config(&config.identity)?);
//!
//!     let job = DiskInventoryJob::from_config(&config, tokens)?;
//!     let report = job.run(false).await?;
//!     report.log_report();
//!     Ok(())
//! }
//! ```
//!
//! ## Paginated Export
//!
//! The export loop works against any [`QuerySource`](adapters::resource_graph::QuerySource)
//! and any [`ExportSink`](core::export::ExportSink):
//!
//! ```rust,no_run
//! use nimbus::adapters::resource_graph::QuerySource;
//! use nimbus::core::export::{CsvSink, PaginatedExporter, PaginationConfig};
//!
//! # async fn example(source: &dyn QuerySource) -> nimbus::domain::Result<()> {
//! let exporter = PaginatedExporter::new("Resources | project id, name", PaginationConfig::default());
//! let summary = exporter
//!     .export(source, || CsvSink::create("/tmp/resources.csv"))
//!     .await?;
//!
//! println!("{} rows in {} pages", summary.rows_written, summary.pages_fetched);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Library code returns [`domain::Result`], whose error type is
//! [`domain::NimbusError`]. Upload failures are the exception: they are
//! folded into the job report instead of being raised.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
