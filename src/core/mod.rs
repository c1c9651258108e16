//! Core business logic for Nimbus.
//!
//! # Modules
//!
//! - [`export`] - Paginated export loop and export sinks
//! - [`jobs`] - Disk inventory and placement score jobs, run reports
//! - [`schedule`] - Fixed-interval triggers for `serve`
//!
//! # Job Workflow
//!
//! 1. **Authenticate**: acquire a bearer token for the service
//! 2. **Query**: call Resource Graph (paged) or Placement Score (once)
//! 3. **Write**: stream rows into a CSV or xlsx sink
//! 4. **Upload**: put the finished file into the blob container
//! 5. **Report**: log a [`JobReport`](jobs::JobReport)
//!
//! # Example
//!
//! ```rust,no_run
//! use nimbus::adapters::auth::AzureTokenProvider;
//! use nimbus::config::load_config;
//! use nimbus::core::jobs::{DiskInventoryJob, Job};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("nimbus.toml")?;
//! let tokens = Arc::new(AzureTokenProvider::from_config(&config.identity)?);
//!
//! let job = DiskInventoryJob::from_config(&config, tokens)?;
//! let report = job.run(false).await?;
//!
//! println!("Rows: {}", report.rows());
//! println!("Uploaded: {}", report.is_successful());
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod jobs;
pub mod schedule;
