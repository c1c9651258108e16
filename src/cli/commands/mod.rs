//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod init;
pub mod run;
pub mod serve;
pub mod validate;

use crate::adapters::auth::TokenProvider;
use crate::config::{load_config, NimbusConfig};
use crate::core::jobs::{DiskInventoryJob, Job, JobKind, PlacementScoreJob};
use crate::domain::Result;
use std::sync::Arc;

/// Exit code: success
pub const EXIT_OK: i32 = 0;
/// Exit code: a job failed or could not upload
pub const EXIT_JOB_FAILED: i32 = 1;
/// Exit code: configuration missing or invalid
pub const EXIT_CONFIG_ERROR: i32 = 2;
/// Exit code: unrecoverable error
pub const EXIT_FATAL: i32 = 5;

/// Load and validate the configuration, printing any problem
fn load_valid_config(config_path: &str) -> std::result::Result<NimbusConfig, i32> {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(
                config_path = %config_path,
                error = %e,
                "Failed to load configuration"
            );
            eprintln!("Failed to load configuration: {e}");
            return Err(EXIT_CONFIG_ERROR);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Configuration validation failed");
        eprintln!("Configuration validation failed: {e}");
        return Err(EXIT_CONFIG_ERROR);
    }

    Ok(config)
}

/// Build the job of `kind` with the Azure REST clients
fn build_job(
    config: &NimbusConfig,
    kind: JobKind,
    tokens: Arc<dyn TokenProvider>,
) -> Result<Arc<dyn Job>> {
    Ok(match kind {
        JobKind::DiskInventory => Arc::new(DiskInventoryJob::from_config(config, tokens)?),
        JobKind::PlacementScore => Arc::new(PlacementScoreJob::from_config(config, tokens)?),
    })
}
