//! Logging and observability
//!
//! Structured logging through `tracing`:
//! - Human-readable console output
//! - Optional JSON file output with rotation
//! - Helper macros for the events every job emits
//!
//! # Example
//!
//! ```no_run
//! use nimbus::logging::init_logging;
//! use nimbus::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(job = "disk_inventory", "Job started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of a job run
///
/// # Example
///
/// ```no_run
/// use nimbus::log_job_start;
///
/// log_job_start!("disk_inventory", "7f0c...", false);
/// ```
#[macro_export]
macro_rules! log_job_start {
    ($job:expr, $run_id:expr, $past_due:expr) => {
        tracing::info!(
            job = %$job,
            run_id = %$run_id,
            past_due = $past_due,
            "Job started"
        );
    };
}

/// Log the completion of a job run
///
/// # Example
///
/// ```no_run
/// use nimbus::log_job_complete;
/// use std::time::Duration;
///
/// log_job_complete!("disk_inventory", 2500, Duration::from_secs(4));
/// ```
#[macro_export]
macro_rules! log_job_complete {
    ($job:expr, $rows:expr, $duration:expr) => {
        tracing::info!(
            job = %$job,
            rows = $rows,
            duration_ms = $duration.as_millis() as u64,
            "Job completed"
        );
    };
}

/// Log a fetched page of query results
///
/// # Example
///
/// ```no_run
/// use nimbus::log_page_fetched;
///
/// log_page_fetched!(2, 1000, 1000, 2500);
/// ```
#[macro_export]
macro_rules! log_page_fetched {
    ($page:expr, $skip:expr, $records:expr, $total:expr) => {
        tracing::debug!(
            page = $page,
            skip = $skip,
            records = $records,
            total = $total,
            "Fetched page"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use nimbus::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, 2000u64, "Request throttled");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $delay_ms:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            delay_ms = $delay_ms,
            reason = %$reason,
            "Retrying operation"
        );
    };
}
