//! Serve command implementation
//!
//! Runs every enabled job on its interval until SIGINT/SIGTERM.

use super::{build_job, load_valid_config, EXIT_CONFIG_ERROR, EXIT_FATAL, EXIT_OK};
use crate::adapters::auth::AzureTokenProvider;
use crate::config::NimbusConfig;
use crate::core::jobs::JobKind;
use crate::core::schedule::{ScheduledJob, Scheduler};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Wait one full interval before the first run of each job
    #[arg(long)]
    pub no_startup_run: bool,
}

/// Enabled jobs with their intervals, in run order
pub fn enabled_jobs(config: &NimbusConfig) -> Vec<(JobKind, Duration)> {
    let mut jobs = Vec::new();
    if config.placement_enabled() {
        if let Some(ref placement) = config.placement {
            jobs.push((
                JobKind::PlacementScore,
                Duration::from_secs(placement.interval_seconds),
            ));
        }
    }
    if config.disk_inventory.enabled {
        jobs.push((
            JobKind::DiskInventory,
            Duration::from_secs(config.disk_inventory.interval_seconds),
        ));
    }
    jobs
}

impl ServeArgs {
    /// Execute the serve command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let config = match load_valid_config(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let jobs = enabled_jobs(&config);
        if jobs.is_empty() {
            eprintln!("No jobs are enabled in {config_path}");
            return Ok(EXIT_CONFIG_ERROR);
        }

        let tokens = match AzureTokenProvider::from_config(&config.identity) {
            Ok(t) => Arc::new(t),
            Err(e) => {
                tracing::error!(error = %e, "Failed to create Azure credential");
                eprintln!("Failed to create Azure credential: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        let mut scheduled = Vec::with_capacity(jobs.len());
        for (kind, interval) in jobs {
            scheduled.push(ScheduledJob {
                job: build_job(&config, kind, tokens.clone())?,
                interval,
            });
        }

        let run_on_startup = config.schedule.run_on_startup && !self.no_startup_run;
        let scheduler = Scheduler::new(
            scheduled,
            run_on_startup,
            Duration::from_millis(config.schedule.past_due_tolerance_ms),
        );

        println!("⏱️  Nimbus scheduler running. Press Ctrl+C to stop.");
        let stats = scheduler.run(shutdown_signal).await;

        println!();
        println!("📊 Scheduler Summary:");
        println!("  Runs: {}", stats.runs);
        println!("  Failed Runs: {}", stats.failed_runs);
        println!("  Failed Uploads: {}", stats.failed_uploads);
        println!("  Past-due Ticks: {}", stats.past_due_ticks);
        println!();

        Ok(EXIT_OK)
    }
}
