//! Timer-driven job execution for `serve`
//!
//! Jobs run strictly one at a time on the calling task. A shutdown signal is
//! honoured between runs; a run in progress is never interrupted.

pub mod timer;

pub use timer::{IntervalTrigger, Tick};

use crate::core::jobs::Job;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// A job and its interval
pub struct ScheduledJob {
    pub job: Arc<dyn Job>,
    pub interval: Duration,
}

/// Counters for one `serve` session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub runs: usize,
    /// Runs that returned an error
    pub failed_runs: usize,
    /// Runs that completed but could not upload
    pub failed_uploads: usize,
    pub past_due_ticks: usize,
}

/// Runs each job on its own fixed interval
pub struct Scheduler {
    jobs: Vec<(ScheduledJob, IntervalTrigger)>,
}

impl Scheduler {
    pub fn new(
        jobs: Vec<ScheduledJob>,
        run_on_startup: bool,
        past_due_tolerance: Duration,
    ) -> Self {
        let now = Instant::now();
        let jobs = jobs
            .into_iter()
            .map(|scheduled| {
                let trigger = IntervalTrigger::new(
                    now,
                    scheduled.interval,
                    past_due_tolerance,
                    run_on_startup,
                );
                (scheduled, trigger)
            })
            .collect();
        Self { jobs }
    }

    /// Run until `shutdown` turns true or its sender is dropped
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> SchedulerStats {
        let mut stats = SchedulerStats::default();

        if self.jobs.is_empty() {
            tracing::warn!("No jobs enabled, nothing to schedule");
            return stats;
        }

        for (scheduled, trigger) in &self.jobs {
            tracing::info!(
                job = %scheduled.job.kind(),
                interval_secs = scheduled.interval.as_secs(),
                first_run_in_ms = trigger
                    .next_deadline()
                    .saturating_duration_since(Instant::now())
                    .as_millis() as u64,
                "Job scheduled"
            );
        }

        loop {
            if *shutdown.borrow() {
                break;
            }

            // Earliest deadline first; ties go to configuration order
            let Some(index) = (0..self.jobs.len()).min_by_key(|&i| self.jobs[i].1.next_deadline())
            else {
                break;
            };
            let deadline = self.jobs[index].1.next_deadline();

            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let (scheduled, trigger) = &mut self.jobs[index];
            let tick = trigger.fire(Instant::now());
            let kind = scheduled.job.kind();

            if tick.past_due {
                stats.past_due_ticks += 1;
                tracing::warn!(
                    job = %kind,
                    lateness_ms = tick.lateness.as_millis() as u64,
                    "Timer is running late"
                );
            }

            stats.runs += 1;
            match scheduled.job.run(tick.past_due).await {
                Ok(report) => {
                    report.log_report();
                    if !report.is_successful() {
                        stats.failed_uploads += 1;
                    }
                }
                Err(e) => {
                    stats.failed_runs += 1;
                    tracing::error!(job = %kind, error = %e, "Job run failed");
                }
            }
        }

        tracing::info!(
            runs = stats.runs,
            failed_runs = stats.failed_runs,
            failed_uploads = stats.failed_uploads,
            "Scheduler stopped"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::jobs::{ArtifactOutcome, JobKind, JobReport};
    use crate::domain::{NimbusError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingJob {
        runs: AtomicUsize,
        fail: bool,
        shutdown_after: Option<(usize, watch::Sender<bool>)>,
    }

    #[async_trait]
    impl Job for CountingJob {
        fn kind(&self) -> JobKind {
            JobKind::DiskInventory
        }

        async fn run(&self, past_due: bool) -> Result<JobReport> {
            let n = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((limit, ref tx)) = self.shutdown_after {
                if n >= limit {
                    let _ = tx.send(true);
                }
            }
            if self.fail {
                return Err(NimbusError::Export("boom".to_string()));
            }
            Ok(JobReport {
                job: JobKind::DiskInventory,
                run_id: uuid::Uuid::new_v4(),
                started_at: chrono::Utc::now(),
                past_due,
                artifact: ArtifactOutcome::not_produced("test"),
                export: None,
                upload: None,
                duration: Duration::ZERO,
            })
        }
    }

    #[tokio::test]
    async fn test_runs_on_startup_until_shutdown() {
        let (tx, rx) = watch::channel(false);
        let job = Arc::new(CountingJob {
            runs: AtomicUsize::new(0),
            fail: false,
            shutdown_after: Some((3, tx)),
        });

        let scheduler = Scheduler::new(
            vec![ScheduledJob {
                job: job.clone(),
                interval: Duration::from_millis(10),
            }],
            true,
            Duration::from_secs(1),
        );
        let stats = scheduler.run(rx).await;

        assert_eq!(job.runs.load(Ordering::SeqCst), 3);
        assert_eq!(stats.runs, 3);
        assert_eq!(stats.failed_runs, 0);
    }

    #[tokio::test]
    async fn test_failed_runs_do_not_stop_the_scheduler() {
        let (tx, rx) = watch::channel(false);
        let job = Arc::new(CountingJob {
            runs: AtomicUsize::new(0),
            fail: true,
            shutdown_after: Some((2, tx)),
        });

        let scheduler = Scheduler::new(
            vec![ScheduledJob {
                job: job.clone(),
                interval: Duration::from_millis(5),
            }],
            true,
            Duration::from_secs(1),
        );
        let stats = scheduler.run(rx).await;

        assert_eq!(stats.runs, 2);
        assert_eq!(stats.failed_runs, 2);
    }

    #[tokio::test]
    async fn test_shutdown_before_first_run() {
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let job = Arc::new(CountingJob {
            runs: AtomicUsize::new(0),
            fail: false,
            shutdown_after: None,
        });

        let scheduler = Scheduler::new(
            vec![ScheduledJob {
                job: job.clone(),
                interval: Duration::from_secs(60),
            }],
            true,
            Duration::from_secs(1),
        );
        let stats = scheduler.run(rx).await;

        assert_eq!(stats.runs, 0);
        assert_eq!(job.runs.load(Ordering::SeqCst), 0);
    }
}
