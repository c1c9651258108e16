//! Export summary and reporting
//!
//! This module defines the record the export loop returns for one run.

use std::path::PathBuf;
use std::time::Duration;

/// Summary of one paginated export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportSummary {
    /// Total records reported by the first page
    pub total_reported: u64,

    /// Number of query calls made
    pub pages_fetched: usize,

    /// Data rows written to the sink (header excluded)
    pub rows_written: u64,

    /// A later page reported a different total than the first
    pub total_drift: bool,

    /// Record keys that were not in the header and were dropped
    pub dropped_values: u64,

    /// Header cells that were missing from a record and written empty
    pub missing_values: u64,

    /// Column names, in output order
    pub header: Vec<String>,

    /// Finished artifact, absent when the query matched nothing
    pub output: Option<PathBuf>,

    /// Duration of the export
    pub duration: Duration,
}

impl ExportSummary {
    /// Create a new empty export summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Whether the query matched no records
    pub fn is_empty(&self) -> bool {
        self.output.is_none()
    }

    /// Whether the rows written differ from the reported total
    pub fn row_count_mismatch(&self) -> bool {
        self.output.is_some() && self.rows_written != self.total_reported
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            total_reported = self.total_reported,
            pages_fetched = self.pages_fetched,
            rows_written = self.rows_written,
            columns = self.header.len(),
            total_drift = self.total_drift,
            dropped_values = self.dropped_values,
            missing_values = self.missing_values,
            duration_ms = self.duration.as_millis() as u64,
            "Export summary"
        );
    }
}
