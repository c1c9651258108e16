//! Placement score job
//!
//! Calls the Placement Score API once with a fixed payload and writes the
//! returned scores to a single-sheet workbook.

use super::outcome::{Artifact, ArtifactOutcome, JobKind, JobReport};
use super::{upload_artifact, Job};
use crate::adapters::auth::TokenProvider;
use crate::adapters::blob::{BlobStorageClient, BlobUploader};
use crate::adapters::placement::{
    PlacementScoreClient, PlacementScoreRequest, PlacementScoreSource,
};
use crate::adapters::resource_graph::Record;
use crate::config::{NimbusConfig, PlacementConfig};
use crate::core::export::{ExportSink, WorkbookSink};
use crate::domain::{BlobName, ContainerName, NimbusError, Result};
use crate::{log_job_complete, log_job_start};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Column appended to every score row
pub const DESIRED_COUNT_COLUMN: &str = "desiredCount";

const SHEET_NAME: &str = "placement_scores";

/// Compute placement score export
pub struct PlacementScoreJob {
    request: PlacementScoreRequest,
    output_path: PathBuf,
    blob_prefix: String,
    container: ContainerName,
    source: Arc<dyn PlacementScoreSource>,
    uploader: Arc<dyn BlobUploader>,
}

impl PlacementScoreJob {
    /// Create the job with explicit collaborators
    pub fn new(
        config: &NimbusConfig,
        placement: &PlacementConfig,
        source: Arc<dyn PlacementScoreSource>,
        uploader: Arc<dyn BlobUploader>,
    ) -> Self {
        Self {
            request: PlacementScoreRequest::from_config(placement),
            output_path: PathBuf::from(&config.application.output_dir).join(&placement.file_name),
            blob_prefix: placement.blob_prefix(),
            container: config.storage.container_name.clone(),
            source,
            uploader,
        }
    }

    /// Create the job with the Azure REST clients
    ///
    /// # Errors
    ///
    /// Returns [`NimbusError::Configuration`] when no `[placement]` section is configured.
    pub fn from_config(config: &NimbusConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        let placement = config.placement.as_ref().ok_or_else(|| {
            NimbusError::Configuration("No [placement] section configured".to_string())
        })?;
        let source = PlacementScoreClient::new(&config.http, placement, tokens.clone())?;
        let uploader = BlobStorageClient::new(&config.storage, &config.http, tokens)?;
        Ok(Self::new(config, placement, Arc::new(source), Arc::new(uploader)))
    }

    pub fn request(&self) -> &PlacementScoreRequest {
        &self.request
    }
}

/// Spreadsheet columns: score keys by first appearance, then `desiredCount`
pub fn score_columns(scores: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for score in scores {
        for key in score.keys() {
            if key != DESIRED_COUNT_COLUMN && !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    columns.push(DESIRED_COUNT_COLUMN.to_string());
    columns
}

fn write_scores(path: &Path, scores: &[Record], desired_count: u32) -> Result<PathBuf> {
    let columns = score_columns(scores);
    let mut sink = WorkbookSink::create(path, SHEET_NAME)?;
    sink.write_header(&columns)?;

    for score in scores {
        let cells: Vec<Value> = columns
            .iter()
            .map(|column| {
                if column == DESIRED_COUNT_COLUMN {
                    Value::from(desired_count)
                } else {
                    score.get(column).cloned().unwrap_or(Value::Null)
                }
            })
            .collect();
        sink.write_row(&cells)?;
    }

    sink.finish()
}

#[async_trait]
impl Job for PlacementScoreJob {
    fn kind(&self) -> JobKind {
        JobKind::PlacementScore
    }

    async fn run(&self, past_due: bool) -> Result<JobReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let started = Instant::now();
        log_job_start!(self.kind(), run_id, past_due);

        let response = match self.source.generate(&self.request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    job = %self.kind(),
                    run_id = %run_id,
                    error = %e,
                    "Placement score request failed, skipping upload"
                );
                return Err(e);
            }
        };

        let scores = response.placement_scores;
        let artifact = if scores.is_empty() {
            tracing::warn!(job = %self.kind(), "Response contained no placement scores");
            ArtifactOutcome::not_produced("response contained no placement scores")
        } else {
            let path = write_scores(&self.output_path, &scores, self.request.desired_count)?;
            let blob_name = BlobName::dated(&self.blob_prefix, started_at.date_naive(), "xlsx")
                .map_err(NimbusError::Validation)?;
            ArtifactOutcome::Produced(Artifact::from_file(path, blob_name, scores.len() as u64)?)
        };

        let upload = match artifact.artifact() {
            Some(a) => Some(upload_artifact(self.uploader.as_ref(), &self.container, a).await),
            None => None,
        };

        let report = JobReport {
            job: self.kind(),
            run_id,
            started_at,
            past_due,
            artifact,
            export: None,
            upload,
            duration: started.elapsed(),
        };
        log_job_complete!(report.job, report.rows(), report.duration);
        Ok(report)
    }
}
