//! Scheduled jobs
//!
//! - [`disk_inventory`] - Resource Graph disk inventory to CSV
//! - [`placement_score`] - Compute placement scores to xlsx
//! - [`outcome`] - artifacts, upload outcomes and run reports
//!
//! Every job follows the same shape: produce an [`ArtifactOutcome`], upload
//! only when an artifact exists, and fold both into a [`JobReport`]. Upload
//! failures end up in the report; they never fail the run.

pub mod disk_inventory;
pub mod outcome;
pub mod placement_score;

pub use disk_inventory::DiskInventoryJob;
pub use outcome::{Artifact, ArtifactOutcome, JobKind, JobReport, UploadOutcome};
pub use placement_score::PlacementScoreJob;

use crate::adapters::blob::BlobUploader;
use crate::domain::{ContainerName, Result};
use async_trait::async_trait;

/// A runnable job
#[async_trait]
pub trait Job: Send + Sync {
    fn kind(&self) -> JobKind;

    /// Run once
    ///
    /// `past_due` is recorded in the report and does not change behavior.
    ///
    /// # Errors
    ///
    /// Returns an error when no artifact could be produced because a remote
    /// call or local write failed. Upload failures are not errors.
    async fn run(&self, past_due: bool) -> Result<JobReport>;
}

/// Upload `artifact`, folding any failure into the outcome
pub(crate) async fn upload_artifact(
    uploader: &dyn BlobUploader,
    container: &ContainerName,
    artifact: &Artifact,
) -> UploadOutcome {
    match uploader
        .upload(&artifact.path, container, &artifact.blob_name)
        .await
    {
        Ok(receipt) => {
            tracing::info!(
                container = %receipt.container,
                blob_name = %receipt.blob_name,
                bytes = receipt.bytes,
                etag = receipt.etag.as_deref().unwrap_or(""),
                "Uploaded artifact"
            );
            UploadOutcome::Uploaded {
                container: receipt.container,
                blob_name: receipt.blob_name,
                bytes: receipt.bytes,
            }
        }
        Err(e) => {
            tracing::error!(
                container = %container,
                blob_name = %artifact.blob_name,
                path = %artifact.path.display(),
                error = %e,
                "Failed to upload artifact"
            );
            UploadOutcome::Failed {
                container: container.clone(),
                blob_name: artifact.blob_name.clone(),
                error: e.to_string(),
            }
        }
    }
}
