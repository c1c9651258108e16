//! Job outcomes and run reports

use crate::core::export::ExportSummary;
use crate::domain::{BlobName, ContainerName, Result};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// The jobs Nimbus runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    DiskInventory,
    PlacementScore,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::DiskInventory => "disk_inventory",
            JobKind::PlacementScore => "placement_score",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "disk_inventory" | "disks" => Ok(JobKind::DiskInventory),
            "placement_score" | "placement" => Ok(JobKind::PlacementScore),
            other => Err(format!(
                "Unknown job '{other}'. Must be one of: disk_inventory, placement_score"
            )),
        }
    }
}

/// A finished local file ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub blob_name: BlobName,
    /// Data rows, header excluded
    pub rows: u64,
    pub bytes: u64,
    /// Hex SHA-256 of the file contents
    pub sha256: String,
}

impl Artifact {
    /// Describe the file at `path`, hashing its contents
    pub fn from_file(path: impl AsRef<Path>, blob_name: BlobName, rows: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut reader = BufReader::new(File::open(&path)?);
        let mut hasher = Sha256::new();
        let bytes = io::copy(&mut reader, &mut hasher)?;

        Ok(Self {
            path,
            blob_name,
            rows,
            bytes,
            sha256: format!("{:x}", hasher.finalize()),
        })
    }
}

/// Whether a run produced something to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactOutcome {
    Produced(Artifact),
    NotProduced { reason: String },
}

impl ArtifactOutcome {
    pub fn not_produced(reason: impl Into<String>) -> Self {
        ArtifactOutcome::NotProduced {
            reason: reason.into(),
        }
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            ArtifactOutcome::Produced(artifact) => Some(artifact),
            ArtifactOutcome::NotProduced { .. } => None,
        }
    }
}

/// Result of the upload step
///
/// Upload failures are reported here instead of being raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded {
        container: ContainerName,
        blob_name: BlobName,
        bytes: u64,
    },
    Failed {
        container: ContainerName,
        blob_name: BlobName,
        error: String,
    },
}

impl UploadOutcome {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, UploadOutcome::Uploaded { .. })
    }
}

/// Report of one job run
#[derive(Debug, Clone)]
pub struct JobReport {
    pub job: JobKind,
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub past_due: bool,
    pub artifact: ArtifactOutcome,
    pub export: Option<ExportSummary>,
    /// Absent when no artifact was produced
    pub upload: Option<UploadOutcome>,
    pub duration: Duration,
}

impl JobReport {
    /// True unless the upload step failed
    pub fn is_successful(&self) -> bool {
        !matches!(self.upload, Some(UploadOutcome::Failed { .. }))
    }

    /// Data rows in the artifact, zero when none was produced
    pub fn rows(&self) -> u64 {
        self.artifact.artifact().map_or(0, |a| a.rows)
    }

    /// Emit the report as one structured log line
    pub fn log_report(&self) {
        let (artifact, sha256) = match &self.artifact {
            ArtifactOutcome::Produced(a) => (a.blob_name.to_string(), a.sha256.as_str()),
            ArtifactOutcome::NotProduced { reason } => (format!("none ({reason})"), ""),
        };
        let upload = match &self.upload {
            None => "skipped".to_string(),
            Some(UploadOutcome::Uploaded { .. }) => "uploaded".to_string(),
            Some(UploadOutcome::Failed { error, .. }) => format!("failed: {error}"),
        };

        if self.is_successful() {
            tracing::info!(
                job = %self.job,
                run_id = %self.run_id,
                past_due = self.past_due,
                artifact = %artifact,
                sha256 = sha256,
                rows = self.rows(),
                upload = %upload,
                duration_ms = self.duration.as_millis() as u64,
                "Job report"
            );
        } else {
            tracing::error!(
                job = %self.job,
                run_id = %self.run_id,
                past_due = self.past_due,
                artifact = %artifact,
                rows = self.rows(),
                upload = %upload,
                duration_ms = self.duration.as_millis() as u64,
                "Job report"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn report(upload: Option<UploadOutcome>) -> JobReport {
        JobReport {
            job: JobKind::DiskInventory,
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            past_due: false,
            artifact: ArtifactOutcome::not_produced("no records"),
            export: None,
            upload,
            duration: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_job_kind_parse() {
        assert_eq!("disk_inventory".parse::<JobKind>().unwrap(), JobKind::DiskInventory);
        assert_eq!("placement-score".parse::<JobKind>().unwrap(), JobKind::PlacementScore);
        assert!("other".parse::<JobKind>().is_err());
        assert_eq!(JobKind::PlacementScore.to_string(), "placement_score");
    }

    #[test]
    fn test_artifact_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();

        let artifact =
            Artifact::from_file(file.path(), BlobName::new("a.csv").unwrap(), 0).unwrap();
        assert_eq!(artifact.bytes, 3);
        assert_eq!(
            artifact.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_report_success_depends_on_upload() {
        let container = ContainerName::new("exports").unwrap();
        let blob_name = BlobName::new("a.csv").unwrap();

        assert!(report(None).is_successful());
        assert!(report(Some(UploadOutcome::Uploaded {
            container: container.clone(),
            blob_name: blob_name.clone(),
            bytes: 1,
        }))
        .is_successful());
        assert!(!report(Some(UploadOutcome::Failed {
            container,
            blob_name,
            error: "403".to_string(),
        }))
        .is_successful());
    }
}
