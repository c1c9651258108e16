//! Integration tests for the paginated export loop
//!
//! These tests verify that:
//! - The counted strategy makes exactly ceil(total / page_size) calls
//! - Every page after the first carries the previous continuation token
//! - The CSV holds one header line plus one line per record
//! - Re-running against unchanged data produces an identical file
//! - A query that matches nothing leaves no file behind
//! - The token strategy stops when the token runs out, whatever the total says

use async_trait::async_trait;
use nimbus::adapters::resource_graph::{QueryPage, QueryRequest, QuerySource, Record};
use nimbus::config::PaginationStrategy;
use nimbus::core::export::{page_calls_for, CsvSink, PaginatedExporter, PaginationConfig};
use nimbus::domain::{NimbusError, ResourceGraphError, Result};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::sync::Mutex;
use tempfile::TempDir;
use test_case::test_case;

/// In-memory disk inventory that records every request it answers
struct RecordingSource {
    records: Vec<Record>,
    /// Total reported on the first page, when it overstates the records served
    first_total: Option<u64>,
    /// Total reported on pages after the first, to simulate churn
    later_total: Option<u64>,
    requests: Mutex<Vec<QueryRequest>>,
}

impl RecordingSource {
    fn with_disks(total: usize) -> Self {
        let records = (0..total)
            .map(|i| {
                json!({
                    "id": format!("/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Compute/disks/disk-{i:05}"),
                    "name": format!("disk-{i:05}"),
                    "location": "westus",
                    "diskSizeGb": 128,
                    "diskState": if i % 3 == 0 { "Unattached" } else { "Attached" },
                })
                .as_object()
                .cloned()
                .unwrap()
            })
            .collect();

        Self {
            records,
            first_total: None,
            later_total: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuerySource for RecordingSource {
    async fn query(&self, request: &QueryRequest) -> Result<QueryPage> {
        let page_number = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };

        let start = request.skip.min(self.records.len());
        let end = (request.skip + request.page_size).min(self.records.len());
        let served = self.records.len() as u64;
        let total = match (page_number, self.later_total) {
            (1, _) => self.first_total.unwrap_or(served),
            (_, Some(later)) => later,
            (_, None) => served,
        };

        Ok(QueryPage {
            records: self.records[start..end].to_vec(),
            total_records: total,
            skip_token: (end < self.records.len()).then(|| format!("token-{page_number}")),
        })
    }
}

fn counted(page_size: usize) -> PaginationConfig {
    PaginationConfig {
        page_size,
        strategy: PaginationStrategy::Counted,
        max_pages: 10_000,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[test_case(0, 1 ; "empty inventory")]
#[test_case(1, 1 ; "single disk")]
#[test_case(999, 1 ; "one short of a page")]
#[test_case(1000, 1 ; "exactly one page")]
#[test_case(1001, 2 ; "one past a page")]
#[test_case(2500, 3 ; "partial last page")]
#[tokio::test]
async fn test_counted_export_rows_and_calls(total: usize, expected_calls: usize) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("azure_disks.csv");
    let source = RecordingSource::with_disks(total);
    let exporter = PaginatedExporter::new("Resources", counted(1000));

    let summary = exporter
        .export(&source, || CsvSink::create(&path))
        .await
        .unwrap();

    assert_eq!(source.requests().len(), expected_calls);
    assert_eq!(page_calls_for(total as u64, 1000), expected_calls as u64);
    assert_eq!(summary.pages_fetched, expected_calls);
    assert_eq!(summary.rows_written, total as u64);
    assert!(!summary.row_count_mismatch());

    if total == 0 {
        assert!(summary.is_empty());
        assert!(summary.output.is_none());
        assert!(!path.exists());
    } else {
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), total + 1);
        assert_eq!(
            contents.lines().next().unwrap(),
            "id,name,location,diskSizeGb,diskState"
        );
        assert_eq!(summary.output.as_deref(), Some(path.as_path()));
    }
}

#[tokio::test]
async fn test_second_page_carries_token_and_skip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("azure_disks.csv");
    let source = RecordingSource::with_disks(1001);
    let exporter = PaginatedExporter::new("Resources", counted(1000));

    exporter
        .export(&source, || CsvSink::create(&path))
        .await
        .unwrap();

    let requests = source.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].skip, 0);
    assert!(requests[0].skip_token.is_none());
    assert_eq!(requests[1].skip, 1000);
    assert_eq!(requests[1].skip_token.as_deref(), Some("token-1"));
    assert!(requests.iter().all(|r| r.query == "Resources" && r.page_size == 1000));

    let contents = std::fs::read_to_string(&path).unwrap();
    let last = contents.lines().last().unwrap();
    assert!(last.contains("disk-01000"));
}

#[tokio::test]
async fn test_skip_advances_one_page_at_a_time() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("azure_disks.csv");
    let source = RecordingSource::with_disks(2500);
    let exporter = PaginatedExporter::new("Resources", counted(1000));

    exporter
        .export(&source, || CsvSink::create(&path))
        .await
        .unwrap();

    let skips: Vec<usize> = source.requests().iter().map(|r| r.skip).collect();
    assert_eq!(skips, vec![0, 1000, 2000]);

    let tokens: Vec<Option<String>> = source
        .requests()
        .into_iter()
        .map(|r| r.skip_token)
        .collect();
    assert_eq!(
        tokens,
        vec![None, Some("token-1".to_string()), Some("token-2".to_string())]
    );
}

#[tokio::test]
async fn test_rerun_produces_identical_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("azure_disks.csv");
    let exporter = PaginatedExporter::new("Resources", counted(1000));

    let mut digests = Vec::new();
    for _ in 0..2 {
        let source = RecordingSource::with_disks(2500);
        exporter
            .export(&source, || CsvSink::create(&path))
            .await
            .unwrap();
        digests.push(sha256_hex(&std::fs::read(&path).unwrap()));
    }

    assert_eq!(digests[0], digests[1]);
}

#[tokio::test]
async fn test_rerun_replaces_previous_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("azure_disks.csv");
    std::fs::write(&path, "stale contents from an earlier run\n").unwrap();

    let source = RecordingSource::with_disks(3);
    let exporter = PaginatedExporter::new("Resources", counted(1000));
    exporter
        .export(&source, || CsvSink::create(&path))
        .await
        .unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(!contents.contains("stale"));
    assert_eq!(contents.lines().count(), 4);
}

#[tokio::test]
async fn test_reported_total_drift_is_flagged() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("azure_disks.csv");
    let mut source = RecordingSource::with_disks(1500);
    source.later_total = Some(1600);
    let exporter = PaginatedExporter::new("Resources", counted(1000));

    let summary = exporter
        .export(&source, || CsvSink::create(&path))
        .await
        .unwrap();

    // The first page's total decides the number of calls
    assert_eq!(source.requests().len(), 2);
    assert_eq!(summary.total_reported, 1500);
    assert!(summary.total_drift);
    assert_eq!(summary.rows_written, 1500);
}

#[tokio::test]
async fn test_token_strategy_stops_when_token_runs_out() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("azure_disks.csv");
    let source = RecordingSource::with_disks(450);
    let exporter = PaginatedExporter::new(
        "Resources",
        PaginationConfig {
            page_size: 100,
            strategy: PaginationStrategy::ContinuationToken,
            max_pages: 100,
        },
    );

    let summary = exporter
        .export(&source, || CsvSink::create(&path))
        .await
        .unwrap();

    assert_eq!(source.requests().len(), 5);
    assert_eq!(summary.rows_written, 450);
    assert!(source.requests().last().unwrap().skip_token.is_some());
}

#[tokio::test]
async fn test_token_strategy_ignores_overstated_total() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("azure_disks.csv");
    let mut source = RecordingSource::with_disks(450);
    source.first_total = Some(5000);
    source.later_total = Some(4800);
    let exporter = PaginatedExporter::new(
        "Resources",
        PaginationConfig {
            page_size: 100,
            strategy: PaginationStrategy::ContinuationToken,
            max_pages: 100,
        },
    );

    let summary = exporter
        .export(&source, || CsvSink::create(&path))
        .await
        .unwrap();

    // The missing token ends the export, not the reported total
    assert_eq!(source.requests().len(), 5);
    assert_eq!(summary.pages_fetched, 5);
    assert_eq!(summary.rows_written, 450);
    assert_eq!(summary.total_reported, 5000);
    assert!(summary.total_drift);
    assert!(summary.row_count_mismatch());
    assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 451);
}

#[tokio::test]
async fn test_token_strategy_page_limit() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("azure_disks.csv");
    let source = RecordingSource::with_disks(1000);
    let exporter = PaginatedExporter::new(
        "Resources",
        PaginationConfig {
            page_size: 100,
            strategy: PaginationStrategy::ContinuationToken,
            max_pages: 3,
        },
    );

    let result = exporter.export(&source, || CsvSink::create(&path)).await;

    assert!(matches!(
        result,
        Err(NimbusError::ResourceGraph(
            ResourceGraphError::PageLimitExceeded(3)
        ))
    ));
    assert_eq!(source.requests().len(), 3);
    // The unfinished file is discarded
    assert!(!path.exists());
}

/// Source whose second page fails permanently
struct FailingSecondPage {
    inner: RecordingSource,
}

#[async_trait]
impl QuerySource for FailingSecondPage {
    async fn query(&self, request: &QueryRequest) -> Result<QueryPage> {
        if request.skip > 0 {
            return Err(ResourceGraphError::ClientError {
                status: 400,
                message: "BadRequest: invalid skip token".to_string(),
            }
            .into());
        }
        self.inner.query(request).await
    }
}

#[tokio::test]
async fn test_failed_page_aborts_without_partial_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("azure_disks.csv");
    let source = FailingSecondPage {
        inner: RecordingSource::with_disks(1500),
    };
    let exporter = PaginatedExporter::new("Resources", counted(1000));

    let result = exporter.export(&source, || CsvSink::create(&path)).await;

    assert!(result.is_err());
    assert!(!path.exists());
    let leftovers = std::fs::read_dir(temp_dir.path()).unwrap().count();
    assert_eq!(leftovers, 0);
}
