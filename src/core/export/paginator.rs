//! Paginated export loop
//!
//! Drains a paged query into a single [`ExportSink`]. The first page fixes the
//! reported total and the header; every later page only appends rows.
//!
//! Two termination rules are supported (see [`PaginationStrategy`]):
//!
//! - `Counted` makes exactly `ceil(total / page_size)` calls, using the total
//!   reported by the first page. Later totals are compared but never change
//!   the number of calls.
//! - `ContinuationToken` keeps fetching while the previous page returned a
//!   token and at least one record, up to `max_pages`.

use super::sink::ExportSink;
use super::summary::ExportSummary;
use crate::adapters::resource_graph::{QueryPage, QueryRequest, QuerySource, Record};
use crate::config::{DiskInventoryConfig, PaginationStrategy, MAX_PAGE_SIZE};
use crate::domain::{NimbusError, ResourceGraphError, Result};
use crate::log_page_fetched;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Instant;

/// Paging parameters of one export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationConfig {
    /// Records per page
    pub page_size: usize,
    /// Termination rule
    pub strategy: PaginationStrategy,
    /// Page cap for the token strategy
    pub max_pages: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            strategy: PaginationStrategy::Counted,
            max_pages: 10_000,
        }
    }
}

impl From<&DiskInventoryConfig> for PaginationConfig {
    fn from(config: &DiskInventoryConfig) -> Self {
        Self {
            page_size: config.page_size,
            strategy: config.pagination,
            max_pages: config.max_pages,
        }
    }
}

/// Number of query calls the counted strategy makes for `total` records
///
/// A query that matches nothing still costs the one call that discovers it.
///
/// # Examples
///
/// ```
/// use nimbus::core::export::page_calls_for;
///
/// assert_eq!(page_calls_for(0, 1000), 1);
/// assert_eq!(page_calls_for(1000, 1000), 1);
/// assert_eq!(page_calls_for(1001, 1000), 2);
/// assert_eq!(page_calls_for(2500, 1000), 3);
/// ```
pub fn page_calls_for(total: u64, page_size: usize) -> u64 {
    if total == 0 {
        return 1;
    }
    total.div_ceil(page_size.max(1) as u64)
}

/// Paginated export of one query
#[derive(Debug, Clone)]
pub struct PaginatedExporter {
    query: String,
    config: PaginationConfig,
}

impl PaginatedExporter {
    pub fn new(query: impl Into<String>, config: PaginationConfig) -> Self {
        Self {
            query: query.into(),
            config,
        }
    }

    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Run the query to completion, writing every record to one sink
    ///
    /// `open_sink` is called at most once, and only when the first page has
    /// records. A query that matches nothing returns an empty summary and
    /// leaves no file behind.
    ///
    /// # Errors
    ///
    /// - Any query error aborts the export; the unfinished sink is dropped.
    /// - [`NimbusError::Export`] if the first page reports records but carries none.
    /// - [`ResourceGraphError::PageLimitExceeded`] if the token strategy hits `max_pages`.
    pub async fn export<Q, S, F>(&self, source: &Q, open_sink: F) -> Result<ExportSummary>
    where
        Q: QuerySource + ?Sized,
        S: ExportSink,
        F: FnOnce() -> Result<S>,
    {
        let started = Instant::now();
        let mut summary = ExportSummary::new();

        let mut request = QueryRequest::first_page(self.query.as_str(), self.config.page_size);
        let first = source.query(&request).await?;
        let total = first.total_records;
        summary.total_reported = total;
        summary.pages_fetched = 1;
        log_page_fetched!(1, request.skip, first.records.len(), total);

        if total == 0 {
            tracing::info!("Query returned no records, nothing to export");
            return Ok(summary.with_duration(started.elapsed()));
        }

        let header: Vec<String> = match first.records.first() {
            Some(record) => record.keys().cloned().collect(),
            None => {
                return Err(NimbusError::Export(format!(
                    "First page reported {total} records but contained none"
                )))
            }
        };

        let mut writer = RowWriter::new(open_sink()?, header)?;
        writer.write_page(&first.records)?;

        let mut token = first.skip_token;
        let mut last_page_len = first.records.len();

        match self.config.strategy {
            PaginationStrategy::Counted => {
                let mut remaining = page_calls_for(total, self.config.page_size) - 1;
                while remaining > 0 {
                    request = request.next_page(token.take());
                    let page = self.fetch(source, &request, &mut summary).await?;
                    writer.write_page(&page.records)?;
                    token = page.skip_token;
                    remaining -= 1;
                }
            }
            PaginationStrategy::ContinuationToken => {
                while token.is_some() && last_page_len > 0 {
                    if summary.pages_fetched >= self.config.max_pages {
                        return Err(
                            ResourceGraphError::PageLimitExceeded(self.config.max_pages).into()
                        );
                    }
                    request = request.next_page(token.take());
                    let page = self.fetch(source, &request, &mut summary).await?;
                    writer.write_page(&page.records)?;
                    token = page.skip_token;
                    last_page_len = page.records.len();
                }
            }
        }

        let RowWriter {
            sink,
            header,
            rows_written,
            dropped_values,
            missing_values,
            ..
        } = writer;

        summary.output = Some(sink.finish()?);
        summary.header = header;
        summary.rows_written = rows_written;
        summary.dropped_values = dropped_values;
        summary.missing_values = missing_values;

        if summary.row_count_mismatch() {
            tracing::warn!(
                total_reported = total,
                rows_written = rows_written,
                "Rows written differ from the reported total"
            );
        }

        Ok(summary.with_duration(started.elapsed()))
    }

    async fn fetch<Q>(
        &self,
        source: &Q,
        request: &QueryRequest,
        summary: &mut ExportSummary,
    ) -> Result<QueryPage>
    where
        Q: QuerySource + ?Sized,
    {
        let page = source.query(request).await?;
        summary.pages_fetched += 1;
        log_page_fetched!(
            summary.pages_fetched,
            request.skip,
            page.records.len(),
            page.total_records
        );

        if page.total_records != summary.total_reported {
            if !summary.total_drift {
                tracing::warn!(
                    first_total = summary.total_reported,
                    page_total = page.total_records,
                    page = summary.pages_fetched,
                    "Reported total changed between pages"
                );
            }
            summary.total_drift = true;
        }
        Ok(page)
    }
}

/// Projects records onto the header and appends them to the sink
struct RowWriter<S> {
    sink: S,
    header: Vec<String>,
    known: HashSet<String>,
    rows_written: u64,
    dropped_values: u64,
    missing_values: u64,
}

impl<S: ExportSink> RowWriter<S> {
    fn new(mut sink: S, header: Vec<String>) -> Result<Self> {
        sink.write_header(&header)?;
        let known = header.iter().cloned().collect();
        Ok(Self {
            sink,
            header,
            known,
            rows_written: 0,
            dropped_values: 0,
            missing_values: 0,
        })
    }

    fn write_page(&mut self, records: &[Record]) -> Result<()> {
        for record in records {
            let cells: Vec<Value> = self
                .header
                .iter()
                .map(|column| match record.get(column) {
                    Some(value) => value.clone(),
                    None => {
                        self.missing_values += 1;
                        Value::Null
                    }
                })
                .collect();

            let extra = record.keys().filter(|k| !self.known.contains(*k)).count();
            self.dropped_values += extra as u64;

            self.sink.write_row(&cells)?;
            self.rows_written += 1;
        }
        Ok(())
    }
}
