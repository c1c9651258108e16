//! Paginated export
//!
//! This module provides the export loop shared by the jobs:
//! - Paging through a [`QuerySource`](crate::adapters::resource_graph::QuerySource)
//! - Writing rows to CSV or xlsx sinks
//! - Summary and reporting

pub mod paginator;
pub mod sink;
pub mod summary;
pub mod workbook;

pub use paginator::{page_calls_for, PaginatedExporter, PaginationConfig};
pub use sink::{render_cell, CsvSink, ExportSink};
pub use summary::ExportSummary;
pub use workbook::WorkbookSink;
