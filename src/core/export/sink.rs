//! Export sinks
//!
//! An [`ExportSink`] is an append-only tabular destination. The export loop
//! writes the header once, then data rows in retrieval order, then calls
//! [`ExportSink::finish`] before the file is handed to the uploader.

use crate::domain::{NimbusError, Result};
use csv::{Writer, WriterBuilder};
use serde_json::Value;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Append-only row-oriented output
pub trait ExportSink {
    /// Write the header row; called exactly once, before any data row
    fn write_header(&mut self, columns: &[String]) -> Result<()>;

    /// Append one data row, already projected onto the header columns
    fn write_row(&mut self, cells: &[Value]) -> Result<()>;

    /// Flush and close the sink, returning the path of the finished file
    fn finish(self) -> Result<PathBuf>;
}

/// Text form of a cell
///
/// Strings are written verbatim and `null` as an empty cell. Numbers and
/// booleans use their JSON text; arrays and objects are written as compact JSON.
///
/// # Examples
///
/// ```
/// use nimbus::core::export::render_cell;
/// use serde_json::json;
///
/// assert_eq!(render_cell(&json!("disk-01")), "disk-01");
/// assert_eq!(render_cell(&json!(null)), "");
/// assert_eq!(render_cell(&json!(128)), "128");
/// assert_eq!(render_cell(&json!({"a": 1})), r#"{"a":1}"#);
/// ```
pub fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// CSV sink that only appears at its final path once finished
///
/// Rows go to a temporary file in the destination directory. `finish()`
/// flushes and renames it over the destination; dropping the sink without
/// finishing deletes the temporary file.
pub struct CsvSink {
    writer: Writer<BufWriter<NamedTempFile>>,
    final_path: PathBuf,
    columns: Option<usize>,
}

impl CsvSink {
    /// Create a sink targeting `final_path`
    ///
    /// The parent directory is created if it does not exist.
    pub fn create(final_path: impl AsRef<Path>) -> Result<Self> {
        let final_path = final_path.as_ref().to_path_buf();
        let parent_dir = match final_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent_dir)?;

        let temp_file = NamedTempFile::new_in(&parent_dir).map_err(|e| {
            NimbusError::Io(format!(
                "Failed to create temporary file in {}: {e}",
                parent_dir.display()
            ))
        })?;

        let writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(temp_file));

        Ok(Self {
            writer,
            final_path,
            columns: None,
        })
    }
}

impl ExportSink for CsvSink {
    fn write_header(&mut self, columns: &[String]) -> Result<()> {
        if self.columns.is_some() {
            return Err(NimbusError::Export("CSV header already written".to_string()));
        }
        self.writer.write_record(columns)?;
        self.columns = Some(columns.len());
        Ok(())
    }

    fn write_row(&mut self, cells: &[Value]) -> Result<()> {
        match self.columns {
            None => {
                return Err(NimbusError::Export(
                    "CSV row written before header".to_string(),
                ))
            }
            Some(n) if n != cells.len() => {
                return Err(NimbusError::Export(format!(
                    "CSV row has {} cells, header has {n}",
                    cells.len()
                )))
            }
            Some(_) => {}
        }
        self.writer.write_record(cells.iter().map(render_cell))?;
        Ok(())
    }

    fn finish(self) -> Result<PathBuf> {
        let buf_writer = self
            .writer
            .into_inner()
            .map_err(|e| NimbusError::Csv(format!("Failed to flush CSV writer: {}", e.error())))?;

        let temp_file = buf_writer
            .into_inner()
            .map_err(|e| NimbusError::Io(format!("Failed to flush buffer: {}", e.error())))?;

        temp_file.persist(&self.final_path).map_err(|e| {
            NimbusError::Io(format!(
                "Failed to persist {}: {}",
                self.final_path.display(),
                e.error
            ))
        })?;

        Ok(self.final_path)
    }
}
