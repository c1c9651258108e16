//! Spreadsheet sink

use super::sink::{render_cell, ExportSink};
use crate::domain::{NimbusError, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Largest column count an xlsx worksheet holds
const MAX_COLUMNS: usize = 16_384;

/// Single-worksheet `.xlsx` sink
///
/// Numbers and booleans keep their native cell types; everything else is
/// written as text using [`render_cell`]. The workbook is serialized in
/// memory and persisted to `final_path` on `finish()`.
pub struct WorkbookSink {
    worksheet: Worksheet,
    final_path: PathBuf,
    columns: Option<usize>,
    next_row: u32,
}

impl WorkbookSink {
    /// Create a sink with one worksheet called `sheet_name`
    pub fn create(final_path: impl AsRef<Path>, sheet_name: &str) -> Result<Self> {
        let mut worksheet = Worksheet::new();
        worksheet.set_name(sheet_name)?;

        Ok(Self {
            worksheet,
            final_path: final_path.as_ref().to_path_buf(),
            columns: None,
            next_row: 0,
        })
    }

    fn write_cell(&mut self, row: u32, col: u16, value: &Value) -> Result<()> {
        match value {
            Value::Null => {}
            Value::Bool(b) => {
                self.worksheet.write_boolean(row, col, *b)?;
            }
            Value::Number(n) => match n.as_f64() {
                Some(f) if n.is_f64() || f.abs() < 1e15 => {
                    self.worksheet.write_number(row, col, f)?;
                }
                _ => {
                    self.worksheet.write_string(row, col, n.to_string())?;
                }
            },
            other => {
                self.worksheet.write_string(row, col, render_cell(other))?;
            }
        }
        Ok(())
    }
}

impl ExportSink for WorkbookSink {
    fn write_header(&mut self, columns: &[String]) -> Result<()> {
        if self.columns.is_some() {
            return Err(NimbusError::Export("Worksheet header already written".to_string()));
        }
        if columns.len() > MAX_COLUMNS {
            return Err(NimbusError::Spreadsheet(format!(
                "{} columns exceed the worksheet limit of {MAX_COLUMNS}",
                columns.len()
            )));
        }

        let bold = Format::new().set_bold();
        for (col, name) in columns.iter().enumerate() {
            self.worksheet
                .write_string_with_format(0, col as u16, name, &bold)?;
        }
        self.columns = Some(columns.len());
        self.next_row = 1;
        Ok(())
    }

    fn write_row(&mut self, cells: &[Value]) -> Result<()> {
        match self.columns {
            None => {
                return Err(NimbusError::Export(
                    "Worksheet row written before header".to_string(),
                ))
            }
            Some(n) if n != cells.len() => {
                return Err(NimbusError::Export(format!(
                    "Worksheet row has {} cells, header has {n}",
                    cells.len()
                )))
            }
            Some(_) => {}
        }

        let row = self.next_row;
        for (col, value) in cells.iter().enumerate() {
            self.write_cell(row, col as u16, value)?;
        }
        self.next_row += 1;
        Ok(())
    }

    fn finish(self) -> Result<PathBuf> {
        let mut workbook = Workbook::new();
        workbook.push_worksheet(self.worksheet);
        let bytes = workbook.save_to_buffer()?;

        let parent_dir = match self.final_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent_dir)?;

        let mut temp_file = NamedTempFile::new_in(&parent_dir)?;
        temp_file.write_all(&bytes)?;
        temp_file.flush()?;
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
