//! Spreadsheet reader backed by calamine (.xlsx, .xls, .ods)

use std::path::PathBuf;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::{debug, instrument};

use crate::domain::{Table, Workbook};
use crate::infrastructure::error::SourceError;
use crate::infrastructure::traits::WorkbookSource;

/// Reads every sheet of a workbook file; the first row of each sheet is the header.
///
/// Header cells are trimmed so column lookup tolerates stray padding. Data cells
/// keep their text verbatim: context values match exactly as typed.
#[derive(Debug, Clone)]
pub struct XlsxSource {
    path: PathBuf,
}

impl XlsxSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl WorkbookSource for XlsxSource {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn read(&self) -> Result<Workbook, SourceError> {
        if !self.path.is_file() {
            return Err(SourceError::NotFound(self.path.clone()));
        }
        let mut reader =
            open_workbook_auto(&self.path).map_err(|e| SourceError::Read(e.to_string()))?;

        let mut workbook = Workbook::new();
        let sheet_names: Vec<String> = reader.sheet_names().to_vec();
        for name in sheet_names {
            let range = reader
                .worksheet_range(&name)
                .map_err(|e| SourceError::Read(format!("sheet '{}': {}", name, e)))?;
            let mut rows = range.rows();
            let header: Vec<String> = match rows.next() {
                Some(cells) => cells
                    .iter()
                    .map(header_to_string)
                    .collect(),
                None => Vec::new(),
            };
            let mut table = Table::new(name.as_str(), header);
            for cells in rows {
                let values: Vec<Option<String>> = cells.iter().map(cell_to_string).collect();
                if values.iter().all(Option::is_none) {
                    continue;
                }
                table.push_row(values);
            }
            debug!("sheet '{}': {} rows", name, table.len());
            workbook.insert(table);
        }
        Ok(workbook)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn header_to_string(cell: &Data) -> String {
    cell_to_string(cell)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Text form of a cell; `None` for empty cells.
fn cell_to_string(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{:.0}", f)
            } else {
                format!("{}", f)
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERROR: {:?}", e),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Data::Float(4.0), Some("4"))]
    #[case(Data::Float(4.5), Some("4.5"))]
    #[case(Data::Int(3), Some("3"))]
    #[case(Data::Bool(true), Some("true"))]
    #[case(Data::String(" Retail".into()), Some(" Retail"))]
    #[case(Data::String(String::new()), None)]
    #[case(Data::Empty, None)]
    fn given_cell_when_converting_then_renders_text(#[case] cell: Data, #[case] expected: Option<&str>) {
        assert_eq!(cell_to_string(&cell).as_deref(), expected);
    }

    #[rstest]
    #[case(Data::String("  Node_ID ".into()), "Node_ID")]
    #[case(Data::Empty, "")]
    fn given_header_cell_when_converting_then_trims(#[case] cell: Data, #[case] expected: &str) {
        assert_eq!(header_to_string(&cell), expected);
    }

    #[test]
    fn given_nonexistent_file_when_reading_then_not_found() {
        let source = XlsxSource::new("/nonexistent/workbook.xlsx");
        let err = source.read().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Workbook file not found: /nonexistent/workbook.xlsx"
        );
    }

    #[test]
    fn given_garbage_file_when_reading_then_reports_loading_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a spreadsheet").unwrap();
        let err = XlsxSource::new(&path).read().unwrap_err();
        assert!(matches!(err, SourceError::Read(_)));
        assert!(err.to_string().starts_with("Error loading workbook: "));
    }
}
