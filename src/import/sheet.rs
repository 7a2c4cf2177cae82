//! Spreadsheet parsing for passage imports

use calamine::{Data, Range, Reader, Xlsx};
use log::{debug, info};
use std::io::Cursor;
use std::path::Path;

use super::error::ImportError;
use super::rows::{RawBatch, RawPassageRow, RawQuestionRow, RawRow};

pub const PASSAGE_SHEET: &str = "passage";
pub const QUESTIONS_SHEET: &str = "questions";

const XLSX_EXTENSION: &str = "xlsx";

/// Header row plus data rows of one sheet
#[derive(Debug, Clone)]
pub struct SheetData {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl SheetData {
    fn from_range(name: &str, range: &Range<Data>) -> Self {
        let mut headers = Vec::new();
        let mut rows = Vec::new();

        for (row_idx, row) in range.rows().enumerate() {
            if row_idx == 0 {
                headers = row
                    .iter()
                    .map(|cell| cell_text(cell).unwrap_or_default().trim().to_string())
                    .collect();
                continue;
            }

            let mut raw = RawRow::new(rows.len());
            for (header, cell) in headers.iter().zip(row.iter()) {
                if header.is_empty() {
                    continue;
                }
                if let Some(text) = cell_text(cell) {
                    raw.cells.insert(header.clone(), text);
                }
            }

            // Blank rows are skipped, not counted
            if !raw.cells.is_empty() {
                rows.push(raw);
            }
        }

        Self {
            name: name.to_string(),
            headers,
            rows,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

/// Cell contents as text, `None` for empty cells
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::Error(_) => None,
        Data::String(s) if s.trim().is_empty() => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some((*f as i64).to_string()),
        other => Some(other.to_string()),
    }
}

fn has_xlsx_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(XLSX_EXTENSION))
}

/// Parse an uploaded workbook into raw passage and question rows
///
/// Fails with [`ImportError::Format`] for a non-`.xlsx` name, an unreadable
/// workbook or a missing `passage`/`questions` sheet, and with
/// [`ImportError::RowCount`] unless the passage sheet has exactly one row.
pub fn parse_workbook(file_name: &str, bytes: &[u8]) -> Result<RawBatch, ImportError> {
    if !has_xlsx_extension(file_name) {
        return Err(ImportError::Format("Only .xlsx files are allowed".to_string()));
    }

    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| ImportError::Format(format!("Could not read '{}': {}", file_name, e)))?;

    let sheet_names = workbook.sheet_names().to_owned();
    debug!("Workbook '{}' has sheets {:?}", file_name, sheet_names);

    if !sheet_names.iter().any(|s| s == PASSAGE_SHEET) || !sheet_names.iter().any(|s| s == QUESTIONS_SHEET) {
        return Err(ImportError::Format(
            "File must contain passage and questions sheets".to_string(),
        ));
    }

    let passage_sheet = read_sheet(&mut workbook, PASSAGE_SHEET)?;
    let question_sheet = read_sheet(&mut workbook, QUESTIONS_SHEET)?;

    if passage_sheet.row_count() != 1 {
        return Err(ImportError::RowCount(passage_sheet.row_count()));
    }

    info!(
        "Parsed '{}': 1 passage row, {} question rows",
        file_name,
        question_sheet.row_count()
    );

    Ok(RawBatch {
        passage: RawPassageRow::from(&passage_sheet.rows[0]),
        questions: question_sheet.rows.iter().map(RawQuestionRow::from).collect(),
    })
}

/// Read a workbook from disk and parse it
pub fn read_workbook_file<P: AsRef<Path>>(path: P) -> Result<RawBatch, ImportError> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    if !has_xlsx_extension(&file_name) {
        return Err(ImportError::Format("Only .xlsx files are allowed".to_string()));
    }

    let bytes = std::fs::read(path)
        .map_err(|e| ImportError::Format(format!("Could not open {:?}: {}", path, e)))?;

    parse_workbook(&file_name, &bytes)
}

fn read_sheet<R>(workbook: &mut Xlsx<R>, sheet_name: &str) -> Result<SheetData, ImportError>
where
    R: std::io::Read + std::io::Seek,
{
    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| ImportError::Format(format!("Error reading sheet '{}': {}", sheet_name, e)))?;

    let sheet = SheetData::from_range(sheet_name, &range);
    debug!(
        "Sheet '{}': {} columns, {} rows",
        sheet.name,
        sheet.column_count(),
        sheet.row_count()
    );
    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(has_xlsx_extension("passage.xlsx"));
        assert!(has_xlsx_extension("PASSAGE.XLSX"));
        assert!(!has_xlsx_extension("passage.xls"));
        assert!(!has_xlsx_extension("passage.csv"));
        assert!(!has_xlsx_extension("xlsx"));
    }

    #[test]
    fn wrong_extension_fails_before_reading_bytes() {
        let err = parse_workbook("questions.csv", b"not a workbook").unwrap_err();
        assert_eq!(err, ImportError::Format("Only .xlsx files are allowed".to_string()));
    }

    #[test]
    fn garbage_bytes_are_a_format_error() {
        let err = parse_workbook("broken.xlsx", b"definitely not a zip").unwrap_err();
        assert!(matches!(err, ImportError::Format(_)));
    }

    #[test]
    fn cells_render_like_spreadsheet_text() {
        assert_eq!(cell_text(&Data::Float(6.0)), Some("6".to_string()));
        assert_eq!(cell_text(&Data::Float(2.5)), Some("2.5".to_string()));
        assert_eq!(cell_text(&Data::Int(3)), Some("3".to_string()));
        assert_eq!(cell_text(&Data::String(String::new())), None);
        assert_eq!(cell_text(&Data::Empty), None);
    }

    #[test]
    fn whitespace_only_cells_are_blank() {
        assert_eq!(cell_text(&Data::String("   ".to_string())), None);
        assert_eq!(cell_text(&Data::String("\t\n".to_string())), None);
        assert_eq!(cell_text(&Data::String(" x ".to_string())), Some(" x ".to_string()));
    }
}
