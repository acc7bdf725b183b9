//! Spreadsheet reading and writing
//!
//! Workbooks are read with calamine and written with rust_xlsxwriter. Album
//! metadata is handled as strings: numbers that come back from Excel as floats
//! are rendered without a trailing `.0`.
//!
//! The label's TOTAL METADATA workbook is maintained by hand in Excel, so it
//! is round-tripped through [`CellValue`] instead: numbers, dates, booleans
//! and formulas are written back as what they were.
//!
//! Rows returned by the readers are anchored at A1: leading empty rows and
//! columns are kept, so row indices match the sheet.

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Spreadsheet errors
#[derive(Debug, Error)]
pub enum SpreadsheetError {
    /// Workbook could not be opened or parsed
    #[error("Failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Sheet '{sheet}' not found in {path}")]
    SheetNotFound { path: PathBuf, sheet: String },

    #[error("Workbook {0} has no sheets")]
    NoSheets(PathBuf),

    #[error("Failed to write workbook: {0}")]
    Write(#[from] XlsxError),

    #[error("Failed to write delimited text: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One worksheet's cell values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Index of the last row with a non-blank cell
    pub fn last_non_empty_row(&self) -> Option<usize> {
        self.rows
            .iter()
            .rposition(|row| row.iter().any(|c| !c.trim().is_empty()))
    }

    /// First row
    pub fn header(&self) -> &[String] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rows after the header, skipping rows with no content
    pub fn data_rows(&self) -> impl Iterator<Item = &Vec<String>> {
        self.rows
            .iter()
            .skip(1)
            .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
    }
}

/// Render a cell as text
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", *f as i64)
        }
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn read_error(path: &Path, e: impl std::fmt::Display) -> SpreadsheetError {
    SpreadsheetError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

fn range_to_rows(range: &Range<Data>) -> Vec<Vec<String>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };
    let mut rows: Vec<Vec<String>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![String::new(); start_col as usize];
        cells.extend(row.iter().map(cell_to_string));
        rows.push(cells);
    }
    rows
}

fn open(path: &Path) -> Result<Xlsx<std::io::BufReader<std::fs::File>>, SpreadsheetError> {
    open_workbook(path).map_err(|e: calamine::XlsxError| read_error(path, e))
}

/// Every sheet of a workbook, in workbook order
pub fn read_workbook(path: &Path) -> Result<Vec<Sheet>, SpreadsheetError> {
    let mut workbook = open(path)?;
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| read_error(path, e))?;
        sheets.push(Sheet {
            rows: range_to_rows(&range),
            name,
        });
    }
    Ok(sheets)
}

/// One named sheet of a workbook
pub fn read_sheet(path: &Path, name: &str) -> Result<Sheet, SpreadsheetError> {
    let mut workbook = open(path)?;
    if !workbook.sheet_names().iter().any(|n| n == name) {
        return Err(SpreadsheetError::SheetNotFound {
            path: path.to_path_buf(),
            sheet: name.to_string(),
        });
    }
    let range = workbook
        .worksheet_range(name)
        .map_err(|e| read_error(path, e))?;
    Ok(Sheet {
        name: name.to_string(),
        rows: range_to_rows(&range),
    })
}

/// The first sheet of a workbook
pub fn read_first_sheet(path: &Path) -> Result<Sheet, SpreadsheetError> {
    let mut workbook = open(path)?;
    let name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| SpreadsheetError::NoSheets(path.to_path_buf()))?;
    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| read_error(path, e))?;
    Ok(Sheet {
        name,
        rows: range_to_rows(&range),
    })
}

fn save_atomically(workbook: &mut Workbook, path: &Path) -> Result<(), SpreadsheetError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let temp_path = path.with_extension("xlsx.tmp");
    workbook.save(&temp_path)?;
    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}

/// Write several sheets; the first row of each is bold
pub fn write_workbook(path: &Path, sheets: &[Sheet]) -> Result<(), SpreadsheetError> {
    let bold = Format::new().set_bold();
    let mut workbook = Workbook::new();
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        for (r, row) in sheet.rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                if r == 0 {
                    worksheet.write_string_with_format(r as u32, c as u16, value, &bold)?;
                } else {
                    worksheet.write_string(r as u32, c as u16, value)?;
                }
            }
        }
    }
    save_atomically(&mut workbook, path)?;
    tracing::debug!(path = %path.display(), sheets = sheets.len(), "Workbook written");
    Ok(())
}

/// A cell of a hand-maintained workbook
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date or time
    DateTime(f64),
    /// Excel serial duration
    Duration(f64),
    /// Formula without the leading `=`, with its last computed value
    Formula { formula: String, cached: String },
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) if dt.is_duration() => CellValue::Duration(dt.as_f64()),
            Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
            other => CellValue::Text(cell_to_string(other)),
        }
    }
}

/// One worksheet with typed cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypedSheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl TypedSheet {
    /// Index of the last row with a non-blank cell
    pub fn last_non_empty_row(&self) -> Option<usize> {
        self.rows
            .iter()
            .rposition(|row| row.iter().any(|c| !c.is_blank()))
    }
}

fn typed_rows(values: &Range<Data>, formulas: Option<&Range<String>>) -> Vec<Vec<CellValue>> {
    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    let mut put = |row: usize, col: usize, value: CellValue| {
        if rows.len() <= row {
            rows.resize(row + 1, Vec::new());
        }
        let cells = &mut rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, CellValue::Empty);
        }
        cells[col] = value;
    };

    if let Some((start_row, start_col)) = values.start() {
        for (r, row) in values.rows().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                put(
                    start_row as usize + r,
                    start_col as usize + c,
                    CellValue::from(cell),
                );
            }
        }
    }

    if let Some((formulas, (start_row, start_col))) =
        formulas.and_then(|f| f.start().map(|start| (f, start)))
    {
        for (r, row) in formulas.rows().enumerate() {
            for (c, formula) in row.iter().enumerate() {
                if formula.is_empty() {
                    continue;
                }
                let (row_abs, col_abs) = (start_row + r as u32, start_col + c as u32);
                let cached = values
                    .get_value((row_abs, col_abs))
                    .map(cell_to_string)
                    .unwrap_or_default();
                put(
                    row_abs as usize,
                    col_abs as usize,
                    CellValue::Formula {
                        formula: formula.trim_start_matches('=').to_string(),
                        cached,
                    },
                );
            }
        }
    }
    rows
}

/// Every sheet of a workbook with cell types and formulas, in workbook order
pub fn read_typed_workbook(path: &Path) -> Result<Vec<TypedSheet>, SpreadsheetError> {
    let mut workbook = open(path)?;
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let values = workbook
            .worksheet_range(&name)
            .map_err(|e| read_error(path, e))?;
        let formulas = match workbook.worksheet_formula(&name) {
            Ok(formulas) => Some(formulas),
            Err(e) => {
                tracing::warn!(sheet = %name, error = %e, "Could not read formulas");
                None
            }
        };
        sheets.push(TypedSheet {
            rows: typed_rows(&values, formulas.as_ref()),
            name,
        });
    }
    Ok(sheets)
}

/// Write typed sheets; text in the first row of each is bold
pub fn write_typed_workbook(path: &Path, sheets: &[TypedSheet]) -> Result<(), SpreadsheetError> {
    let bold = Format::new().set_bold();
    let date = Format::new().set_num_format("yyyy-mm-dd");
    let date_time = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
    let duration = Format::new().set_num_format("[h]:mm:ss");

    let mut workbook = Workbook::new();
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        for (r, row) in sheet.rows.iter().enumerate() {
            let r32 = r as u32;
            for (c, cell) in row.iter().enumerate() {
                let c16 = c as u16;
                match cell {
                    CellValue::Empty => {}
                    CellValue::Text(s) if s.is_empty() => {}
                    CellValue::Text(s) if r == 0 => {
                        worksheet.write_string_with_format(r32, c16, s, &bold)?;
                    }
                    CellValue::Text(s) => {
                        worksheet.write_string(r32, c16, s)?;
                    }
                    CellValue::Number(n) => {
                        worksheet.write_number(r32, c16, *n)?;
                    }
                    CellValue::Bool(b) => {
                        worksheet.write_boolean(r32, c16, *b)?;
                    }
                    CellValue::DateTime(serial) if serial.fract() == 0.0 => {
                        worksheet.write_number_with_format(r32, c16, *serial, &date)?;
                    }
                    CellValue::DateTime(serial) => {
                        worksheet.write_number_with_format(r32, c16, *serial, &date_time)?;
                    }
                    CellValue::Duration(serial) => {
                        worksheet.write_number_with_format(r32, c16, *serial, &duration)?;
                    }
                    CellValue::Formula { formula, cached } => {
                        worksheet
                            .write_formula(r32, c16, formula.as_str())?
                            .set_formula_result(r32, c16, cached.as_str());
                    }
                }
            }
        }
    }
    save_atomically(&mut workbook, path)?;
    tracing::debug!(path = %path.display(), sheets = sheets.len(), "Typed workbook written");
    Ok(())
}

/// Write a single-sheet workbook with a bold header row
pub fn write_xlsx(
    path: &Path,
    sheet_name: &str,
    header: &[&str],
    rows: &[Vec<String>],
) -> Result<(), SpreadsheetError> {
    let mut all_rows = Vec::with_capacity(rows.len() + 1);
    all_rows.push(header.iter().map(|h| h.to_string()).collect());
    all_rows.extend(rows.iter().cloned());
    write_workbook(
        path,
        &[Sheet {
            name: sheet_name.to_string(),
            rows: all_rows,
        }],
    )
}

/// Write a tab-delimited text file with a header row
pub fn write_tsv(path: &Path, header: &[String], rows: &[Vec<String>]) -> Result<(), SpreadsheetError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
