//! TOTAL METADATA synchronization
//!
//! The label keeps every released track in one workbook, one sheet per
//! catalogue (IMG, IMT). After an album's METADATA.xlsx has been checked, its
//! rows are appended to the matching sheet, separated from the previous album
//! by exactly one blank row. The workbook is copied to `<name> (backup).xlsx`
//! before it is touched. Existing cells keep their types, number formats of
//! dates, and formulas.

use crate::error::ReleaseResult;
use crate::services::spreadsheet::{self, CellValue, SpreadsheetError};
use relm_common::config::LabelConfig;
use std::path::{Path, PathBuf};

/// Outcome of a sync
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub sheet: String,
    pub backup: PathBuf,
    /// 0-based row index of the first appended row
    pub first_row: usize,
    pub rows_appended: usize,
}

/// `<stem> (backup).xlsx` next to the workbook
pub fn backup_path(total: &Path) -> PathBuf {
    let stem = total
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("TOTAL METADATA");
    total.with_file_name(format!("{} (backup).xlsx", stem))
}

/// Row index receiving the first appended row
///
/// Two rows below the last non-empty row; an empty sheet is treated as having
/// only its header row.
pub fn append_start(last_non_empty_row: Option<usize>) -> usize {
    last_non_empty_row.unwrap_or(0) + 2
}

/// Append the album sheet's data rows to the TOTAL METADATA workbook
pub fn sync_total(
    album_metadata: &Path,
    total: &Path,
    album_code: &str,
    label: &LabelConfig,
) -> ReleaseResult<SyncReport> {
    if !total.is_file() {
        return Err(SpreadsheetError::Read {
            path: total.to_path_buf(),
            message: "workbook not found".to_string(),
        }
        .into());
    }
    let target_sheet = label.total_sheet(album_code).to_string();

    let mut sheets = spreadsheet::read_typed_workbook(total)?;
    let Some(index) = sheets.iter().position(|s| s.name == target_sheet) else {
        return Err(SpreadsheetError::SheetNotFound {
            path: total.to_path_buf(),
            sheet: target_sheet,
        }
        .into());
    };

    let album = spreadsheet::read_first_sheet(album_metadata)?;
    let new_rows: Vec<Vec<CellValue>> = album
        .data_rows()
        .map(|row| row.iter().cloned().map(CellValue::Text).collect())
        .collect();

    let backup = backup_path(total);
    std::fs::copy(total, &backup)?;
    tracing::info!(backup = %backup.display(), "TOTAL METADATA backed up");

    let sheet = &mut sheets[index];
    let first_row = append_start(sheet.last_non_empty_row());
    sheet.rows.resize(first_row, Vec::new());
    sheet.rows.extend(new_rows);
    let rows_appended = sheet.rows.len() - first_row;

    spreadsheet::write_typed_workbook(total, &sheets)?;

    tracing::info!(
        album = %album_code,
        sheet = %target_sheet,
        first_row = first_row + 1,
        rows = rows_appended,
        "Rows appended to TOTAL METADATA"
    );
    Ok(SyncReport {
        sheet: target_sheet,
        backup,
        first_row,
        rows_appended,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReleaseError;
    use crate::services::spreadsheet::{Sheet, TypedSheet};
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use tempfile::TempDir;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn sheet(name: &str, rows: Vec<Vec<String>>) -> Sheet {
        Sheet {
            name: name.to_string(),
            rows,
        }
    }

    #[test]
    fn test_backup_path() {
        assert_eq!(
            backup_path(Path::new("/m/_IMAGINE MUSIC TOTAL METADATA.xlsx")),
            PathBuf::from("/m/_IMAGINE MUSIC TOTAL METADATA (backup).xlsx")
        );
    }

    #[test]
    fn test_append_start_leaves_one_blank_row() {
        let start = |s: Sheet| append_start(s.last_non_empty_row());
        assert_eq!(start(sheet("IMG", vec![])), 2);
        assert_eq!(start(sheet("IMG", vec![row(&["H"])])), 2);
        assert_eq!(
            start(sheet("IMG", vec![row(&["H"]), row(&["a"]), row(&[""])])),
            3
        );
    }

    fn setup(dir: &TempDir) -> (PathBuf, PathBuf) {
        let total = dir.path().join("TOTAL.xlsx");
        spreadsheet::write_workbook(
            &total,
            &[
                sheet("IMG", vec![row(&["H1", "H2"]), row(&["old", "1"])]),
                sheet("IMT", vec![row(&["H1", "H2"])]),
            ],
        )
        .unwrap();
        let album = dir.path().join("IMG042 RISE METADATA.xlsx");
        spreadsheet::write_xlsx(
            &album,
            "Sheet1",
            &["H1", "H2"],
            &[row(&["new", "2"]), row(&["new", "3"])],
        )
        .unwrap();
        (total, album)
    }

    #[test]
    fn test_sync_appends_after_blank_row_and_keeps_other_sheets() {
        let dir = TempDir::new().unwrap();
        let (total, album) = setup(&dir);

        let report = sync_total(&album, &total, "IMG042", &LabelConfig::default()).unwrap();

        assert_eq!(report.sheet, "IMG");
        assert_eq!(report.first_row, 3);
        assert_eq!(report.rows_appended, 2);
        assert!(report.backup.exists());

        let img = spreadsheet::read_sheet(&total, "IMG").unwrap();
        assert_eq!(img.rows[1], row(&["old", "1"]));
        assert!(img.rows[2].iter().all(|c| c.is_empty()));
        assert_eq!(img.rows[3], row(&["new", "2"]));
        assert_eq!(img.rows[4], row(&["new", "3"]));

        let imt = spreadsheet::read_sheet(&total, "IMT").unwrap();
        assert_eq!(imt.rows, vec![row(&["H1", "H2"])]);

        let backup = spreadsheet::read_sheet(&report.backup, "IMG").unwrap();
        assert_eq!(backup.rows.len(), 2);
    }

    #[test]
    fn test_tools_album_goes_to_imt_sheet() {
        let dir = TempDir::new().unwrap();
        let (total, album) = setup(&dir);
        let report = sync_total(&album, &total, "IMT007", &LabelConfig::default()).unwrap();
        assert_eq!(report.sheet, "IMT");
        assert_eq!(report.first_row, 2);
    }

    #[test]
    fn test_missing_workbook_or_sheet() {
        let dir = TempDir::new().unwrap();
        let (total, album) = setup(&dir);
        let missing = dir.path().join("nope.xlsx");
        assert!(sync_total(&album, &missing, "IMG042", &LabelConfig::default()).is_err());

        let label = LabelConfig {
            main_prefix: "XYZ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            sync_total(&album, &total, "IMG042", &label),
            Err(ReleaseError::Spreadsheet(SpreadsheetError::SheetNotFound { .. }))
        ));
        assert!(!backup_path(&total).exists());
    }

    #[test]
    fn test_sync_keeps_dates_numbers_and_formulas() {
        let dir = TempDir::new().unwrap();
        let (total, album) = setup(&dir);
        let text = |s: &str| CellValue::Text(s.to_string());
        spreadsheet::write_typed_workbook(
            &total,
            &[
                TypedSheet {
                    name: "IMG".to_string(),
                    rows: vec![
                        vec![text("Released"), text("Count"), text("Duration")],
                        vec![
                            // 2024-03-15
                            CellValue::DateTime(45366.0),
                            CellValue::Formula {
                                formula: "1+1".to_string(),
                                cached: "2".to_string(),
                            },
                            CellValue::Number(154.5),
                        ],
                    ],
                },
                TypedSheet {
                    name: "IMT".to_string(),
                    rows: vec![vec![text("H1")]],
                },
            ],
        )
        .unwrap();

        let report = sync_total(&album, &total, "IMG042", &LabelConfig::default()).unwrap();
        assert_eq!(report.first_row, 3);

        let mut workbook: Xlsx<_> = open_workbook(&total).unwrap();
        let values = workbook.worksheet_range("IMG").unwrap();
        match values.get_value((1, 0)) {
            Some(Data::DateTime(date)) => {
                assert!(!date.is_duration());
                assert_eq!(date.as_f64(), 45366.0);
            }
            other => panic!("expected a date in A2, got {:?}", other),
        }
        assert_eq!(values.get_value((1, 2)), Some(&Data::Float(154.5)));
        assert_eq!(
            values.get_value((3, 0)),
            Some(&Data::String("new".to_string()))
        );

        let formulas = workbook.worksheet_formula("IMG").unwrap();
        assert_eq!(formulas.get_value((1, 1)).map(String::as_str), Some("1+1"));

        let typed = spreadsheet::read_typed_workbook(&total).unwrap();
        assert_eq!(typed[0].rows[1][0], CellValue::DateTime(45366.0));
        assert!(typed[0].rows[2].iter().all(CellValue::is_blank));
    }
}
