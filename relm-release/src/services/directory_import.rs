//! Rebuild the composer and ISRC directories from TOTAL METADATA
//!
//! Every sheet is read with its own header row, so sheets whose columns drift
//! from the standard layout still import. The first occurrence of a composer,
//! publisher or ISRC wins; later rows never overwrite it.

use crate::models::{
    join_name_parts, ComposerDirectory, ComposerEntry, IsrcDirectory, IsrcEntry, PublisherEntry,
};
use crate::services::metadata_builder::WRITER_SLOTS;
use crate::services::spreadsheet::Sheet;
use std::collections::HashMap;

/// Cell text with spreadsheet placeholders for "no value" removed
pub fn clean_cell(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("nan") || trimmed == "None" {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Column lookup over one sheet's header row
struct HeaderIndex {
    columns: HashMap<String, usize>,
}

impl HeaderIndex {
    fn new(sheet: &Sheet) -> Self {
        let mut columns = HashMap::new();
        for (i, name) in sheet.header().iter().enumerate() {
            columns.entry(name.trim().to_string()).or_insert(i);
        }
        Self { columns }
    }

    fn get(&self, row: &[String], column: &str) -> String {
        self.columns
            .get(column)
            .and_then(|&i| row.get(i))
            .map(|v| clean_cell(v))
            .unwrap_or_default()
    }
}

/// Composer directory from every sheet of the workbook
pub fn import_composers(sheets: &[Sheet]) -> ComposerDirectory {
    let mut directory = ComposerDirectory::default();
    for sheet in sheets {
        let header = HeaderIndex::new(sheet);
        for row in sheet.data_rows() {
            for slot in 1..=WRITER_SLOTS {
                let field = |name: &str| header.get(row, &format!("WRITER:{}: {}", slot, name));
                let first_name = field("First Name");
                let middle_name = field("Middle Name");
                let last_name = field("Last Name");
                if first_name.is_empty() && last_name.is_empty() {
                    continue;
                }
                let key = join_name_parts(&first_name, &middle_name, &last_name);
                directory.composers.entry(key).or_insert_with(|| ComposerEntry {
                    society: field("Society"),
                    ipi: field("IPI"),
                    publisher_key: field("Original Publisher"),
                    first_name,
                    middle_name,
                    last_name,
                    capacity: None,
                });
            }

            let name = header.get(row, "PUBLISHER:1: Name");
            if !name.is_empty() {
                directory
                    .publishers
                    .entry(name.clone())
                    .or_insert_with(|| PublisherEntry {
                        publisher_name: name,
                        publisher_society: header.get(row, "PUBLISHER:1: Society"),
                        publisher_ipi: header.get(row, "PUBLISHER:1: IPI"),
                    });
            }
        }
        tracing::debug!(sheet = %sheet.name, "Sheet imported into composer directory");
    }
    tracing::info!(
        composers = directory.composers.len(),
        publishers = directory.publishers.len(),
        "Composer directory rebuilt"
    );
    directory
}

/// ISRC directory from every sheet of the workbook
pub fn import_isrc(sheets: &[Sheet]) -> IsrcDirectory {
    let mut directory = IsrcDirectory::new();
    for sheet in sheets {
        let header = HeaderIndex::new(sheet);
        for row in sheet.data_rows() {
            let code = header.get(row, "CODE: ISRC");
            if code.is_empty() {
                continue;
            }
            directory.entry(code).or_insert_with(|| IsrcEntry {
                album_code: header.get(row, "ALBUM: Code"),
                album_title: header.get(row, "ALBUM: Title"),
                track_title: header.get(row, "TRACK: Title"),
            });
        }
    }
    tracing::info!(codes = directory.len(), "ISRC directory rebuilt");
    directory
}
