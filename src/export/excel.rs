use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Note, Workbook, Worksheet};

use crate::mappings::FieldDefinitions;
use crate::models::{Table, Value};

const NOTE_AUTHOR: &str = "TMO Reference";

/// Writes one cleaned table as a single-worksheet workbook: header row,
/// data rows, columns sized to their widest rendered value, and a note on
/// every header cell that has a scraped field definition.
pub fn write_sheet(
    label: &str,
    table: &Table,
    defs: &FieldDefinitions,
    path: &Path,
) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(label)?;

    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write(0, col as u16, name.as_str())?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    for (row_idx, row) in table.rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            write_value(worksheet, (row_idx + 1) as u32, col as u16, value)?;
        }
    }

    autosize_columns(worksheet, table)?;
    annotate_headers(worksheet, table, defs)?;

    workbook
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn write_value(worksheet: &mut Worksheet, row: u32, col: u16, value: &Value) -> Result<()> {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            worksheet.write(row, col, *b)?;
        }
        Value::Int(i) => {
            worksheet.write(row, col, *i)?;
        }
        Value::Float(f) => {
            worksheet.write(row, col, *f)?;
        }
        Value::Text(s) => {
            worksheet.write(row, col, s.as_str())?;
        }
        // date values normally leave cleaning as text already
        Value::Date(_) | Value::DateTime(_) => {
            worksheet.write(row, col, value.render())?;
        }
    }
    Ok(())
}

/// Width heuristic: widest rendered value in the column (header included)
/// plus a margin, scaled for proportional fonts.
fn autosize_columns(worksheet: &mut Worksheet, table: &Table) -> Result<()> {
    for (col, name) in table.columns.iter().enumerate() {
        let mut widest = name.chars().count();
        for row in &table.rows {
            widest = widest.max(row[col].render().chars().count());
        }
        worksheet.set_column_width(col as u16, (widest as f64 + 2.0) * 1.15)?;
    }
    Ok(())
}

fn annotate_headers(
    worksheet: &mut Worksheet,
    table: &Table,
    defs: &FieldDefinitions,
) -> Result<()> {
    for (col, name) in table.columns.iter().enumerate() {
        if let Some(text) = defs.get(note_key(name)) {
            let note = Note::new(text)
                .set_author(NOTE_AUTHOR)
                .set_width(400)
                .set_height(200);
            worksheet.insert_note(0, col as u16, &note)?;
        }
    }
    Ok(())
}

/// Headers on the merged sheet carry an entity prefix that the help site
/// does not; definitions are keyed on the bare field name.
pub(crate) fn note_key(header: &str) -> &str {
    header
        .strip_prefix("Property: ")
        .or_else(|| header.strip_prefix("Insurance: "))
        .unwrap_or(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Table;

    fn sample_table() -> Table {
        Table {
            columns: vec!["Account".into(), "NoteRate".into()],
            rows: vec![
                vec![Value::Text("L-100".into()), Value::Float(7.25)],
                vec![Value::Text("L-101".into()), Value::Null],
            ],
        }
    }

    #[test]
    fn test_note_key_strips_entity_prefixes() {
        assert_eq!(note_key("Property: Street"), "Street");
        assert_eq!(note_key("Insurance: Carrier"), "Carrier");
        assert_eq!(note_key("Account"), "Account");
    }

    #[test]
    fn test_writes_workbook_with_definitions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1-Loans.xlsx");

        let mut defs = FieldDefinitions::new();
        defs.insert(
            "Account".to_string(),
            "The loan account number\nUnique per loan".to_string(),
        );

        write_sheet("1-Loans", &sample_table(), &defs, &path).unwrap();

        let written = std::fs::metadata(&path).unwrap();
        assert!(written.len() > 0);
    }

    #[test]
    fn test_failed_sheet_leaves_earlier_sheets_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let labels = ["1-Loans", "2-Co-Borrowers", "3-Fundings"];

        // a directory squatting on the third file name makes its save fail
        std::fs::create_dir(dir.path().join("3-Fundings.xlsx")).unwrap();

        let defs = FieldDefinitions::new();
        let mut failure = None;
        for label in labels {
            let path = dir.path().join(format!("{label}.xlsx"));
            if let Err(e) = write_sheet(label, &sample_table(), &defs, &path) {
                failure = Some(e);
                break;
            }
        }

        let err = failure.expect("third sheet must fail");
        assert!(err.to_string().contains("3-Fundings.xlsx"));
        assert!(dir.path().join("1-Loans.xlsx").is_file());
        assert!(dir.path().join("2-Co-Borrowers.xlsx").is_file());
    }
}
