use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::models::{Table, Value};

/// Column-cleaning pass applied to every sheet before export:
///
/// 1. drop any column whose name contains "recid" (case-insensitive);
/// 2. drop the named omission columns (system/audit fields);
/// 3. reformat date-like columns to m/d/yyyy text, unparseable cells
///    becoming empty strings;
/// 4. drop any column whose every value is empty, zero or NULL-ish.
///
/// Dates are formatted before the blank-column drop so that a date column
/// with nothing parseable in it disappears in the same pass; cleaning an
/// already-cleaned table is then a no-op. The input is left untouched and
/// row order and content are preserved.
pub fn clean(table: &Table, omissions: &[&str]) -> Table {
    let keep: Vec<usize> = (0..table.columns.len())
        .filter(|&i| {
            let name = &table.columns[i];
            !name.to_lowercase().contains("recid") && !omissions.contains(&name.as_str())
        })
        .collect();

    let mut cleaned = Table {
        columns: keep.iter().map(|&i| table.columns[i].clone()).collect(),
        rows: table
            .rows
            .iter()
            .map(|r| keep.iter().map(|&i| r[i].clone()).collect())
            .collect(),
    };

    for idx in 0..cleaned.columns.len() {
        if is_date_column(&cleaned.columns[idx], &cleaned.rows, idx) {
            for row in &mut cleaned.rows {
                row[idx] = format_date_value(&row[idx]);
            }
        }
    }

    let surviving: Vec<usize> = (0..cleaned.columns.len())
        .filter(|&i| !cleaned.rows.iter().all(|r| is_blank(&r[i])))
        .collect();

    Table {
        columns: surviving
            .iter()
            .map(|&i| cleaned.columns[i].clone())
            .collect(),
        rows: cleaned
            .rows
            .iter()
            .map(|r| surviving.iter().map(|&i| r[i].clone()).collect())
            .collect(),
    }
}

/// A column is date-like when its name says so, or when every non-null
/// value is already date-typed (the queries return real datetime columns
/// under names like "Maturity").
fn is_date_column(name: &str, rows: &[Vec<Value>], idx: usize) -> bool {
    if name.to_lowercase().contains("date") {
        return true;
    }
    let mut saw_date = false;
    for row in rows {
        match &row[idx] {
            Value::Date(_) | Value::DateTime(_) => saw_date = true,
            Value::Null => {}
            _ => return false,
        }
    }
    saw_date
}

fn format_date_value(value: &Value) -> Value {
    let date = match value {
        Value::Date(d) => Some(*d),
        Value::DateTime(dt) => Some(dt.date()),
        Value::Text(s) => parse_date_text(s),
        _ => None,
    };
    match date {
        Some(d) => Value::Text(format!("{}/{}/{}", d.month(), d.day(), d.year())),
        None => Value::Text(String::new()),
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%m-%d-%Y"];

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

/// The value set a column must consist entirely of to be dropped. `false`
/// counts as zero, matching how bit columns behave upstream.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Int(i) => *i == 0,
        Value::Float(f) => *f == 0.0,
        Value::Text(s) => {
            let t = s.trim();
            t.is_empty() || t == "0" || t == "0.0" || t == "NULL" || t == "null"
        }
        Value::Date(_) | Value::DateTime(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> Table {
        Table {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn test_recid_columns_dropped_regardless_of_content() {
        let t = table(
            &["LoanRecID", "recid", "PropRecIDRef", "Account"],
            vec![vec![1i64.into(), 2i64.into(), 3i64.into(), "L-100".into()]],
        );
        let cleaned = clean(&t, &[]);
        assert_eq!(cleaned.columns, vec!["Account"]);
    }

    #[test]
    fn test_omissions_dropped() {
        let t = table(
            &["SysCreatedBy", "Account"],
            vec![vec!["admin".into(), "L-100".into()]],
        );
        let cleaned = clean(&t, &["SysCreatedBy"]);
        assert_eq!(cleaned.columns, vec!["Account"]);
    }

    #[test]
    fn test_uniformly_blank_columns_dropped() {
        let rows = vec![
            vec![
                Value::Int(0),
                Value::Float(0.0),
                Value::Text("0".into()),
                Value::Text("  ".into()),
                Value::Null,
                Value::Text("NULL".into()),
                Value::Int(7),
            ],
            vec![
                Value::Int(0),
                Value::Null,
                Value::Text("0.0".into()),
                Value::Text(String::new()),
                Value::Null,
                Value::Text("null".into()),
                Value::Int(0),
            ],
        ];
        let t = table(&["A", "B", "C", "D", "E", "F", "Keep"], rows);
        let cleaned = clean(&t, &[]);
        assert_eq!(cleaned.columns, vec!["Keep"]);
        assert_eq!(cleaned.rows.len(), 2);
    }

    #[test]
    fn test_single_row_blank_column_dropped() {
        let t = table(&["A", "B"], vec![vec![Value::Int(0), Value::Int(1)]]);
        let cleaned = clean(&t, &[]);
        assert_eq!(cleaned.columns, vec!["B"]);
    }

    #[test]
    fn test_date_column_formats_to_month_day_year() {
        let t = table(
            &["CloseDate"],
            vec![
                vec![Value::Text("2024-01-05".into())],
                vec![Value::Text("not-a-date".into())],
                vec![Value::Null],
            ],
        );
        let cleaned = clean(&t, &[]);
        assert_eq!(cleaned.columns, vec!["CloseDate"]);
        assert_eq!(cleaned.rows[0][0], Value::Text("1/5/2024".into()));
        assert_eq!(cleaned.rows[1][0], Value::Text(String::new()));
        assert_eq!(cleaned.rows[2][0], Value::Text(String::new()));
    }

    #[test]
    fn test_datetime_typed_column_formats_without_date_in_name() {
        let dt = NaiveDate::from_ymd_opt(2023, 11, 2)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        let t = table(
            &["Maturity"],
            vec![vec![Value::DateTime(dt)], vec![Value::Null]],
        );
        let cleaned = clean(&t, &[]);
        assert_eq!(cleaned.rows[0][0], Value::Text("11/2/2023".into()));
        assert_eq!(cleaned.rows[1][0], Value::Text(String::new()));
    }

    #[test]
    fn test_date_column_of_junk_is_dropped_entirely() {
        let t = table(
            &["FundingDate", "Account"],
            vec![vec![Value::Text("garbage".into()), "L-1".into()]],
        );
        let cleaned = clean(&t, &[]);
        assert_eq!(cleaned.columns, vec!["Account"]);
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let t = table(
            &["LoanRecID", "CloseDate", "Empty", "Account"],
            vec![
                vec![
                    Value::Int(1),
                    Value::Text("2024-01-05".into()),
                    Value::Null,
                    "L-1".into(),
                ],
                vec![
                    Value::Int(2),
                    Value::Text("bad".into()),
                    Value::Text("0".into()),
                    "L-2".into(),
                ],
            ],
        );
        let once = clean(&t, &[]);
        let twice = clean(&once, &[]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_no_surviving_column_is_uniformly_blank() {
        let t = table(
            &["MixedDate", "Flag"],
            vec![
                vec![Value::Text("junk".into()), Value::Bool(false)],
                vec![Value::Text("more junk".into()), Value::Bool(true)],
            ],
        );
        let cleaned = clean(&t, &[]);
        for (i, _) in cleaned.columns.iter().enumerate() {
            assert!(!cleaned.rows.iter().all(|r| is_blank(&r[i])));
        }
        // the junk date column is gone, the flag column survives
        assert_eq!(cleaned.columns, vec!["Flag"]);
    }

    #[test]
    fn test_zero_row_table_cleans_to_zero_columns() {
        let t = Table::new(vec!["A".into(), "B".into()]);
        let cleaned = clean(&t, &[]);
        assert!(cleaned.columns.is_empty());
        assert_eq!(cleaned.row_count(), 0);
    }
}
