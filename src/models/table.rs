use chrono::{Datelike, NaiveDate, NaiveDateTime};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    #[error("column '{name}' has {got} values but the table has {want} rows")]
    LengthMismatch {
        name: String,
        got: usize,
        want: usize,
    },
}

/// A single cell value as it comes back from a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text rendering used for column sizing and for cells that Excel has
    /// no native type for. Null renders as the empty string.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::Date(d) => format!("{}/{}/{}", d.month(), d.day(), d.year()),
            Value::DateTime(dt) => {
                let d = dt.date();
                format!("{}/{}/{}", d.month(), d.day(), d.year())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

/// An ordered set of named columns over ordered rows. Row order is never
/// changed by any operation here; only columns move.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Index of the first column with the given name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column_values(&self, name: &str) -> Result<Vec<Value>, TableError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))?;
        Ok(self.rows.iter().map(|r| r[idx].clone()).collect())
    }

    /// Copy of the table without the named columns. Row count is preserved
    /// even when every column goes away.
    pub fn without_columns(&self, names: &[&str]) -> Table {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !names.contains(&self.columns[i].as_str()))
            .collect();
        Table {
            columns: keep.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| keep.iter().map(|&i| r[i].clone()).collect())
                .collect(),
        }
    }

    pub fn drop_columns(&mut self, names: &[&str]) {
        *self = self.without_columns(names);
    }

    pub fn prefix_columns(&mut self, prefix: &str) {
        for name in &mut self.columns {
            *name = format!("{prefix}{name}");
        }
    }

    /// Renames the first matching column; no-op when absent.
    pub fn rename_column(&mut self, from: &str, to: &str) {
        if let Some(idx) = self.column_index(from) {
            self.columns[idx] = to.to_string();
        }
    }

    /// Moves the first matching column to position 0; no-op when absent.
    pub fn move_to_front(&mut self, name: &str) {
        if let Some(idx) = self.column_index(name) {
            let col = self.columns.remove(idx);
            self.columns.insert(0, col);
            for row in &mut self.rows {
                let v = row.remove(idx);
                row.insert(0, v);
            }
        }
    }

    pub fn push_column(&mut self, name: &str, values: Vec<Value>) -> Result<(), TableError> {
        if values.len() != self.rows.len() {
            return Err(TableError::LengthMismatch {
                name: name.to_string(),
                got: values.len(),
                want: self.rows.len(),
            });
        }
        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    /// Left join on key equality. Every row of `self` appears at least
    /// once, in order; a row with N key matches in `right` expands to N
    /// output rows (right order), a row with none gets nulls for the
    /// right-hand columns. Null keys never match.
    pub fn left_join(
        &self,
        right: &Table,
        left_key: &str,
        right_key: &str,
    ) -> Result<Table, TableError> {
        let lk = self
            .column_index(left_key)
            .ok_or_else(|| TableError::UnknownColumn(left_key.to_string()))?;
        let rk = right
            .column_index(right_key)
            .ok_or_else(|| TableError::UnknownColumn(right_key.to_string()))?;

        let mut columns = self.columns.clone();
        columns.extend(right.columns.iter().cloned());

        let mut rows = Vec::new();
        for left_row in &self.rows {
            let key = &left_row[lk];
            let mut matched = false;
            if !key.is_null() {
                for right_row in &right.rows {
                    if right_row[rk] == *key {
                        let mut row = left_row.clone();
                        row.extend(right_row.iter().cloned());
                        rows.push(row);
                        matched = true;
                    }
                }
            }
            if !matched {
                let mut row = left_row.clone();
                row.extend(std::iter::repeat(Value::Null).take(right.columns.len()));
                rows.push(row);
            }
        }

        Ok(Table { columns, rows })
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
    fn test_left_join_expands_matches() {
        let left = table(
            &["Name", "Id"],
            vec![
                vec!["a".into(), 1i64.into()],
                vec!["b".into(), 2i64.into()],
            ],
        );
        let right = table(
            &["Ref", "Policy"],
            vec![
                vec![1i64.into(), "fire".into()],
                vec![1i64.into(), "flood".into()],
            ],
        );

        let joined = left.left_join(&right, "Id", "Ref").unwrap();
        assert_eq!(joined.columns, vec!["Name", "Id", "Ref", "Policy"]);
        assert_eq!(joined.rows.len(), 3);
        // "a" matched twice, same left values on both rows
        assert_eq!(joined.rows[0][0], Value::from("a"));
        assert_eq!(joined.rows[0][3], Value::from("fire"));
        assert_eq!(joined.rows[1][0], Value::from("a"));
        assert_eq!(joined.rows[1][3], Value::from("flood"));
        // "b" unmatched, padded with nulls
        assert_eq!(joined.rows[2][0], Value::from("b"));
        assert_eq!(joined.rows[2][2], Value::Null);
        assert_eq!(joined.rows[2][3], Value::Null);
    }

    #[test]
    fn test_left_join_null_keys_never_match() {
        let left = table(&["Id"], vec![vec![Value::Null]]);
        let right = table(&["Ref"], vec![vec![Value::Null]]);

        let joined = left.left_join(&right, "Id", "Ref").unwrap();
        assert_eq!(joined.rows.len(), 1);
        assert_eq!(joined.rows[0][1], Value::Null);
    }

    #[test]
    fn test_move_to_front() {
        let mut t = table(
            &["A", "B", "C"],
            vec![vec![1i64.into(), 2i64.into(), 3i64.into()]],
        );
        t.move_to_front("C");
        assert_eq!(t.columns, vec!["C", "A", "B"]);
        assert_eq!(t.rows[0], vec![3i64.into(), 1i64.into(), 2i64.into()]);

        // absent column is a no-op
        t.move_to_front("Missing");
        assert_eq!(t.columns, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_without_columns_keeps_row_count() {
        let t = table(&["A"], vec![vec![1i64.into()], vec![2i64.into()]]);
        let stripped = t.without_columns(&["A"]);
        assert!(stripped.columns.is_empty());
        assert_eq!(stripped.row_count(), 2);
    }

    #[test]
    fn test_push_column_length_mismatch() {
        let mut t = table(&["A"], vec![vec![1i64.into()]]);
        let err = t.push_column("B", vec![]).unwrap_err();
        assert!(matches!(err, TableError::LengthMismatch { .. }));
    }

    #[test]
    fn test_render_dates_without_leading_zeros() {
        let d = Value::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(d.render(), "1/5/2024");
    }
}
