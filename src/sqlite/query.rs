use rusqlite::Statement;
use rusqlite::types::Value;

use crate::error::TemplateError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
///
/// Returns `TemplateError::ExecutionError` if the value cannot be read.
pub fn sqlite_extract_value(row: &rusqlite::Row, idx: usize) -> Result<RowValues, TemplateError> {
    let value: Value = row.get(idx)?;
    match value {
        Value::Null => Ok(RowValues::Null),
        Value::Integer(i) => Ok(RowValues::Int(i)),
        Value::Real(f) => Ok(RowValues::Float(f)),
        Value::Text(s) => Ok(RowValues::Text(s)),
        Value::Blob(b) => Ok(RowValues::Blob(b)),
    }
}

/// Step a prepared statement to completion.
///
/// With `fetch` set every row is collected under the statement's column names;
/// otherwise rows are stepped over and discarded so the statement still runs fully.
///
/// # Errors
/// Returns `TemplateError::ExecutionError` if stepping or value extraction fails.
pub fn build_result_set(stmt: &mut Statement<'_>, fetch: bool) -> Result<ResultSet, TemplateError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let column_count = column_names.len();

    let mut rows_iter = stmt.query([])?;
    let mut values = Vec::new();
    while let Some(row) = rows_iter.next()? {
        if !fetch {
            continue;
        }
        let mut row_values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            row_values.push(sqlite_extract_value(row, idx)?);
        }
        values.push(row_values);
    }

    Ok(ResultSet::from_rows(column_names, values))
}
