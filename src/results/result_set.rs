use std::sync::Arc;

use super::map_rows_shared;
use super::record::Record;
use crate::types::RowValues;

/// What a backend hands back after running one statement.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The records fetched, empty when the fetch step was skipped
    pub results: Vec<Record>,
    /// Rows affected as reported by the driver (fetched row count for queries)
    pub rows_affected: usize,
    /// Column names shared by all records; `None` when the statement produced no result set
    column_names: Option<Arc<Vec<String>>>,
}

impl ResultSet {
    /// Build a result set from column descriptors and positional rows.
    #[must_use]
    pub fn from_rows(column_names: Vec<String>, rows: Vec<Vec<RowValues>>) -> ResultSet {
        let column_names = Arc::new(column_names);
        let results = map_rows_shared(&column_names, rows);
        ResultSet {
            rows_affected: results.len(),
            results,
            column_names: Some(column_names),
        }
    }

    /// A result set for a statement that returned no rows, only an affected count.
    #[must_use]
    pub fn affected(rows_affected: usize) -> ResultSet {
        ResultSet {
            rows_affected,
            ..ResultSet::default()
        }
    }

    /// Get the column names for this result set
    #[must_use]
    pub fn get_column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Whether the statement described any result columns.
    #[must_use]
    pub fn has_result_columns(&self) -> bool {
        self.column_names
            .as_ref()
            .is_some_and(|names| !names.is_empty())
    }

    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.results
    }
}
