//! Result mapping: turns column descriptors plus positional rows into ordered records.

mod record;
mod result_set;

pub use record::Record;
pub use result_set::ResultSet;

use std::sync::Arc;

use crate::types::RowValues;

/// Zip each row with the column names, in column order.
///
/// One record per row; every record shares the same column-name list. Rows are expected
/// to carry exactly one value per column, which is what the backends guarantee.
#[must_use]
pub fn map_rows(column_names: Vec<String>, rows: Vec<Vec<RowValues>>) -> Vec<Record> {
    map_rows_shared(&Arc::new(column_names), rows)
}

pub(crate) fn map_rows_shared(
    column_names: &Arc<Vec<String>>,
    rows: Vec<Vec<RowValues>>,
) -> Vec<Record> {
    rows.into_iter()
        .map(|values| Record::new(Arc::clone(column_names), values))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_rows_in_order() {
        let records = map_rows(
            vec!["id".into(), "name".into()],
            vec![
                vec![RowValues::Int(1), RowValues::Text("a".into())],
                vec![RowValues::Int(2), RowValues::Text("b".into())],
            ],
        );

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("id"), Some(&RowValues::Int(1)));
        assert_eq!(records[0].get("name").and_then(RowValues::as_text), Some("a"));
        assert_eq!(records[1].get("id"), Some(&RowValues::Int(2)));
        assert_eq!(records[1].get("name").and_then(RowValues::as_text), Some("b"));

        let keys: Vec<&str> = records[1].iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["id", "name"]);
    }

    #[test]
    fn no_rows_no_records() {
        assert!(map_rows(vec!["id".into()], Vec::new()).is_empty());
    }

    #[test]
    fn records_share_column_names() {
        let records = map_rows(
            vec!["x".into()],
            vec![vec![RowValues::Int(1)], vec![RowValues::Int(2)]],
        );
        assert!(Arc::ptr_eq(
            records[0].column_names(),
            records[1].column_names()
        ));
    }
}
