use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::RowValues;

/// One result row: an ordered mapping from column name to value.
///
/// Column names are shared by every record of a result set; iteration and
/// serialization follow the column order the database reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    column_names: Arc<Vec<String>>,
    values: Vec<RowValues>,
}

impl Record {
    /// Create a record from shared column names and the row's positional values.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<RowValues>) -> Self {
        Self {
            column_names,
            values,
        }
    }

    /// Get the index of a column by name
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_names.iter().position(|col| col == column_name)
    }

    /// Get a value from the record by column name
    ///
    /// With duplicate column names (e.g. an unaliased join) the first one wins.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value from the record by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.values.get(index)
    }

    #[must_use]
    pub fn column_names(&self) -> &Arc<Vec<String>> {
        &self.column_names
    }

    #[must_use]
    pub fn values(&self) -> &[RowValues] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.column_names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        Record::new(
            Arc::new(vec!["zeta".into(), "alpha".into(), "zeta".into()]),
            vec![
                RowValues::Int(1),
                RowValues::Text("a".into()),
                RowValues::Int(3),
            ],
        )
    }

    #[test]
    fn lookup_by_name_and_index() {
        let rec = sample();
        assert_eq!(rec.get("alpha"), Some(&RowValues::Text("a".into())));
        assert_eq!(rec.get("zeta"), Some(&RowValues::Int(1)));
        assert_eq!(rec.get_by_index(2), Some(&RowValues::Int(3)));
        assert_eq!(rec.get("missing"), None);
        assert_eq!(rec.len(), 3);
    }

    #[test]
    fn serializes_in_column_order() {
        let rec = Record::new(
            Arc::new(vec!["name".into(), "id".into()]),
            vec![RowValues::Text("ann".into()), RowValues::Int(5)],
        );
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(json, r#"{"name":"ann","id":5}"#);
    }
}
