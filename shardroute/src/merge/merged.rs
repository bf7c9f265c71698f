//! Merged cursor over several result streams.
use indexmap::IndexMap;

use super::{Error, QueryResult};
use crate::statement::Value;

/// One logical result, regardless of how many data sources answered.
/// Only the current row is held.
pub trait MergedResult {
    fn next(&mut self) -> Result<bool, Error>;

    fn value(&self, index: usize) -> Result<Value, Error>;

    fn column_count(&self) -> usize;

    fn column_label(&self, index: usize) -> Result<&str, Error>;

    /// Value of the column exposed under `label`, compared case-insensitively.
    fn value_by_label(&self, label: &str) -> Result<Value, Error> {
        let index = (0..self.column_count())
            .find(|&index| {
                self.column_label(index)
                    .map(|l| l.eq_ignore_ascii_case(label))
                    .unwrap_or(false)
            })
            .ok_or_else(|| Error::ColumnLabel(label.to_string()))?;
        self.value(index)
    }
}

/// Logical label of every column.
///
/// Labels come from the first stream. Overrides map a logical label
/// to the column it replaces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelMap {
    columns: Vec<String>,
    labels: Vec<String>,
}

impl LabelMap {
    pub fn new(stream: Option<&dyn QueryResult>, overrides: &IndexMap<String, usize>) -> Result<Self, Error> {
        let mut columns = vec![];
        if let Some(stream) = stream {
            for index in 0..stream.column_count() {
                columns.push(stream.column_label(index)?.to_string());
            }
        }

        let mut map = Self {
            labels: columns.clone(),
            columns,
        };
        map.reset(overrides);

        Ok(map)
    }

    /// Replace the overrides. Labels of the stream are restored first.
    pub fn reset(&mut self, overrides: &IndexMap<String, usize>) {
        self.labels = self.columns.clone();
        for (label, &index) in overrides {
            if let Some(column) = self.labels.get_mut(index) {
                *column = label.clone();
            }
        }
    }

    pub fn label(&self, index: usize) -> Result<&str, Error> {
        self.labels
            .get(index)
            .map(|label| label.as_str())
            .ok_or(Error::ColumnIndex {
                index,
                count: self.labels.len(),
            })
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels
            .iter()
            .position(|l| l.eq_ignore_ascii_case(label))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::merge::MemoryQueryResult;

    #[test]
    fn test_overrides() {
        let stream = MemoryQueryResult::new(&["Tables_in_db1", "Table_type"], vec![]);
        let mut overrides = IndexMap::new();
        overrides.insert("Tables_in_logic_db".to_string(), 0);
        overrides.insert("ignored".to_string(), 5);

        let mut map = LabelMap::new(Some(&stream as &dyn QueryResult), &overrides).unwrap();
        assert_eq!(map.label(0).unwrap(), "Tables_in_logic_db");
        assert_eq!(map.label(1).unwrap(), "Table_type");
        assert_eq!(map.index_of("tables_in_LOGIC_db"), Some(0));
        assert_eq!(map.index_of("Tables_in_db1"), None);

        map.reset(&IndexMap::new());
        assert_eq!(map.label(0).unwrap(), "Tables_in_db1");
    }

    #[test]
    fn test_no_streams() {
        let map = LabelMap::new(None, &IndexMap::new()).unwrap();
        assert!(map.is_empty());
        assert!(matches!(map.label(0), Err(Error::ColumnIndex { index: 0, count: 0 })));
    }
}
