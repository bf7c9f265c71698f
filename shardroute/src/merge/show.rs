//! Results of SHOW statements that name tables or schemas.
//!
//! Every data source answers with its actual table names and its own
//! schema. These merges expose logic names instead.
use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;

use super::{Error, LabelMap, MergedResult, QueryResult};
use crate::rule::ShardingRule;
use crate::statement::Value;

/// Column holding the table name.
const TABLE_COLUMN: usize = 0;

/// Rows of every stream in route order, table names mapped to
/// their logic tables when a rule is attached.
///
/// Actual tables of the same logic table collapse into one row.
/// Other rows are passed through as is.
pub struct LogicTablesMergedResult {
    streams: Vec<Box<dyn QueryResult>>,
    position: usize,
    labels: LabelMap,
    rule: Option<Arc<ShardingRule>>,
    logic_tables: HashSet<String>,
    row: Option<Vec<Value>>,
    renamed: Option<(String, String)>,
}

impl LogicTablesMergedResult {
    pub fn new(
        streams: Vec<Box<dyn QueryResult>>,
        overrides: &IndexMap<String, usize>,
        rule: Option<Arc<ShardingRule>>,
    ) -> Result<Self, Error> {
        let labels = LabelMap::new(streams.first().map(|s| s.as_ref()), overrides)?;

        Ok(Self {
            streams,
            position: 0,
            labels,
            rule,
            logic_tables: HashSet::new(),
            row: None,
            renamed: None,
        })
    }

    /// Replace the label overrides.
    pub fn reset_label_map(&mut self, overrides: &IndexMap<String, usize>) {
        self.labels.reset(overrides);
    }

    /// Actual and logic table name of the current row, if it was renamed.
    pub fn renamed(&self) -> Option<(&str, &str)> {
        self.renamed
            .as_ref()
            .map(|(actual, logic)| (actual.as_str(), logic.as_str()))
    }

    fn read_row(stream: &dyn QueryResult) -> Result<Vec<Value>, Error> {
        (0..stream.column_count())
            .map(|index| stream.value(index).cloned())
            .collect()
    }

    // Map the table name of a row. None if the logic table was already seen.
    fn rename(&mut self, row: &mut [Value]) -> Option<()> {
        self.renamed = None;

        let Some(rule) = self.rule.as_ref() else {
            return Some(());
        };
        let Some(Value::Text(actual)) = row.get(TABLE_COLUMN) else {
            return Some(());
        };
        let Some(logic) = rule.logic_table_of(actual) else {
            return Some(());
        };

        if !self.logic_tables.insert(logic.to_lowercase()) {
            return None;
        }

        self.renamed = Some((actual.clone(), logic.to_string()));
        row[TABLE_COLUMN] = Value::Text(logic.to_string());

        Some(())
    }
}

impl MergedResult for LogicTablesMergedResult {
    fn next(&mut self) -> Result<bool, Error> {
        loop {
            let Some(stream) = self.streams.get_mut(self.position) else {
                self.row = None;
                return Ok(false);
            };

            if !stream.next()? {
                self.position += 1;
                continue;
            }

            let mut row = Self::read_row(stream.as_ref())?;
            if self.rename(&mut row).is_some() {
                self.row = Some(row);
                return Ok(true);
            }
        }
    }

    fn value(&self, index: usize) -> Result<Value, Error> {
        let row = self.row.as_ref().ok_or(Error::NoRow)?;
        row.get(index).cloned().ok_or(Error::ColumnIndex {
            index,
            count: row.len(),
        })
    }

    fn column_count(&self) -> usize {
        self.labels.len()
    }

    fn column_label(&self, index: usize) -> Result<&str, Error> {
        self.labels.label(index)
    }
}

fn tables_in(schema: &str) -> IndexMap<String, usize> {
    IndexMap::from([(format!("Tables_in_{}", schema), TABLE_COLUMN)])
}

/// `SHOW TABLES`: the table column is labeled `Tables_in_<logic schema>`
/// instead of the schema of whichever data source answered.
pub struct ShowTablesMergedResult {
    inner: LogicTablesMergedResult,
}

impl ShowTablesMergedResult {
    pub fn new(rule: Arc<ShardingRule>, streams: Vec<Box<dyn QueryResult>>) -> Result<Self, Error> {
        let overrides = tables_in(rule.logic_schema());
        Ok(Self {
            inner: LogicTablesMergedResult::new(streams, &overrides, Some(rule))?,
        })
    }

    /// Label the table column with a schema only known after
    /// the result was created.
    pub fn reset_column_label(&mut self, schema: &str) {
        self.inner.reset_label_map(&tables_in(schema));
    }
}

impl MergedResult for ShowTablesMergedResult {
    fn next(&mut self) -> Result<bool, Error> {
        self.inner.next()
    }

    fn value(&self, index: usize) -> Result<Value, Error> {
        self.inner.value(index)
    }

    fn column_count(&self) -> usize {
        self.inner.column_count()
    }

    fn column_label(&self, index: usize) -> Result<&str, Error> {
        self.inner.column_label(index)
    }
}

/// `SHOW CREATE TABLE`: logic table name in both the `Table`
/// column and the DDL.
pub struct ShowCreateTableMergedResult {
    inner: LogicTablesMergedResult,
}

const DDL_COLUMN: usize = 1;

impl ShowCreateTableMergedResult {
    pub fn new(rule: Arc<ShardingRule>, streams: Vec<Box<dyn QueryResult>>) -> Result<Self, Error> {
        let overrides = IndexMap::from([
            ("Table".to_string(), TABLE_COLUMN),
            ("Create Table".to_string(), DDL_COLUMN),
        ]);
        Ok(Self {
            inner: LogicTablesMergedResult::new(streams, &overrides, Some(rule))?,
        })
    }
}

impl MergedResult for ShowCreateTableMergedResult {
    fn next(&mut self) -> Result<bool, Error> {
        self.inner.next()
    }

    fn value(&self, index: usize) -> Result<Value, Error> {
        let value = self.inner.value(index)?;

        match (index, value, self.inner.renamed()) {
            (DDL_COLUMN, Value::Text(ddl), Some((actual, logic))) => {
                Ok(Value::Text(ddl.replacen(actual, logic, 1)))
            }
            (_, value, _) => Ok(value),
        }
    }

    fn column_count(&self) -> usize {
        self.inner.column_count()
    }

    fn column_label(&self, index: usize) -> Result<&str, Error> {
        self.inner.column_label(index)
    }
}

/// `SHOW DATABASES`: the logic schema is the only database.
pub struct ShowDatabasesMergedResult {
    schema: String,
    state: Cursor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Before,
    OnRow,
    After,
}

impl ShowDatabasesMergedResult {
    pub fn new(schema: impl ToString) -> Self {
        Self {
            schema: schema.to_string(),
            state: Cursor::Before,
        }
    }
}

impl MergedResult for ShowDatabasesMergedResult {
    fn next(&mut self) -> Result<bool, Error> {
        self.state = match self.state {
            Cursor::Before => Cursor::OnRow,
            _ => Cursor::After,
        };
        Ok(self.state == Cursor::OnRow)
    }

    fn value(&self, index: usize) -> Result<Value, Error> {
        if self.state != Cursor::OnRow {
            return Err(Error::NoRow);
        }
        match index {
            0 => Ok(Value::Text(self.schema.clone())),
            _ => Err(Error::ColumnIndex { index, count: 1 }),
        }
    }

    fn column_count(&self) -> usize {
        1
    }

    fn column_label(&self, index: usize) -> Result<&str, Error> {
        match index {
            0 => Ok("Database"),
            _ => Err(Error::ColumnIndex { index, count: 1 }),
        }
    }
}
