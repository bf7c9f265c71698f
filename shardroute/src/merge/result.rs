//! Result stream of one route unit.
use std::collections::VecDeque;

use super::Error;
use crate::statement::Value;

/// Forward-only cursor over the rows returned by one data source.
pub trait QueryResult {
    /// Advance to the next row. Returns false when the stream is exhausted.
    fn next(&mut self) -> Result<bool, Error>;

    /// Value of the current row, 0-based.
    fn value(&self, index: usize) -> Result<&Value, Error>;

    fn column_count(&self) -> usize;

    fn column_label(&self, index: usize) -> Result<&str, Error>;
}

/// Rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryQueryResult {
    labels: Vec<String>,
    rows: VecDeque<Vec<Value>>,
    current: Option<Vec<Value>>,
    failure: Option<String>,
}

impl MemoryQueryResult {
    pub fn new(labels: &[&str], rows: Vec<Vec<Value>>) -> Self {
        Self {
            labels: labels.iter().map(|label| label.to_string()).collect(),
            rows: rows.into(),
            current: None,
            failure: None,
        }
    }

    /// Fail with this message once the rows run out.
    pub fn fail_with(mut self, message: impl ToString) -> Self {
        self.failure = Some(message.to_string());
        self
    }
}

impl QueryResult for MemoryQueryResult {
    fn next(&mut self) -> Result<bool, Error> {
        self.current = self.rows.pop_front();

        if self.current.is_none() {
            if let Some(message) = self.failure.take() {
                return Err(Error::Stream(message.into()));
            }
        }

        Ok(self.current.is_some())
    }

    fn value(&self, index: usize) -> Result<&Value, Error> {
        let row = self.current.as_ref().ok_or(Error::NoRow)?;
        row.get(index).ok_or(Error::ColumnIndex {
            index,
            count: row.len(),
        })
    }

    fn column_count(&self) -> usize {
        self.labels.len()
    }

    fn column_label(&self, index: usize) -> Result<&str, Error> {
        self.labels
            .get(index)
            .map(|label| label.as_str())
            .ok_or(Error::ColumnIndex {
                index,
                count: self.labels.len(),
            })
    }
}
