//! Pass-through merges.
use indexmap::IndexMap;

use super::{Error, LabelMap, MergedResult, QueryResult};
use crate::statement::Value;

/// Streams read one after the other, in route order.
pub struct IteratorStreamMergedResult {
    streams: Vec<Box<dyn QueryResult>>,
    position: usize,
    labels: LabelMap,
}

impl IteratorStreamMergedResult {
    pub fn new(streams: Vec<Box<dyn QueryResult>>) -> Result<Self, Error> {
        let labels = LabelMap::new(streams.first().map(|s| s.as_ref()), &IndexMap::new())?;
        Ok(Self {
            streams,
            position: 0,
            labels,
        })
    }

    fn current(&self) -> Result<&dyn QueryResult, Error> {
        self.streams
            .get(self.position)
            .map(|stream| stream.as_ref())
            .ok_or(Error::NoRow)
    }
}

impl MergedResult for IteratorStreamMergedResult {
    fn next(&mut self) -> Result<bool, Error> {
        while let Some(stream) = self.streams.get_mut(self.position) {
            if stream.next()? {
                return Ok(true);
            }
            self.position += 1;
        }

        Ok(false)
    }

    fn value(&self, index: usize) -> Result<Value, Error> {
        self.current()?.value(index).cloned()
    }

    fn column_count(&self) -> usize {
        self.labels.len()
    }

    fn column_label(&self, index: usize) -> Result<&str, Error> {
        self.labels.label(index)
    }
}

/// A single stream, exposed as is.
pub struct TransparentMergedResult {
    stream: Box<dyn QueryResult>,
}

impl TransparentMergedResult {
    pub fn new(stream: Box<dyn QueryResult>) -> Self {
        Self { stream }
    }
}

impl MergedResult for TransparentMergedResult {
    fn next(&mut self) -> Result<bool, Error> {
        self.stream.next()
    }

    fn value(&self, index: usize) -> Result<Value, Error> {
        self.stream.value(index).cloned()
    }

    fn column_count(&self) -> usize {
        self.stream.column_count()
    }

    fn column_label(&self, index: usize) -> Result<&str, Error> {
        self.stream.column_label(index)
    }
}
