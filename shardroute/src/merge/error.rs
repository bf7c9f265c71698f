//! Merge errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("column index {index} is out of range, result has {count} columns")]
    ColumnIndex { index: usize, count: usize },

    #[error("column \"{0}\" not found")]
    ColumnLabel(String),

    #[error("cursor is not positioned on a row")]
    NoRow,

    #[error("no result streams to merge")]
    NoStreams,

    /// Raised by the underlying result stream.
    #[error(transparent)]
    Stream(Box<dyn std::error::Error + Send + Sync>),
}
