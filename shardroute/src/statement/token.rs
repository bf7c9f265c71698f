use serde::{Deserialize, Serialize};

/// Position of a rewritable fragment in the logic SQL,
/// as reported by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SqlToken {
    /// Table identifier, possibly quoted.
    Table { begin: usize, original: String },
    /// Literal LIMIT offset.
    Offset { begin: usize, original: String },
    /// Literal LIMIT row count.
    RowCount { begin: usize, original: String },
    /// Column list of an INSERT, parentheses included.
    InsertColumns { begin: usize, original: String },
    /// One row of an INSERT's VALUES, parentheses included. Rows are
    /// reported in order, and the placeholders of a row follow those
    /// of the rows before it, starting at the first parameter.
    InsertValues {
        begin: usize,
        original: String,
        #[serde(default)]
        parameters: usize,
    },
}

impl SqlToken {
    pub fn table(begin: usize, original: impl ToString) -> Self {
        Self::Table {
            begin,
            original: original.to_string(),
        }
    }

    pub fn insert_columns(begin: usize, original: impl ToString) -> Self {
        Self::InsertColumns {
            begin,
            original: original.to_string(),
        }
    }

    pub fn insert_values(begin: usize, original: impl ToString, parameters: usize) -> Self {
        Self::InsertValues {
            begin,
            original: original.to_string(),
            parameters,
        }
    }

    pub fn begin(&self) -> usize {
        match self {
            Self::Table { begin, .. }
            | Self::Offset { begin, .. }
            | Self::RowCount { begin, .. }
            | Self::InsertColumns { begin, .. }
            | Self::InsertValues { begin, .. } => *begin,
        }
    }

    pub fn original(&self) -> &str {
        match self {
            Self::Table { original, .. }
            | Self::Offset { original, .. }
            | Self::RowCount { original, .. }
            | Self::InsertColumns { original, .. }
            | Self::InsertValues { original, .. } => original,
        }
    }

    /// Byte offset right after the token, `None` if it doesn't fit
    /// in an offset at all.
    pub fn end(&self) -> Option<usize> {
        self.begin().checked_add(self.original().len())
    }
}

/// Strip identifier quotes: `"t_order"`, `` `t_order` ``, `[t_order]`.
pub fn unquote(identifier: &str) -> &str {
    let bytes = identifier.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if matches!((first, last), (b'"', b'"') | (b'`', b'`') | (b'[', b']')) {
            return &identifier[1..identifier.len() - 1];
        }
    }
    identifier
}
