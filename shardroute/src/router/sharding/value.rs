use std::ops::Bound;

use serde::Serialize;

use crate::statement::Value;

/// Values one sharding column is restricted to, inside one AND group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShardingValue {
    /// `=` and `IN`.
    List {
        logic_table: String,
        column: String,
        values: Vec<Value>,
    },
    /// `BETWEEN`, `<`, `>` and friends.
    Range {
        logic_table: String,
        column: String,
        #[serde(serialize_with = "serialize_range")]
        range: (Bound<Value>, Bound<Value>),
    },
}

impl ShardingValue {
    pub fn list(logic_table: impl ToString, column: impl ToString, values: Vec<Value>) -> Self {
        Self::List {
            logic_table: logic_table.to_string(),
            column: column.to_string(),
            values,
        }
    }

    pub fn range(
        logic_table: impl ToString,
        column: impl ToString,
        range: (Bound<Value>, Bound<Value>),
    ) -> Self {
        Self::Range {
            logic_table: logic_table.to_string(),
            column: column.to_string(),
            range,
        }
    }

    pub fn logic_table(&self) -> &str {
        match self {
            Self::List { logic_table, .. } | Self::Range { logic_table, .. } => logic_table,
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Self::List { column, .. } | Self::Range { column, .. } => column,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List { .. })
    }

    /// Listed values, `None` for ranges.
    pub fn values(&self) -> Option<&[Value]> {
        match self {
            Self::List { values, .. } => Some(values),
            Self::Range { .. } => None,
        }
    }

    /// Same table and column, ignoring case.
    pub fn is_for(&self, logic_table: &str, column: &str) -> bool {
        self.logic_table().eq_ignore_ascii_case(logic_table)
            && self.column().eq_ignore_ascii_case(column)
    }
}

fn serialize_range<S: serde::Serializer>(
    range: &(Bound<Value>, Bound<Value>),
    serializer: S,
) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    #[serde(rename_all = "snake_case")]
    enum Edge<'a> {
        Included(&'a Value),
        Excluded(&'a Value),
        Unbounded,
    }

    fn edge(bound: &Bound<Value>) -> Edge<'_> {
        match bound {
            Bound::Included(value) => Edge::Included(value),
            Bound::Excluded(value) => Edge::Excluded(value),
            Bound::Unbounded => Edge::Unbounded,
        }
    }

    (edge(&range.0), edge(&range.1)).serialize(serializer)
}
