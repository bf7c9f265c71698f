//! Parsed statement, as handed to the router by the SQL parser.
//!
//! The router never looks at SQL text. Everything it needs to make a
//! routing decision is extracted by the parser into a [`Statement`].

pub mod condition;
pub mod kind;
pub mod limit;
pub mod token;
pub mod value;

pub use condition::{AndCondition, Condition, OrCondition, ShardingOperator};
pub use kind::StatementKind;
pub use limit::{Limit, RevisedLimit};
pub use token::SqlToken;
pub use value::{ConditionValue, Value};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing parameter: ${0}")]
    MissingParameter(usize),

    #[error("value \"{0}\" is not an integer")]
    NotNumeric(String),
}

/// Table referenced by a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
}

impl From<&str> for Table {
    fn from(name: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: None,
        }
    }
}

/// Column, qualified by its logic table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub table: String,
}

impl Column {
    pub fn new(name: impl ToString, table: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
        }
    }
}

/// Key column value supplied by an INSERT row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedKeyCondition {
    pub column: Column,
    pub value: ConditionValue,
}

/// INSERT specifics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Insert {
    /// Position of the generated key column in the column list,
    /// if the statement names it.
    #[serde(default)]
    pub generate_key_column_index: Option<usize>,
    /// One entry per row, if the key column is named.
    #[serde(default)]
    pub generated_key_conditions: Vec<GeneratedKeyCondition>,
    /// Number of rows in VALUES.
    #[serde(default)]
    pub values: usize,
}

/// Parsed statement.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Builder)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct Statement {
    kind: StatementKind,
    tables: Vec<Table>,
    conditions: OrCondition,
    /// Nested SELECTs, each with its own tables and conditions.
    /// Their tokens are reported with the outer statement's, as offsets
    /// into the full SQL.
    sub_queries: Vec<Statement>,
    insert: Option<Insert>,
    limit: Option<Limit>,
    group_by: Vec<String>,
    order_by: Vec<String>,
    has_aggregation: bool,
    tokens: Vec<SqlToken>,
}

impl Statement {
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Distinct table names, in the order they first appear. Tables of
    /// sub-queries follow the statement's own.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names = HashSet::new();
        let mut result = vec![];
        self.collect_table_names(&mut names, &mut result);
        result
    }

    fn collect_table_names<'a>(&'a self, seen: &mut HashSet<String>, result: &mut Vec<&'a str>) {
        for table in &self.tables {
            if seen.insert(table.name.to_lowercase()) {
                result.push(table.name.as_str());
            }
        }
        for sub_query in &self.sub_queries {
            sub_query.collect_table_names(seen, result);
        }
    }

    /// The only table of a single-table statement, e.g. an INSERT.
    pub fn single_table_name(&self) -> Option<&str> {
        match self.table_names().as_slice() {
            [name] => Some(*name),
            _ => None,
        }
    }

    pub fn conditions(&self) -> &OrCondition {
        &self.conditions
    }

    pub fn sub_queries(&self) -> &[Statement] {
        &self.sub_queries
    }

    /// AND groups of the statement followed by those of its
    /// sub-queries, depth first.
    pub fn and_conditions(&self) -> Vec<&AndCondition> {
        let mut groups = self.conditions.and_conditions().iter().collect::<Vec<_>>();
        for sub_query in &self.sub_queries {
            groups.extend(sub_query.and_conditions());
        }
        groups
    }

    pub fn insert(&self) -> Option<&Insert> {
        self.insert.as_ref()
    }

    pub fn limit(&self) -> Option<&Limit> {
        self.limit.as_ref()
    }

    pub fn tokens(&self) -> &[SqlToken] {
        &self.tokens
    }

    /// Rows can't be trimmed on the shards because they are grouped
    /// or aggregated in a different order than they are sorted.
    pub fn fetch_all(&self) -> bool {
        (!self.group_by.is_empty() || self.has_aggregation) && self.group_by != self.order_by
    }
}
