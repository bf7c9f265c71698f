use thiserror::Error;

use super::rewrite;
use crate::rule;
use crate::statement::{self, ShardingOperator};

#[derive(Debug, Error)]
pub enum Error {
    #[error("must have sharding column with subquery")]
    SubqueryWithoutShardingColumn,

    #[error("only support sharding by '=' with subquery")]
    SubqueryNotEqual,

    #[error("sharding value must be same with subquery")]
    SubqueryShardingValueMismatch,

    #[error("generated key count {keys} doesn't match inserted row count {rows}")]
    GeneratedKeyCount { keys: usize, rows: usize },

    #[error("generated key \"{0}\" is not an integer")]
    GeneratedKeyNotNumeric(String),

    #[error("sharding values of \"{column}\" can't be compared: {left} and {right}")]
    ShardingValueType {
        column: String,
        left: String,
        right: String,
    },

    #[error("operator {operator:?} on \"{column}\" expects {expected} values, got {got}")]
    ConditionArity {
        column: String,
        operator: ShardingOperator,
        expected: usize,
        got: usize,
    },

    #[error("cartesian product of {tables:?} has {size} routes, maximum is {max}")]
    CartesianProductTooLarge {
        tables: Vec<String>,
        size: usize,
        max: usize,
    },

    #[error("no data sources configured")]
    NoDataSource,

    #[error("{0}")]
    Rule(#[from] rule::Error),

    #[error("{0}")]
    Statement(#[from] statement::Error),

    #[error("{0}")]
    Rewrite(#[from] rewrite::Error),
}
