//! Sharding values and conditions extracted from a statement.

pub mod condition;
pub mod value;

pub use condition::{ShardingCondition, ShardingConditions};
pub use value::ShardingValue;
