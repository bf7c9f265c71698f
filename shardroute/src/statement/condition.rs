use serde::{Deserialize, Serialize};

use super::{Column, ConditionValue};

/// Comparison operators that can narrow down a sharding value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShardingOperator {
    Equal,
    In,
    Between,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

/// Predicate on one column, e.g. `order_id = ?`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    column: Column,
    operator: ShardingOperator,
    values: Vec<ConditionValue>,
}

impl Condition {
    pub fn new(column: Column, operator: ShardingOperator, values: Vec<ConditionValue>) -> Self {
        Self {
            column,
            operator,
            values,
        }
    }

    /// `column = value`
    pub fn equal(column: Column, value: impl Into<ConditionValue>) -> Self {
        Self::new(column, ShardingOperator::Equal, vec![value.into()])
    }

    /// `column IN (values)`
    pub fn in_list(column: Column, values: Vec<ConditionValue>) -> Self {
        Self::new(column, ShardingOperator::In, values)
    }

    /// `column BETWEEN low AND high`
    pub fn between(
        column: Column,
        low: impl Into<ConditionValue>,
        high: impl Into<ConditionValue>,
    ) -> Self {
        Self::new(
            column,
            ShardingOperator::Between,
            vec![low.into(), high.into()],
        )
    }

    pub fn column(&self) -> &Column {
        &self.column
    }

    pub fn operator(&self) -> ShardingOperator {
        self.operator
    }

    pub fn values(&self) -> &[ConditionValue] {
        &self.values
    }
}

/// Predicates joined with AND.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AndCondition {
    #[serde(default)]
    conditions: Vec<Condition>,
}

impl AndCondition {
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

impl From<Vec<Condition>> for AndCondition {
    fn from(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }
}

/// AND groups joined with OR. For inserts, one group per row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrCondition {
    #[serde(default)]
    and_conditions: Vec<AndCondition>,
}

impl OrCondition {
    pub fn and_conditions(&self) -> &[AndCondition] {
        &self.and_conditions
    }

    pub fn is_empty(&self) -> bool {
        self.and_conditions.is_empty()
    }

    /// Every predicate in every group.
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.and_conditions
            .iter()
            .flat_map(|group| group.conditions.iter())
    }
}

impl From<Vec<AndCondition>> for OrCondition {
    fn from(and_conditions: Vec<AndCondition>) -> Self {
        Self { and_conditions }
    }
}

impl From<Vec<Condition>> for OrCondition {
    fn from(conditions: Vec<Condition>) -> Self {
        Self {
            and_conditions: vec![AndCondition::from(conditions)],
        }
    }
}
