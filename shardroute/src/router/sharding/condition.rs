use std::collections::HashSet;

use serde::Serialize;

use super::ShardingValue;
use crate::rule::ShardingRule;

/// Sharding values of one AND group.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ShardingCondition {
    values: Vec<ShardingValue>,
}

impl ShardingCondition {
    pub fn new(values: Vec<ShardingValue>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[ShardingValue] {
        &self.values
    }

    pub fn push(&mut self, value: ShardingValue) {
        self.values.push(value);
    }

    /// Every value is a list.
    pub fn is_list(&self) -> bool {
        self.values.iter().all(|value| value.is_list())
    }

    /// Sharding value of a column, looking through the binding group
    /// of `logic_table` when the table itself has none.
    pub fn value_for(
        &self,
        rule: &ShardingRule,
        logic_table: &str,
        column: &str,
    ) -> Option<&ShardingValue> {
        self.values
            .iter()
            .find(|value| value.is_for(logic_table, column))
            .or_else(|| {
                self.values.iter().find(|value| {
                    value.column().eq_ignore_ascii_case(column)
                        && rule.is_binding_related(logic_table, value.logic_table())
                })
            })
    }

    /// Both conditions restrict the same columns, position by position,
    /// to the same values. Tables match when they are bound together.
    /// Returns `None` if either condition holds a range.
    pub fn is_same(&self, other: &ShardingCondition, rule: &ShardingRule) -> Option<bool> {
        if self.values.len() != other.values.len() {
            return Some(false);
        }

        for (first, second) in self.values.iter().zip(other.values.iter()) {
            let (Some(first_values), Some(second_values)) = (first.values(), second.values())
            else {
                return None;
            };

            let same_table = rule.is_binding_related(first.logic_table(), second.logic_table());
            let same_column = first.column().eq_ignore_ascii_case(second.column());
            let same_values = first_values.iter().collect::<HashSet<_>>()
                == second_values.iter().collect::<HashSet<_>>();

            if !(same_table && same_column && same_values) {
                return Some(false);
            }
        }

        Some(true)
    }
}

impl From<Vec<ShardingValue>> for ShardingCondition {
    fn from(values: Vec<ShardingValue>) -> Self {
        Self::new(values)
    }
}

/// Output of the optimizer.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ShardingConditions {
    conditions: Vec<ShardingCondition>,
    always_false: bool,
}

impl ShardingConditions {
    pub fn new(conditions: Vec<ShardingCondition>) -> Self {
        Self {
            conditions,
            always_false: false,
        }
    }

    /// The statement's conditions can never be satisfied.
    pub fn always_false() -> Self {
        Self {
            conditions: vec![],
            always_false: true,
        }
    }

    pub fn conditions(&self) -> &[ShardingCondition] {
        &self.conditions
    }

    pub fn is_always_false(&self) -> bool {
        self.always_false
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Keep only the first condition.
    pub fn collapse_to_first(&mut self) {
        self.conditions.truncate(1);
    }
}
