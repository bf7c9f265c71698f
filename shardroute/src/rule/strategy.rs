//! Sharding algorithms: pick targets (data sources or actual tables)
//! for the values of one sharding column.
use std::collections::HashMap;
use std::hash::Hasher;
use std::ops::Bound;

use fnv::FnvHasher;
use shardroute_config::{Algorithm, FlexibleType, ShardingStrategy as StrategyConfig};
use tracing::trace;
use uuid::Uuid;

use super::Error;
use crate::router::sharding::ShardingValue;
use crate::statement::Value;

/// Range mapping, `[start, end)`.
#[derive(Debug, Clone, PartialEq)]
struct RangeMapping {
    start: Option<FlexibleType>,
    end: Option<FlexibleType>,
    target: String,
}

impl RangeMapping {
    fn contains(&self, value: &Value) -> bool {
        let after_start = match (&self.start, value) {
            (None, _) => true,
            (Some(FlexibleType::Integer(start)), Value::Integer(value)) => value >= start,
            (Some(FlexibleType::String(start)), Value::Text(value)) => value >= start,
            _ => false,
        };
        let before_end = match (&self.end, value) {
            (None, _) => true,
            (Some(FlexibleType::Integer(end)), Value::Integer(value)) => value < end,
            (Some(FlexibleType::String(end)), Value::Text(value)) => value < end,
            _ => false,
        };
        after_start && before_end
    }

    // Integer ranges only, inclusive on both ends.
    fn overlaps(&self, low: i64, high: i64) -> bool {
        let start = match self.start {
            None => i64::MIN,
            Some(FlexibleType::Integer(start)) => start,
            Some(_) => return false,
        };
        let end = match self.end {
            None => i64::MAX,
            Some(FlexibleType::Integer(end)) => end,
            Some(_) => return false,
        };
        low < end && high >= start
    }
}

/// Sharding strategy of one table, for databases or tables.
#[derive(Debug, Clone, PartialEq)]
pub struct ShardingStrategy {
    column: String,
    algorithm: Algorithm,
    lists: HashMap<FlexibleType, String>,
    ranges: Vec<RangeMapping>,
}

impl ShardingStrategy {
    pub fn new(config: &StrategyConfig) -> Self {
        let mut lists = HashMap::new();
        let mut ranges = vec![];

        for mapping in &config.mappings {
            for value in &mapping.values {
                lists.insert(value.clone(), mapping.target.clone());
            }
            if mapping.start.is_some() || mapping.end.is_some() {
                ranges.push(RangeMapping {
                    start: mapping.start.clone(),
                    end: mapping.end.clone(),
                    target: mapping.target.clone(),
                });
            }
        }

        Self {
            column: config.column.clone(),
            algorithm: config.algorithm,
            lists,
            ranges,
        }
    }

    /// Sharding column.
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Pick targets for `value`. Without a value every target
    /// is selected. The output keeps the order of `targets`.
    pub fn shard<'a>(
        &self,
        targets: &[&'a str],
        value: Option<&ShardingValue>,
    ) -> Result<Vec<&'a str>, Error> {
        let selected = match value {
            None => return Ok(targets.to_vec()),
            Some(ShardingValue::List { values, .. }) => {
                let mut selected = vec![];
                for value in values {
                    match self.shard_value(targets, value)? {
                        Some(target) => selected.push(target),
                        None => return Ok(targets.to_vec()),
                    }
                }
                selected
            }
            Some(ShardingValue::Range { range, .. }) => match self.shard_range(targets, range) {
                Some(selected) => selected,
                None => return Ok(targets.to_vec()),
            },
        };

        let result = targets
            .iter()
            .filter(|target| selected.iter().any(|s| s.eq_ignore_ascii_case(target)))
            .copied()
            .collect::<Vec<_>>();

        trace!(
            "{:?} sharding on \"{}\" selected {:?}",
            self.algorithm,
            self.column,
            result
        );

        Ok(result)
    }

    // Target for one value, `None` selects everything.
    fn shard_value<'a>(&'a self, targets: &[&'a str], value: &Value) -> Result<Option<&'a str>, Error> {
        if targets.is_empty() {
            return Ok(None);
        }

        Ok(match self.algorithm {
            Algorithm::Hash => {
                let mut hasher = FnvHasher::default();
                hasher.write(value.to_string().as_bytes());
                let index = hasher.finish() % targets.len() as u64;
                Some(targets[index as usize])
            }

            Algorithm::Mod => {
                let integer = value
                    .as_i64()
                    .ok_or_else(|| Error::ModRequiresInteger(value.to_string()))?;
                let index = integer.rem_euclid(targets.len() as i64);
                Some(targets[index as usize])
            }

            Algorithm::List => flexible(value)
                .and_then(|key| self.lists.get(&key))
                .map(|target| target.as_str()),

            Algorithm::Range => self
                .ranges
                .iter()
                .find(|range| range.contains(value))
                .map(|range| range.target.as_str()),
        })
    }

    // Targets for a range of values, `None` selects everything.
    fn shard_range<'a>(
        &'a self,
        targets: &[&'a str],
        range: &(Bound<Value>, Bound<Value>),
    ) -> Option<Vec<&'a str>> {
        let (low, high) = integer_range(range)?;

        match self.algorithm {
            Algorithm::Mod => {
                if low > high {
                    return Some(vec![]);
                }
                let span = (high as i128) - (low as i128) + 1;
                if span >= targets.len() as i128 {
                    return None;
                }
                let mut selected = vec![];
                for value in low..=high {
                    let index = value.rem_euclid(targets.len() as i64);
                    selected.push(targets[index as usize]);
                }
                Some(selected)
            }

            Algorithm::Range => {
                let selected = self
                    .ranges
                    .iter()
                    .filter(|mapping| mapping.overlaps(low, high))
                    .map(|mapping| mapping.target.as_str())
                    .collect::<Vec<_>>();
                if selected.is_empty() {
                    None
                } else {
                    Some(selected)
                }
            }

            Algorithm::Hash | Algorithm::List => None,
        }
    }
}

// Inclusive integer bounds of a range.
fn integer_range(range: &(Bound<Value>, Bound<Value>)) -> Option<(i64, i64)> {
    let low = match &range.0 {
        Bound::Unbounded => i64::MIN,
        Bound::Included(value) => value.as_i64()?,
        Bound::Excluded(value) => value.as_i64()?.checked_add(1)?,
    };
    let high = match &range.1 {
        Bound::Unbounded => i64::MAX,
        Bound::Included(value) => value.as_i64()?,
        Bound::Excluded(value) => value.as_i64()?.checked_sub(1)?,
    };
    Some((low, high))
}

// Config key for a value: integer, then UUID, then string.
fn flexible(value: &Value) -> Option<FlexibleType> {
    match value {
        Value::Null => None,
        Value::Integer(integer) => Some(FlexibleType::Integer(*integer)),
        Value::Text(text) => {
            if let Ok(integer) = text.parse::<i64>() {
                Some(FlexibleType::Integer(integer))
            } else if let Ok(uuid) = text.parse::<Uuid>() {
                Some(FlexibleType::Uuid(uuid))
            } else {
                Some(FlexibleType::String(text.clone()))
            }
        }
    }
}
