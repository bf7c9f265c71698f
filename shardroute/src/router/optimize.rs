//! Turn statement conditions into sharding conditions.
//!
//! Only predicates on sharding columns survive. Predicates on the
//! same column inside an AND group are intersected, and groups that
//! can't match anything are dropped.
use std::cmp::Ordering;
use std::ops::Bound;

use tracing::trace;

use super::generated_key::GeneratedKey;
use super::sharding::{ShardingCondition, ShardingConditions, ShardingValue};
use super::Error;
use crate::rule::ShardingRule;
use crate::statement::{AndCondition, Condition, ShardingOperator, Statement, Value};

type Range = (Bound<Value>, Bound<Value>);

/// Restriction on one column, while a group is being folded.
#[derive(Debug, Clone, PartialEq)]
enum Restriction {
    List(Vec<Value>),
    Range(Range),
}

pub fn optimize(
    rule: &ShardingRule,
    statement: &Statement,
    parameters: &[Value],
    generated_key: Option<&GeneratedKey>,
) -> Result<ShardingConditions, Error> {
    if statement.kind().is_insert() {
        insert(rule, statement, parameters, generated_key)
    } else {
        query(rule, statement, parameters)
    }
}

// One condition per inserted row.
fn insert(
    rule: &ShardingRule,
    statement: &Statement,
    parameters: &[Value],
    generated_key: Option<&GeneratedKey>,
) -> Result<ShardingConditions, Error> {
    let groups = statement.conditions().and_conditions();
    let rows = statement
        .insert()
        .map(|insert| insert.values)
        .unwrap_or_default()
        .max(groups.len());

    let generated = generated_key.filter(|key| rule.is_sharding_column(key.column()));
    if let Some(key) = generated {
        if key.values().len() != rows {
            return Err(Error::GeneratedKeyCount {
                keys: key.values().len(),
                rows,
            });
        }
    }

    let mut conditions = vec![];
    for row in 0..rows {
        let mut condition = ShardingCondition::default();

        if let Some(group) = groups.get(row) {
            for predicate in sharding_predicates(rule, group) {
                let values = resolve(predicate, parameters)?;
                condition.push(ShardingValue::list(
                    &predicate.column().table,
                    &predicate.column().name,
                    values,
                ));
            }
        }

        if let Some(key) = generated {
            condition.push(ShardingValue::list(
                &key.column().table,
                &key.column().name,
                vec![Value::Integer(key.values()[row])],
            ));
        }

        conditions.push(condition);
    }

    if conditions.iter().all(|c| c.values().is_empty()) {
        return Ok(ShardingConditions::default());
    }

    Ok(ShardingConditions::new(conditions))
}

fn query(
    rule: &ShardingRule,
    statement: &Statement,
    parameters: &[Value],
) -> Result<ShardingConditions, Error> {
    // Sub-query groups are routed together with the outer ones.
    let groups = statement.and_conditions();

    let sharded = groups
        .iter()
        .any(|group| sharding_predicates(rule, group).next().is_some());
    if !sharded {
        return Ok(ShardingConditions::default());
    }

    let mut conditions = vec![];
    for group in groups {
        if let Some(condition) = fold(rule, group, parameters)? {
            conditions.push(condition);
        } else {
            trace!("dropping always false condition group: {:?}", group);
        }
    }

    if conditions.is_empty() {
        Ok(ShardingConditions::always_false())
    } else {
        Ok(ShardingConditions::new(conditions))
    }
}

fn sharding_predicates<'a>(
    rule: &'a ShardingRule,
    group: &'a AndCondition,
) -> impl Iterator<Item = &'a Condition> + 'a {
    group
        .conditions()
        .iter()
        .filter(move |predicate| rule.is_sharding_column(predicate.column()))
}

// Fold one AND group, `None` if it can never match.
fn fold(
    rule: &ShardingRule,
    group: &AndCondition,
    parameters: &[Value],
) -> Result<Option<ShardingCondition>, Error> {
    // Column order follows first appearance.
    let mut columns: Vec<(&str, &str, Restriction)> = vec![];

    for predicate in sharding_predicates(rule, group) {
        let column = predicate.column();
        let restriction = restriction(predicate, parameters)?;

        let existing = columns.iter_mut().find(|(table, name, _)| {
            table.eq_ignore_ascii_case(&column.table) && name.eq_ignore_ascii_case(&column.name)
        });

        match existing {
            Some((_, _, current)) => {
                *current = intersect(&column.name, current, &restriction)?;
            }
            None => columns.push((column.table.as_str(), column.name.as_str(), restriction)),
        }
    }

    let mut condition = ShardingCondition::default();
    for (table, column, restriction) in columns {
        match restriction {
            Restriction::List(values) if values.is_empty() => return Ok(None),
            Restriction::List(values) => condition.push(ShardingValue::list(table, column, values)),
            Restriction::Range(range) => {
                if is_empty_range(column, &range)? {
                    return Ok(None);
                }
                condition.push(ShardingValue::range(table, column, range))
            }
        }
    }

    Ok(Some(condition))
}

fn resolve(predicate: &Condition, parameters: &[Value]) -> Result<Vec<Value>, Error> {
    let mut values = vec![];
    for value in predicate.values() {
        let resolved = value.resolve(parameters).ok_or_else(|| {
            crate::statement::Error::MissingParameter(value.parameter().unwrap_or_default())
        })?;
        values.push(resolved.clone());
    }
    Ok(values)
}

fn restriction(predicate: &Condition, parameters: &[Value]) -> Result<Restriction, Error> {
    let values = resolve(predicate, parameters)?;
    let arity = |expected: usize| -> Result<(), Error> {
        if values.len() == expected {
            Ok(())
        } else {
            Err(Error::ConditionArity {
                column: predicate.column().name.clone(),
                operator: predicate.operator(),
                expected,
                got: values.len(),
            })
        }
    };

    Ok(match predicate.operator() {
        ShardingOperator::Equal | ShardingOperator::In => {
            if values.is_empty() {
                arity(1)?;
            }
            // NULL never equals anything.
            let mut list: Vec<Value> = vec![];
            for value in values.iter().filter(|value| !value.is_null()) {
                if !list.contains(value) {
                    list.push(value.clone());
                }
            }
            Restriction::List(list)
        }
        ShardingOperator::Between => {
            arity(2)?;
            Restriction::Range((
                Bound::Included(values[0].clone()),
                Bound::Included(values[1].clone()),
            ))
        }
        ShardingOperator::LessThan => {
            arity(1)?;
            Restriction::Range((Bound::Unbounded, Bound::Excluded(values[0].clone())))
        }
        ShardingOperator::LessThanOrEqual => {
            arity(1)?;
            Restriction::Range((Bound::Unbounded, Bound::Included(values[0].clone())))
        }
        ShardingOperator::GreaterThan => {
            arity(1)?;
            Restriction::Range((Bound::Excluded(values[0].clone()), Bound::Unbounded))
        }
        ShardingOperator::GreaterThanOrEqual => {
            arity(1)?;
            Restriction::Range((Bound::Included(values[0].clone()), Bound::Unbounded))
        }
    })
}

fn compare(column: &str, left: &Value, right: &Value) -> Result<Ordering, Error> {
    left.compare(right)
        .ok_or_else(|| Error::ShardingValueType {
            column: column.to_string(),
            left: left.to_string(),
            right: right.to_string(),
        })
}

fn intersect(column: &str, left: &Restriction, right: &Restriction) -> Result<Restriction, Error> {
    Ok(match (left, right) {
        (Restriction::List(left), Restriction::List(right)) => {
            let mut values = vec![];
            for value in left {
                for other in right {
                    if compare(column, value, other)? == Ordering::Equal {
                        values.push(value.clone());
                        break;
                    }
                }
            }
            Restriction::List(values)
        }

        (Restriction::List(values), Restriction::Range(range))
        | (Restriction::Range(range), Restriction::List(values)) => {
            let mut kept = vec![];
            for value in values {
                if in_range(column, value, range)? {
                    kept.push(value.clone());
                }
            }
            Restriction::List(kept)
        }

        (Restriction::Range(left), Restriction::Range(right)) => Restriction::Range((
            tighter(column, &left.0, &right.0, Ordering::Greater)?,
            tighter(column, &left.1, &right.1, Ordering::Less)?,
        )),
    })
}

// Pick the bound further in the `direction` of the range's inside.
fn tighter(
    column: &str,
    left: &Bound<Value>,
    right: &Bound<Value>,
    direction: Ordering,
) -> Result<Bound<Value>, Error> {
    Ok(match (left, right) {
        (Bound::Unbounded, bound) | (bound, Bound::Unbounded) => bound.clone(),
        (
            Bound::Included(l) | Bound::Excluded(l),
            Bound::Included(r) | Bound::Excluded(r),
        ) => match compare(column, l, r)? {
            Ordering::Equal => {
                // Exclusive wins on ties.
                if matches!(left, Bound::Excluded(_)) {
                    left.clone()
                } else {
                    right.clone()
                }
            }
            ordering if ordering == direction => left.clone(),
            _ => right.clone(),
        },
    })
}

fn in_range(column: &str, value: &Value, range: &Range) -> Result<bool, Error> {
    let above = match &range.0 {
        Bound::Unbounded => true,
        Bound::Included(start) => compare(column, value, start)? != Ordering::Less,
        Bound::Excluded(start) => compare(column, value, start)? == Ordering::Greater,
    };
    let below = match &range.1 {
        Bound::Unbounded => true,
        Bound::Included(end) => compare(column, value, end)? != Ordering::Greater,
        Bound::Excluded(end) => compare(column, value, end)? == Ordering::Less,
    };
    Ok(above && below)
}

fn is_empty_range(column: &str, range: &Range) -> Result<bool, Error> {
    Ok(match range {
        (Bound::Included(start), Bound::Included(end)) => {
            compare(column, start, end)? == Ordering::Greater
        }
        (Bound::Included(start) | Bound::Excluded(start), Bound::Included(end) | Bound::Excluded(end)) => {
            compare(column, start, end)? != Ordering::Less
        }
        _ => false,
    })
}
