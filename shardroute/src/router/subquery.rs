//! Statements with sub-queries can only be routed when every query
//! level lands on the same shard. That's guaranteed only when all
//! of them are restricted by equality to the same sharding values.
use super::sharding::ShardingConditions;
use super::Error;
use crate::rule::ShardingRule;
use crate::statement::{ShardingOperator, Statement};

pub fn reconcile(
    rule: &ShardingRule,
    statement: &Statement,
    conditions: &mut ShardingConditions,
) -> Result<(), Error> {
    if statement.sub_queries().is_empty() || statement.tables().is_empty() {
        return Ok(());
    }

    if conditions.is_empty() && !conditions.is_always_false() {
        return Err(Error::SubqueryWithoutShardingColumn);
    }

    if statement
        .and_conditions()
        .into_iter()
        .flat_map(|group| group.conditions())
        .filter(|condition| rule.is_sharding_column(condition.column()))
        .any(|condition| condition.operator() != ShardingOperator::Equal)
    {
        return Err(Error::SubqueryNotEqual);
    }

    // Unicast takes care of it.
    if conditions.is_always_false() {
        return Ok(());
    }

    let first = &conditions.conditions()[0];
    if !first.is_list() {
        return Err(Error::SubqueryNotEqual);
    }

    for condition in conditions.conditions() {
        match first.is_same(condition, rule) {
            Some(true) => (),
            Some(false) => return Err(Error::SubqueryShardingValueMismatch),
            None => return Err(Error::SubqueryNotEqual),
        }
    }

    conditions.collapse_to_first();

    Ok(())
}
