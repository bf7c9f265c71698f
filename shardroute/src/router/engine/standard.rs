use tracing::trace;

use super::super::result::{RoutingResult, TableUnit};
use super::super::sharding::{ShardingCondition, ShardingConditions};
use super::super::Error;
use crate::rule::{ShardingRule, TableRule};

/// Route one table (and implicitly its binding group) with its
/// database and table strategies.
pub fn route(
    rule: &ShardingRule,
    logic_table: &str,
    conditions: &ShardingConditions,
) -> Result<RoutingResult, Error> {
    let table_rule = rule.table_rule(logic_table)?;
    let mut result = RoutingResult::default();

    if conditions.is_empty() {
        route_condition(rule, &table_rule, None, &mut result)?;
    } else {
        for condition in conditions.conditions().iter().enumerate() {
            route_condition(rule, &table_rule, Some(condition), &mut result)?;
        }
    }

    Ok(result)
}

fn route_condition(
    rule: &ShardingRule,
    table_rule: &TableRule,
    condition: Option<(usize, &ShardingCondition)>,
    result: &mut RoutingResult,
) -> Result<(), Error> {
    let logic_table = table_rule.logic_table();
    let value = |column: &str| {
        condition.and_then(|(_, condition)| condition.value_for(rule, logic_table, column))
    };

    let data_sources = table_rule.data_source_names();
    let data_sources = match table_rule.database_strategy() {
        Some(strategy) => strategy.shard(&data_sources, value(strategy.column()))?,
        None => data_sources,
    };

    for data_source in data_sources {
        let tables = table_rule.actual_tables_in(data_source);
        let tables = match table_rule.table_strategy() {
            Some(strategy) => strategy.shard(&tables, value(strategy.column()))?,
            None => tables,
        };

        trace!(
            "\"{}\" routed to {} tables in \"{}\"",
            logic_table,
            tables.len(),
            data_source
        );

        for table in tables {
            let unit = TableUnit::table(data_source, logic_table, table);
            match condition {
                Some((index, _)) => result.push_condition(unit, index),
                None => result.push(unit),
            }
        }
    }

    Ok(())
}
