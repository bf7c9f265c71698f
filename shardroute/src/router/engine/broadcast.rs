//! Broadcast routing: databases, tables and instances.
use std::collections::HashSet;

use super::super::result::{RoutingResult, TableUnit};
use super::super::Error;
use crate::rule::ShardingRule;

/// One unit per data source.
pub fn database(rule: &ShardingRule) -> RoutingResult {
    rule.data_source_names()
        .into_iter()
        .map(TableUnit::database)
        .collect()
}

/// One unit per data node of each table.
pub fn table(rule: &ShardingRule, table_names: &[&str]) -> Result<RoutingResult, Error> {
    if table_names.is_empty() {
        return Ok(database(rule));
    }

    let mut result = RoutingResult::default();
    for table in table_names {
        let table_rule = rule.table_rule(table)?;
        for node in table_rule.data_nodes() {
            result.push(TableUnit::table(
                &node.data_source,
                table_rule.logic_table(),
                &node.table,
            ));
        }
    }

    Ok(result)
}

/// One unit per physical instance, using the first data source
/// found on each.
pub fn instance(rule: &ShardingRule) -> RoutingResult {
    let mut instances = HashSet::new();
    rule.data_sources()
        .iter()
        .filter(|ds| instances.insert(ds.instance()))
        .map(|ds| TableUnit::database(&ds.name))
        .collect()
}
