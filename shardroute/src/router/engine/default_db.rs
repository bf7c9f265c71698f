use super::super::result::{RoutingResult, RoutingTable, TableUnit};
use super::super::Error;
use crate::rule::{self, ShardingRule};

/// Everything goes to the default data source, table names unchanged.
pub fn route(rule: &ShardingRule, table_names: &[&str]) -> Result<RoutingResult, Error> {
    let data_source = rule.default_data_source().ok_or_else(|| {
        rule::Error::NoTableRule(table_names.first().copied().unwrap_or_default().to_string())
    })?;

    let tables = table_names
        .iter()
        .map(|table| RoutingTable::new(table, table))
        .collect();

    let mut result = RoutingResult::default();
    result.push(TableUnit::new(data_source, tables));
    Ok(result)
}
