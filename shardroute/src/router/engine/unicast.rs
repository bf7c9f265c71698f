use super::super::result::{RoutingResult, RoutingTable, TableUnit};
use super::super::Error;
use crate::rule::{self, ShardingRule};

/// Route to exactly one data source.
pub fn route(rule: &ShardingRule, table_names: &[&str]) -> Result<RoutingResult, Error> {
    let mut result = RoutingResult::default();

    if table_names.is_empty() {
        let data_source = rule.random_data_source_name().ok_or(Error::NoDataSource)?;
        result.push(TableUnit::database(data_source));
        return Ok(result);
    }

    if rule.is_all_broadcast_tables(table_names) {
        let data_source = rule.random_data_source_name().ok_or(Error::NoDataSource)?;
        let tables = table_names
            .iter()
            .map(|table| RoutingTable::new(table, table))
            .collect();
        result.push(TableUnit::new(data_source, tables));
        return Ok(result);
    }

    if let [table] = table_names {
        let table_rule = rule.table_rule(table)?;
        let node = table_rule
            .data_nodes()
            .first()
            .ok_or_else(|| rule::Error::NoTableRule(table.to_string()))?;
        result.push(TableUnit::table(
            &node.data_source,
            table_rule.logic_table(),
            &node.table,
        ));
        return Ok(result);
    }

    let mut table_rules = vec![];
    for table in table_names {
        table_rules.push(rule.table_rule(table)?);
    }

    // First data source every table lives in.
    let data_source = table_rules[0]
        .data_source_names()
        .into_iter()
        .find(|ds| {
            table_rules[1..]
                .iter()
                .all(|other| other.data_source_names().contains(ds))
        })
        .ok_or_else(|| {
            rule::Error::NoDataSourceIntersection(
                table_names.iter().map(|t| t.to_string()).collect(),
            )
        })?;

    let mut tables = vec![];
    for table_rule in &table_rules {
        if let Some(actual) = table_rule.actual_tables_in(data_source).first() {
            tables.push(RoutingTable::new(table_rule.logic_table(), actual));
        }
    }

    result.push(TableUnit::new(data_source, tables));
    Ok(result)
}
