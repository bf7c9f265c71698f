//! Several unbound sharded tables: route each table group on its own,
//! then combine the results data source by data source.
use tracing::warn;

use super::super::result::{RoutingResult, RoutingTable, TableUnit};
use super::super::sharding::ShardingConditions;
use super::super::Error;
use super::standard;
use crate::rule::{self, ShardingRule};

pub fn route(
    rule: &ShardingRule,
    table_names: &[&str],
    conditions: &ShardingConditions,
) -> Result<RoutingResult, Error> {
    let mut results = vec![];
    let mut bound: Vec<&str> = vec![];

    for table in table_names {
        let Some(table_rule) = rule.find_table_rule(table) else {
            continue;
        };

        if !bound.iter().any(|b| b.eq_ignore_ascii_case(table)) {
            results.push(standard::route(
                rule,
                table_rule.logic_table(),
                conditions,
            )?);
        }

        if let Some(group) = rule.find_binding_table_rule(table) {
            bound.extend(group.iter().map(|name| name.as_str()));
        }
    }

    match results.len() {
        0 => Err(rule::Error::NoTableRule(table_names.join(", ")).into()),
        1 => Ok(results.remove(0)),
        _ => cartesian(rule, table_names, &results),
    }
}

// Combine routing results on the data sources they have in common.
fn cartesian(
    rule: &ShardingRule,
    table_names: &[&str],
    results: &[RoutingResult],
) -> Result<RoutingResult, Error> {
    let data_sources = results[0]
        .data_source_names()
        .into_iter()
        .filter(|ds| results[1..].iter().all(|r| r.data_source_names().contains(ds)))
        .collect::<Vec<_>>();

    if data_sources.is_empty() {
        return Err(rule::Error::NoDataSourceIntersection(
            table_names.iter().map(|t| t.to_string()).collect(),
        )
        .into());
    }

    // Check the size before building anything.
    let mut size = 0usize;
    for data_source in &data_sources {
        let product = results
            .iter()
            .map(|r| r.units_in(data_source).count())
            .try_fold(1usize, |acc, count| acc.checked_mul(count));
        size = product
            .and_then(|product| size.checked_add(product))
            .unwrap_or(usize::MAX);
    }

    let max = rule.max_cartesian_product();
    if size > max {
        warn!(
            "cartesian product of {:?} has {} routes, maximum is {}",
            table_names, size, max
        );
        return Err(Error::CartesianProductTooLarge {
            tables: table_names.iter().map(|t| t.to_string()).collect(),
            size,
            max,
        });
    }

    let mut result = RoutingResult::default();
    for data_source in data_sources {
        let mut combinations: Vec<Vec<RoutingTable>> = vec![vec![]];

        for routing in results {
            let mut next = vec![];
            for combination in &combinations {
                for unit in routing.units_in(data_source) {
                    let mut tables = combination.clone();
                    tables.extend(unit.routing_tables().iter().cloned());
                    next.push(tables);
                }
            }
            combinations = next;
        }

        for tables in combinations {
            result.push(TableUnit::new(data_source, tables));
        }
    }

    Ok(result)
}
