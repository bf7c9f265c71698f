use serde::Serialize;

use super::generated_key::GeneratedKey;
use super::sharding::ShardingConditions;
use crate::statement::{Statement, Value};

/// Logic table and the physical table standing in for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RoutingTable {
    pub logic: String,
    pub actual: String,
}

impl RoutingTable {
    pub fn new(logic: impl ToString, actual: impl ToString) -> Self {
        Self {
            logic: logic.to_string(),
            actual: actual.to_string(),
        }
    }
}

/// One execution target: a data source and the tables used there.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TableUnit {
    data_source: String,
    routing_tables: Vec<RoutingTable>,
}

impl TableUnit {
    pub fn new(data_source: impl ToString, routing_tables: Vec<RoutingTable>) -> Self {
        Self {
            data_source: data_source.to_string(),
            routing_tables,
        }
    }

    /// Unit for the whole database, no table involved.
    pub fn database(data_source: impl ToString) -> Self {
        Self::new(data_source, vec![])
    }

    /// Unit for a single table.
    pub fn table(data_source: impl ToString, logic: impl ToString, actual: impl ToString) -> Self {
        Self::new(data_source, vec![RoutingTable::new(logic, actual)])
    }

    pub fn data_source_name(&self) -> &str {
        &self.data_source
    }

    pub fn logic_table_name(&self) -> Option<&str> {
        self.routing_tables.first().map(|t| t.logic.as_str())
    }

    pub fn actual_table_name(&self) -> Option<&str> {
        self.routing_tables.first().map(|t| t.actual.as_str())
    }

    pub fn routing_tables(&self) -> &[RoutingTable] {
        &self.routing_tables
    }

    /// Actual table used for a logic table in this unit.
    pub fn actual_table(&self, logic_table: &str) -> Option<&str> {
        self.routing_tables
            .iter()
            .find(|t| t.logic.eq_ignore_ascii_case(logic_table))
            .map(|t| t.actual.as_str())
    }
}

/// Table units to execute, deduplicated, in routing order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RoutingResult {
    table_units: Vec<TableUnit>,
    /// Sharding conditions routed to each unit, by index. For inserts
    /// that's the rows stored in the unit.
    #[serde(skip)]
    conditions: Vec<Vec<usize>>,
}

impl RoutingResult {
    pub fn push(&mut self, unit: TableUnit) {
        self.position(unit);
    }

    /// Add a unit reached by the sharding condition at `condition`.
    pub fn push_condition(&mut self, unit: TableUnit, condition: usize) {
        let position = self.position(unit);
        let conditions = &mut self.conditions[position];
        if !conditions.contains(&condition) {
            conditions.push(condition);
        }
    }

    fn position(&mut self, unit: TableUnit) -> usize {
        match self.table_units.iter().position(|existing| existing == &unit) {
            Some(position) => position,
            None => {
                self.table_units.push(unit);
                self.conditions.push(vec![]);
                self.table_units.len() - 1
            }
        }
    }

    pub fn table_units(&self) -> &[TableUnit] {
        &self.table_units
    }

    /// Indexes of the sharding conditions that reached the unit at
    /// `index`, in routing order. Empty if the unit wasn't routed
    /// by condition.
    pub fn conditions_of(&self, index: usize) -> &[usize] {
        self.conditions
            .get(index)
            .map(|conditions| conditions.as_slice())
            .unwrap_or_default()
    }

    pub fn is_single_routing(&self) -> bool {
        self.table_units.len() == 1
    }

    pub fn is_empty(&self) -> bool {
        self.table_units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.table_units.len()
    }

    /// Distinct data sources, in routing order.
    pub fn data_source_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = vec![];
        for unit in &self.table_units {
            if !names.contains(&unit.data_source_name()) {
                names.push(unit.data_source_name());
            }
        }
        names
    }

    /// Units of one data source.
    pub fn units_in<'a>(&'a self, data_source: &'a str) -> impl Iterator<Item = &'a TableUnit> {
        self.table_units
            .iter()
            .filter(move |unit| unit.data_source_name() == data_source)
    }
}

impl FromIterator<TableUnit> for RoutingResult {
    fn from_iter<T: IntoIterator<Item = TableUnit>>(iter: T) -> Self {
        let mut result = Self::default();
        for unit in iter {
            result.push(unit);
        }
        result
    }
}

/// SQL to run on one data source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteUnit {
    pub data_source: String,
    pub sql: String,
    pub parameters: Vec<Value>,
}

/// Everything decided about one statement.
#[derive(Debug, Clone, Serialize)]
pub struct SqlRouteResult {
    #[serde(skip)]
    statement: Statement,
    generated_key: Option<GeneratedKey>,
    sharding_conditions: ShardingConditions,
    route_units: Vec<RouteUnit>,
}

impl SqlRouteResult {
    pub(crate) fn new(
        statement: Statement,
        generated_key: Option<GeneratedKey>,
        sharding_conditions: ShardingConditions,
        route_units: Vec<RouteUnit>,
    ) -> Self {
        Self {
            statement,
            generated_key,
            sharding_conditions,
            route_units,
        }
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    /// Keys generated in the session so far, including this statement.
    pub fn generated_key(&self) -> Option<&GeneratedKey> {
        self.generated_key.as_ref()
    }

    pub fn sharding_conditions(&self) -> &ShardingConditions {
        &self.sharding_conditions
    }

    pub fn route_units(&self) -> &[RouteUnit] {
        &self.route_units
    }

    pub fn data_source_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = vec![];
        for unit in &self.route_units {
            if !names.contains(&unit.data_source.as_str()) {
                names.push(&unit.data_source);
            }
        }
        names
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_routing_result_dedup() {
        let result: RoutingResult = [
            TableUnit::table("ds_0", "t_order", "t_order_0"),
            TableUnit::table("ds_1", "t_order", "t_order_0"),
            TableUnit::table("ds_0", "t_order", "t_order_0"),
            TableUnit::table("ds_0", "t_order", "t_order_1"),
        ]
        .into_iter()
        .collect();

        assert_eq!(result.len(), 3);
        assert!(!result.is_single_routing());
        assert_eq!(result.data_source_names(), vec!["ds_0", "ds_1"]);
        assert_eq!(result.units_in("ds_0").count(), 2);
    }

    #[test]
    fn test_table_unit() {
        let unit = TableUnit::new(
            "ds_0",
            vec![
                RoutingTable::new("t_order", "t_order_1"),
                RoutingTable::new("t_user", "t_user_0"),
            ],
        );
        assert_eq!(unit.logic_table_name(), Some("t_order"));
        assert_eq!(unit.actual_table_name(), Some("t_order_1"));
        assert_eq!(unit.actual_table("T_USER"), Some("t_user_0"));
        assert_eq!(unit.actual_table("t_other"), None);

        let unit = TableUnit::database("ds_1");
        assert_eq!(unit.logic_table_name(), None);
    }

    #[test]
    fn test_conditions_per_unit() {
        let mut result = RoutingResult::default();
        result.push_condition(TableUnit::table("ds_0", "t_order", "t_order_1"), 0);
        result.push_condition(TableUnit::table("ds_1", "t_order", "t_order_0"), 1);
        result.push_condition(TableUnit::table("ds_0", "t_order", "t_order_1"), 2);
        result.push_condition(TableUnit::table("ds_0", "t_order", "t_order_1"), 2);
        result.push(TableUnit::database("ds_2"));

        assert_eq!(result.len(), 3);
        assert_eq!(result.conditions_of(0), &[0, 2]);
        assert_eq!(result.conditions_of(1), &[1]);
        assert!(result.conditions_of(2).is_empty());
        assert!(result.conditions_of(3).is_empty());
    }
}
