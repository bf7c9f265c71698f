//! Sharding rule, built from configuration.

pub mod error;
pub mod inline;
pub mod key_generator;
pub mod strategy;
pub mod table;

pub use error::Error;
pub use key_generator::KeyGenerator;
pub use strategy::ShardingStrategy;
pub use table::{DataNode, TableRule};

use std::borrow::Cow;
use std::sync::Arc;

use rand::seq::IndexedRandom;
use shardroute_config::{Config, DataSource};

use crate::statement::Column;

/// Everything the router knows about where tables live.
#[derive(Debug, Clone)]
pub struct ShardingRule {
    data_sources: Vec<DataSource>,
    default_data_source: Option<String>,
    table_rules: Vec<TableRule>,
    binding_groups: Vec<Vec<String>>,
    broadcast_tables: Vec<String>,
    logic_schema: String,
    max_cartesian_product: usize,
    show_sql: bool,
}

impl ShardingRule {
    pub fn new(config: &Config) -> Result<Self, Error> {
        config.check()?;

        let data_sources = config.data_sources.clone();
        let mut table_rules = vec![];

        for table in &config.sharded_tables {
            let data_nodes = if table.data_nodes.is_empty() {
                data_sources
                    .iter()
                    .map(|ds| DataNode::new(&ds.name, &table.name))
                    .collect()
            } else {
                let mut nodes = vec![];
                for expression in &table.data_nodes {
                    for node in inline::expand(expression)? {
                        nodes.push(DataNode::parse(&node)?);
                    }
                }
                nodes
            };

            let database_strategy = table
                .database_strategy
                .as_ref()
                .or(config.default_database_strategy.as_ref())
                .map(ShardingStrategy::new);
            let table_strategy = table
                .table_strategy
                .as_ref()
                .or(config.default_table_strategy.as_ref())
                .map(ShardingStrategy::new);

            let mut rule = TableRule::new(&table.name, data_nodes)
                .with_strategies(database_strategy, table_strategy);

            if let Some(generator) = table
                .key_generator
                .as_ref()
                .or(config.default_key_generator.as_ref())
            {
                let key_generator = key_generator::from_config(generator, config.general.node_id)?;
                rule = rule.with_key_generator(&generator.column, Arc::from(key_generator));
            }

            table_rules.push(rule);
        }

        Ok(Self {
            data_sources,
            default_data_source: config.default_data_source().map(String::from),
            table_rules,
            binding_groups: config
                .binding_tables
                .iter()
                .map(|group| group.tables.clone())
                .collect(),
            broadcast_tables: config.broadcast_tables.clone(),
            logic_schema: config.general.logic_schema.clone(),
            max_cartesian_product: config.general.max_cartesian_product,
            show_sql: config.general.show_sql,
        })
    }

    pub fn data_sources(&self) -> &[DataSource] {
        &self.data_sources
    }

    pub fn data_source_names(&self) -> Vec<&str> {
        self.data_sources.iter().map(|ds| ds.name.as_str()).collect()
    }

    pub fn default_data_source(&self) -> Option<&str> {
        self.default_data_source.as_deref()
    }

    pub fn table_rules(&self) -> &[TableRule] {
        &self.table_rules
    }

    pub fn logic_schema(&self) -> &str {
        &self.logic_schema
    }

    pub fn max_cartesian_product(&self) -> usize {
        self.max_cartesian_product
    }

    pub fn show_sql(&self) -> bool {
        self.show_sql
    }

    /// Configured rule of a sharded table.
    pub fn find_table_rule(&self, logic_table: &str) -> Option<&TableRule> {
        self.table_rules
            .iter()
            .find(|rule| rule.logic_table().eq_ignore_ascii_case(logic_table))
    }

    /// Rule owning an actual table.
    pub fn find_table_rule_by_actual(
        &self,
        data_source: &str,
        actual_table: &str,
    ) -> Option<&TableRule> {
        self.table_rules
            .iter()
            .find(|rule| rule.contains_data_node(data_source, actual_table))
    }

    /// Logic table owning an actual table in any data source.
    pub fn logic_table_of(&self, actual_table: &str) -> Option<&str> {
        self.table_rules
            .iter()
            .find(|rule| {
                rule.data_nodes()
                    .iter()
                    .any(|node| node.table.eq_ignore_ascii_case(actual_table))
            })
            .map(|rule| rule.logic_table())
    }

    /// Rule of any table, synthesized for broadcast tables and tables
    /// living in the default data source.
    pub fn table_rule(&self, logic_table: &str) -> Result<Cow<'_, TableRule>, Error> {
        if let Some(rule) = self.find_table_rule(logic_table) {
            return Ok(Cow::Borrowed(rule));
        }

        if self.is_broadcast_table(logic_table) {
            return Ok(Cow::Owned(TableRule::replicated(
                logic_table,
                self.data_source_names(),
            )));
        }

        if let Some(ref default) = self.default_data_source {
            return Ok(Cow::Owned(TableRule::replicated(
                logic_table,
                [default.as_str()],
            )));
        }

        Err(Error::NoTableRule(logic_table.to_string()))
    }

    /// Binding group the table belongs to.
    pub fn find_binding_table_rule(&self, logic_table: &str) -> Option<&[String]> {
        self.binding_groups
            .iter()
            .find(|group| contains(group, logic_table))
            .map(|group| group.as_slice())
    }

    /// Both tables are the same table or are bound together.
    pub fn is_binding_related(&self, first: &str, second: &str) -> bool {
        first.eq_ignore_ascii_case(second)
            || self
                .find_binding_table_rule(first)
                .map(|group| contains(group, second))
                .unwrap_or(false)
    }

    pub fn is_broadcast_table(&self, logic_table: &str) -> bool {
        contains(&self.broadcast_tables, logic_table)
    }

    pub fn is_all_broadcast_tables(&self, logic_tables: &[&str]) -> bool {
        !logic_tables.is_empty()
            && logic_tables
                .iter()
                .all(|table| self.is_broadcast_table(table))
    }

    /// None of the tables are sharded or broadcast, and there is a
    /// default data source to send them to.
    pub fn is_all_in_default_data_source(&self, logic_tables: &[&str]) -> bool {
        self.default_data_source.is_some()
            && !logic_tables.is_empty()
            && logic_tables.iter().all(|table| {
                self.find_table_rule(table).is_none() && !self.is_broadcast_table(table)
            })
    }

    pub fn is_all_binding_tables(&self, logic_tables: &[&str]) -> bool {
        let Some(first) = logic_tables.first() else {
            return false;
        };

        match self.find_binding_table_rule(first) {
            Some(group) => logic_tables.iter().all(|table| contains(group, table)),
            None => false,
        }
    }

    /// The column shards its table.
    pub fn is_sharding_column(&self, column: &Column) -> bool {
        self.find_table_rule(&column.table)
            .map(|rule| rule.is_sharding_column(&column.name))
            .unwrap_or(false)
    }

    /// Generated key column of a sharded table.
    pub fn generate_key_column(&self, logic_table: &str) -> Option<Column> {
        self.find_table_rule(logic_table)
            .and_then(|rule| rule.generate_key_column())
            .map(|column| Column::new(column, logic_table))
    }

    pub fn generate_key(&self, logic_table: &str) -> Result<i64, Error> {
        match self.find_table_rule(logic_table) {
            Some(rule) => rule.generate_key(),
            None => Err(Error::NoKeyGenerator(logic_table.to_string())),
        }
    }

    /// Actual table of `logic_table` paired with `other_actual_table` of a
    /// table in the same binding group. Both sit at the same position
    /// among their tables in the data source.
    pub fn binding_actual_table(
        &self,
        data_source: &str,
        logic_table: &str,
        other_actual_table: &str,
    ) -> Result<String, Error> {
        let not_found = || Error::BindingActualTableNotFound {
            data_source: data_source.to_string(),
            logic_table: logic_table.to_string(),
            other_actual_table: other_actual_table.to_string(),
        };

        let group = self.find_binding_table_rule(logic_table).ok_or_else(not_found)?;
        let rule = self.find_table_rule(logic_table).ok_or_else(not_found)?;

        let index = group
            .iter()
            .filter_map(|name| self.find_table_rule(name))
            .find_map(|other| other.actual_table_index(data_source, other_actual_table))
            .ok_or_else(not_found)?;

        rule.actual_tables_in(data_source)
            .get(index)
            .map(|table| table.to_string())
            .ok_or_else(not_found)
    }

    /// Physical instance of a data source.
    pub fn instance(&self, data_source: &str) -> Option<&str> {
        self.data_sources
            .iter()
            .find(|ds| ds.name == data_source)
            .map(|ds| ds.instance())
    }

    pub fn random_data_source_name(&self) -> Option<&str> {
        self.data_sources
            .choose(&mut rand::rng())
            .map(|ds| ds.name.as_str())
    }

    /// The actual table belongs to some sharded table.
    pub fn contains_data_node(&self, data_source: &str, actual_table: &str) -> bool {
        self.find_table_rule_by_actual(data_source, actual_table)
            .is_some()
    }

    /// Check that a routed table resolves back to its logic table.
    pub fn resolves(&self, data_source: &str, logic_table: &str, actual_table: &str) -> bool {
        self.table_rule(logic_table)
            .map(|rule| rule.contains_data_node(data_source, actual_table))
            .unwrap_or(false)
    }
}

fn contains(names: &[String], name: &str) -> bool {
    names.iter().any(|n| n.eq_ignore_ascii_case(name))
}
