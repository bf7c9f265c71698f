use std::sync::Arc;

use derive_more::Display;

use super::key_generator::KeyGenerator;
use super::strategy::ShardingStrategy;
use super::Error;

/// Physical table inside a data source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{data_source}.{table}")]
pub struct DataNode {
    pub data_source: String,
    pub table: String,
}

impl DataNode {
    pub fn new(data_source: impl ToString, table: impl ToString) -> Self {
        Self {
            data_source: data_source.to_string(),
            table: table.to_string(),
        }
    }

    /// Parse `data_source.table`.
    pub fn parse(node: &str) -> Result<Self, Error> {
        match node.split_once('.') {
            Some((data_source, table))
                if !data_source.is_empty() && !table.is_empty() && !table.contains('.') =>
            {
                Ok(Self::new(data_source.trim(), table.trim()))
            }
            _ => Err(Error::DataNodeFormat(node.to_string())),
        }
    }
}

/// Routing rule of one logic table.
#[derive(Debug, Clone)]
pub struct TableRule {
    logic_table: String,
    data_nodes: Vec<DataNode>,
    database_strategy: Option<ShardingStrategy>,
    table_strategy: Option<ShardingStrategy>,
    generate_key_column: Option<String>,
    key_generator: Option<Arc<dyn KeyGenerator>>,
}

impl TableRule {
    pub fn new(logic_table: impl ToString, data_nodes: Vec<DataNode>) -> Self {
        Self {
            logic_table: logic_table.to_string(),
            data_nodes,
            database_strategy: None,
            table_strategy: None,
            generate_key_column: None,
            key_generator: None,
        }
    }

    /// Table present under its logic name in each of the data sources.
    pub fn replicated<'a>(
        logic_table: &str,
        data_sources: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let nodes = data_sources
            .into_iter()
            .map(|ds| DataNode::new(ds, logic_table))
            .collect();
        Self::new(logic_table, nodes)
    }

    pub fn with_strategies(
        mut self,
        database_strategy: Option<ShardingStrategy>,
        table_strategy: Option<ShardingStrategy>,
    ) -> Self {
        self.database_strategy = database_strategy;
        self.table_strategy = table_strategy;
        self
    }

    pub fn with_key_generator(
        mut self,
        column: impl ToString,
        generator: Arc<dyn KeyGenerator>,
    ) -> Self {
        self.generate_key_column = Some(column.to_string());
        self.key_generator = Some(generator);
        self
    }

    pub fn logic_table(&self) -> &str {
        &self.logic_table
    }

    pub fn data_nodes(&self) -> &[DataNode] {
        &self.data_nodes
    }

    /// Distinct data sources, in declaration order.
    pub fn data_source_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = vec![];
        for node in &self.data_nodes {
            if !names.contains(&node.data_source.as_str()) {
                names.push(&node.data_source);
            }
        }
        names
    }

    /// Actual tables in one data source, in declaration order.
    pub fn actual_tables_in(&self, data_source: &str) -> Vec<&str> {
        self.data_nodes
            .iter()
            .filter(|node| node.data_source == data_source)
            .map(|node| node.table.as_str())
            .collect()
    }

    /// Position of an actual table among the tables of its data source.
    pub fn actual_table_index(&self, data_source: &str, actual_table: &str) -> Option<usize> {
        self.actual_tables_in(data_source)
            .iter()
            .position(|table| table.eq_ignore_ascii_case(actual_table))
    }

    pub fn contains_data_node(&self, data_source: &str, actual_table: &str) -> bool {
        self.actual_table_index(data_source, actual_table).is_some()
    }

    pub fn database_strategy(&self) -> Option<&ShardingStrategy> {
        self.database_strategy.as_ref()
    }

    pub fn table_strategy(&self) -> Option<&ShardingStrategy> {
        self.table_strategy.as_ref()
    }

    /// The column is used by one of the strategies.
    pub fn is_sharding_column(&self, column: &str) -> bool {
        [&self.database_strategy, &self.table_strategy]
            .into_iter()
            .flatten()
            .any(|strategy| strategy.column().eq_ignore_ascii_case(column))
    }

    pub fn generate_key_column(&self) -> Option<&str> {
        self.generate_key_column.as_deref()
    }

    pub fn generate_key(&self) -> Result<i64, Error> {
        match self.key_generator {
            Some(ref generator) => Ok(generator.next_key()?),
            None => Err(Error::NoKeyGenerator(self.logic_table.clone())),
        }
    }
}
