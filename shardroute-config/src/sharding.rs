use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Physical data source.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct DataSource {
    /// Data source name, referenced by data nodes.
    pub name: String,
    /// Physical database instance, e.g. `10.0.0.1:5432`. Data sources
    /// sharing an instance receive instance-level statements once.
    /// Defaults to the data source name.
    #[serde(default)]
    pub instance: Option<String>,
}

impl DataSource {
    /// Instance identifier of this data source.
    pub fn instance(&self) -> &str {
        self.instance.as_deref().unwrap_or(self.name.as_str())
    }
}

/// Sharded table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct ShardedTable {
    /// Logic table name, as used by clients.
    pub name: String,
    /// Physical data nodes, written as `data_source.table`. Inline
    /// expressions are expanded, e.g. `ds_${0..1}.t_order_${[0, 1]}`.
    /// If empty, the table exists under its logic name in every data source.
    #[serde(default)]
    pub data_nodes: Vec<String>,
    /// How the data source is chosen.
    #[serde(default)]
    pub database_strategy: Option<ShardingStrategy>,
    /// How the physical table is chosen inside a data source.
    #[serde(default)]
    pub table_strategy: Option<ShardingStrategy>,
    /// Primary key generated for inserts that don't supply one.
    #[serde(default)]
    pub key_generator: Option<KeyGenerator>,
}

/// Sharding strategy: one column and the algorithm applied to its values.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct ShardingStrategy {
    /// Sharding column.
    pub column: String,
    /// Sharding algorithm.
    #[serde(default)]
    pub algorithm: Algorithm,
    /// Explicit value mappings, used by the `list` and `range` algorithms.
    #[serde(default)]
    pub mappings: Vec<ShardedMapping>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Hash of the value, modulo the number of targets.
    #[default]
    Hash,
    /// Integer value modulo the number of targets.
    Mod,
    /// Values listed in mappings.
    List,
    /// `[start, end)` ranges listed in mappings.
    Range,
}

/// Value-to-target mapping for list and range sharding.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, Eq, JsonSchema)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct ShardedMapping {
    /// Values routed to the target (list sharding).
    #[serde(default)]
    pub values: HashSet<FlexibleType>,
    /// Inclusive range start (range sharding).
    #[serde(default)]
    pub start: Option<FlexibleType>,
    /// Exclusive range end (range sharding).
    #[serde(default)]
    pub end: Option<FlexibleType>,
    /// Data source or actual table name.
    pub target: String,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Eq, Hash, JsonSchema)]
#[serde(untagged)]
pub enum FlexibleType {
    Integer(i64),
    Uuid(uuid::Uuid),
    String(String),
}

impl From<i64> for FlexibleType {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<uuid::Uuid> for FlexibleType {
    fn from(value: uuid::Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<String> for FlexibleType {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for FlexibleType {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// Key generator attached to a table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct KeyGenerator {
    /// Generated column.
    pub column: String,
    /// Generation algorithm.
    #[serde(default)]
    pub kind: KeyGeneratorKind,
    /// First value handed out by the `increment` generator.
    #[serde(default = "KeyGenerator::start")]
    pub start: i64,
}

impl KeyGenerator {
    fn start() -> i64 {
        1
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum KeyGeneratorKind {
    /// 64-bit time-ordered identifiers, unique across nodes.
    #[default]
    Snowflake,
    /// Process-local counter.
    Increment,
}

/// Tables guaranteed to be co-partitioned.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct BindingTables {
    pub tables: Vec<String>,
}
