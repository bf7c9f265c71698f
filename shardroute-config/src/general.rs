use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Settings that apply to the router as a whole.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct General {
    /// Name of the schema clients connect to. Physical schema names
    /// are replaced with this one in merged metadata results.
    ///
    /// _Default:_ `logic_db`
    #[serde(default = "General::logic_schema")]
    pub logic_schema: String,

    /// Data source holding tables without a sharding rule. If not set and
    /// only one data source is configured, that data source is used.
    #[serde(default)]
    pub default_data_source: Option<String>,

    /// Log the logic SQL and every rewritten SQL statement.
    ///
    /// _Default:_ `false`
    #[serde(default)]
    pub show_sql: bool,

    /// Maximum number of table units a cross-table (cartesian) route
    /// is allowed to produce.
    ///
    /// _Default:_ `4096`
    #[serde(default = "General::max_cartesian_product")]
    pub max_cartesian_product: usize,

    /// Node identifier embedded into snowflake keys. Must be unique
    /// across router instances and not exceed 1023.
    ///
    /// _Default:_ `0`
    #[serde(default)]
    pub node_id: u64,
}

impl General {
    fn logic_schema() -> String {
        "logic_db".into()
    }

    fn max_cartesian_product() -> usize {
        4096
    }
}

impl Default for General {
    fn default() -> Self {
        Self {
            logic_schema: Self::logic_schema(),
            default_data_source: None,
            show_sql: false,
            max_cartesian_product: Self::max_cartesian_product(),
            node_id: 0,
        }
    }
}
