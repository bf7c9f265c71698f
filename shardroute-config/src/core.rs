use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::read_to_string;
use std::path::Path;
use tracing::{info, warn};

use super::error::Error;
use super::general::General;
use super::sharding::{BindingTables, DataSource, KeyGenerator, ShardedTable, ShardingStrategy};

/// Configuration.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// General configuration.
    #[serde(default)]
    pub general: General,

    /// Physical data sources.
    #[serde(default)]
    pub data_sources: Vec<DataSource>,

    /// List of sharded tables.
    #[serde(default)]
    pub sharded_tables: Vec<ShardedTable>,

    /// Groups of co-partitioned tables.
    #[serde(default)]
    pub binding_tables: Vec<BindingTables>,

    /// Tables replicated to every data source.
    #[serde(default)]
    pub broadcast_tables: Vec<String>,

    /// Database strategy for tables that don't set one.
    #[serde(default)]
    pub default_database_strategy: Option<ShardingStrategy>,

    /// Table strategy for tables that don't set one.
    #[serde(default)]
    pub default_table_strategy: Option<ShardingStrategy>,

    /// Key generator for tables that set a key column without an algorithm.
    #[serde(default)]
    pub default_key_generator: Option<KeyGenerator>,
}

impl Config {
    /// Load configuration from disk or use defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let config = if let Ok(source) = read_to_string(path) {
            let config = Self::from_toml(&source)?;
            info!("loaded \"{}\"", path.display());
            config
        } else {
            warn!(
                "\"{}\" doesn't exist, loading defaults instead",
                path.display()
            );
            Config::default()
        };

        config.check()?;

        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(source: &str) -> Result<Self, Error> {
        toml::from_str(source).map_err(|err| Error::config(source, err))
    }

    /// Name of the data source holding unsharded tables, if any.
    pub fn default_data_source(&self) -> Option<&str> {
        if let Some(ref name) = self.general.default_data_source {
            Some(name.as_str())
        } else if self.data_sources.len() == 1 {
            self.data_sources.first().map(|ds| ds.name.as_str())
        } else {
            None
        }
    }

    /// Validate the configuration. Unrecoverable mistakes are errors,
    /// suspicious settings are logged.
    pub fn check(&self) -> Result<(), Error> {
        let mut names = HashSet::new();
        for ds in &self.data_sources {
            if !names.insert(ds.name.as_str()) {
                return Err(Error::DuplicateDataSource(ds.name.clone()));
            }
        }

        if let Some(ref default) = self.general.default_data_source {
            if !names.contains(default.as_str()) {
                return Err(Error::UnknownDefaultDataSource(default.clone()));
            }
        }

        if self.data_sources.is_empty() && !self.sharded_tables.is_empty() {
            return Err(Error::NoDataSources);
        }

        let mut tables = HashSet::new();
        for table in &self.sharded_tables {
            if !tables.insert(table.name.to_lowercase()) {
                return Err(Error::DuplicateTable(table.name.clone()));
            }

            for node in &table.data_nodes {
                let data_source = node.split('.').next().unwrap_or_default();
                if !data_source.contains("${") && !names.contains(data_source) {
                    warn!(
                        "data node \"{}\" of table \"{}\" references an unknown data source",
                        node, table.name
                    );
                }
            }

            if table.key_generator.is_none() && self.default_key_generator.is_some() {
                info!(
                    "table \"{}\" will use the default key generator",
                    table.name
                );
            }
        }

        for group in &self.binding_tables {
            for name in &group.tables {
                if !tables.contains(&name.to_lowercase()) {
                    warn!("binding table \"{}\" is not a sharded table", name);
                }
            }
        }

        for name in &self.broadcast_tables {
            if tables.contains(&name.to_lowercase()) {
                warn!(
                    "table \"{}\" is configured as both sharded and broadcast",
                    name
                );
            }
        }

        Ok(())
    }

    /// JSON schema of the configuration file.
    pub fn json_schema() -> Result<String, Error> {
        let schema = schemars::schema_for!(Config);
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}
