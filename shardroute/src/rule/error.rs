use thiserror::Error;

use super::key_generator;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot find table rule and default data source with logic table: \"{0}\"")]
    NoTableRule(String),

    #[error("cannot find actual data source intersection for logic tables: {0:?}")]
    NoDataSourceIntersection(Vec<String>),

    #[error("data node \"{0}\" must be written as \"data_source.table\"")]
    DataNodeFormat(String),

    #[error("inline expression \"{0}\" is invalid")]
    InlineExpression(String),

    #[error("actual table \"{data_source}.{actual_table}\" is not in table config")]
    ActualTableNotFound {
        data_source: String,
        actual_table: String,
    },

    #[error("cannot find binding actual table, data source: {data_source}, logic table: {logic_table}, other actual table: {other_actual_table}")]
    BindingActualTableNotFound {
        data_source: String,
        logic_table: String,
        other_actual_table: String,
    },

    #[error("integer sharding value expected for \"mod\" algorithm, got \"{0}\"")]
    ModRequiresInteger(String),

    #[error("no key generator for table \"{0}\"")]
    NoKeyGenerator(String),

    #[error("{0}")]
    KeyGenerator(#[from] key_generator::Error),

    #[error("config error: {0}")]
    Config(#[from] shardroute_config::Error),
}
