use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

use crate::config::{self, Config};
use crate::router::{Router, Session, SqlRouteResult};
use crate::rule::{self, ShardingRule};
use crate::statement::{Statement, Value};
use crate::LogFormat;

/// Routes sharded SQL statements to data sources and tables.
#[derive(Parser, Debug)]
#[command(name = "shardroute", version)]
pub struct Cli {
    /// Path to the configuration file. Default: "shardroute.toml"
    #[arg(short, long, default_value = "shardroute.toml")]
    pub config: PathBuf,
    /// Log format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
    /// Subcommand.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Check the configuration file for errors.
    Configcheck,

    /// Route the statements in a file and print the results.
    Route {
        /// JSON list of `{ "sql", "parameters", "statement" }` objects.
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print the JSON schema of the configuration file.
    Schema,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on `{0}`: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("{0}")]
    Config(#[from] config::Error),

    #[error("{0}")]
    Rule(#[from] rule::Error),

    #[error("statement {index}: {source}")]
    Route {
        index: usize,
        #[source]
        source: crate::router::Error,
    },

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

/// One statement, as produced by the parser.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteRequest {
    pub sql: String,
    #[serde(default)]
    pub parameters: Vec<Value>,
    #[serde(default)]
    pub statement: Statement,
}

/// Confirm that the configuration file is valid.
pub fn config_check(path: &Path) -> Result<(), Error> {
    let source = read_to_string(path).map_err(|err| Error::Io(path.to_path_buf(), err))?;
    let config = Config::from_toml(&source)?;
    config.check()?;
    ShardingRule::new(&config)?;

    info!("\"{}\" is valid", path.display());
    Ok(())
}

/// Route every request in the file in one session.
pub fn route(config: &Config, file: &Path) -> Result<Vec<SqlRouteResult>, Error> {
    let source = read_to_string(file).map_err(|err| Error::Io(file.to_path_buf(), err))?;
    let requests: Vec<RouteRequest> = serde_json::from_str(&source)?;

    let router = Router::new(ShardingRule::new(config)?);
    let mut session = Session::new();
    let mut results = vec![];

    for (index, request) in requests.into_iter().enumerate() {
        let result = router
            .route(
                &request.sql,
                &request.parameters,
                request.statement,
                &mut session,
            )
            .map_err(|source| {
                error!("{}: {}", request.sql, source);
                Error::Route { index, source }
            })?;
        results.push(result);
    }

    Ok(results)
}

/// Run the command.
pub fn run(cli: Cli) -> Result<(), Error> {
    match cli.command {
        Commands::Configcheck => config_check(&cli.config),

        Commands::Route { file } => {
            let config = config::load(&cli.config)?;
            for result in route(&config, &file)? {
                println!("{}", serde_json::to_string(&result)?);
            }
            Ok(())
        }

        Commands::Schema => {
            println!("{}", Config::json_schema()?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;

    const CONFIG: &str = r#"
[[data_sources]]
name = "ds_0"

[[data_sources]]
name = "ds_1"

[[sharded_tables]]
name = "t_order"
data_nodes = ["ds_${0..1}.t_order"]
database_strategy = { column = "user_id", algorithm = "mod" }
key_generator = { column = "order_id", kind = "increment" }
"#;

    const REQUESTS: &str = r#"[
        {
            "sql": "INSERT INTO t_order (user_id) VALUES (?)",
            "parameters": [3],
            "statement": {
                "kind": "insert",
                "tables": [{"name": "t_order"}],
                "conditions": {"and_conditions": [{"conditions": [
                    {"column": {"name": "user_id", "table": "t_order"},
                     "operator": "equal",
                     "values": [{"parameter": 0}]}
                ]}]},
                "insert": {"values": 1},
                "tokens": [
                    {"type": "table", "begin": 12, "original": "t_order"},
                    {"type": "insert_columns", "begin": 20, "original": "(user_id)"},
                    {"type": "insert_values", "begin": 37, "original": "(?)", "parameters": 1}
                ]
            }
        },
        {
            "sql": "INSERT INTO t_order (user_id) VALUES (4)",
            "statement": {
                "kind": "insert",
                "tables": [{"name": "t_order"}],
                "conditions": {"and_conditions": [{"conditions": [
                    {"column": {"name": "user_id", "table": "t_order"},
                     "operator": "equal",
                     "values": [{"literal": 4}]}
                ]}]},
                "insert": {"values": 1},
                "tokens": [
                    {"type": "insert_columns", "begin": 20, "original": "(user_id)"},
                    {"type": "insert_values", "begin": 37, "original": "(4)"}
                ]
            }
        }
    ]"#;

    fn file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_config_check() {
        assert!(config_check(file(CONFIG).path()).is_ok());
        assert!(matches!(
            config_check(file("[general]\nshow_sq = true\n").path()),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            config_check(Path::new("/nonexistent/shardroute.toml")),
            Err(Error::Io(..))
        ));
    }

    #[test]
    fn test_route_file() {
        let config = Config::from_toml(CONFIG).unwrap();
        let results = route(&config, file(REQUESTS).path()).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].data_source_names(), vec!["ds_1"]);
        assert_eq!(results[1].data_source_names(), vec!["ds_0"]);
        assert_eq!(results[1].generated_key().unwrap().values(), &[1, 2]);

        assert_eq!(
            results[0].route_units()[0].sql,
            "INSERT INTO t_order (user_id, order_id) VALUES (?, ?)"
        );
        assert_eq!(
            results[0].route_units()[0].parameters,
            vec![Value::from(3), Value::from(1)]
        );
        assert_eq!(
            results[1].route_units()[0].sql,
            "INSERT INTO t_order (user_id, order_id) VALUES (4, 2)"
        );

        let json = serde_json::to_value(&results[0]).unwrap();
        assert_eq!(json["route_units"][0]["data_source"], "ds_1");
        assert_eq!(json["generated_key"]["values"][0], 1);
    }

    #[test]
    fn test_route_error_names_statement() {
        let config = Config::from_toml(CONFIG).unwrap();
        let requests = r#"[{"sql": "INSERT INTO t_order (user_id) VALUES (?)",
            "statement": {"kind": "insert", "tables": [{"name": "t_order"}],
                "conditions": {"and_conditions": [{"conditions": [
                    {"column": {"name": "user_id", "table": "t_order"},
                     "operator": "equal", "values": [{"parameter": 0}]}]}]},
                "insert": {"values": 1}}}]"#;

        let err = route(&config, file(requests).path()).unwrap_err();
        assert!(matches!(err, Error::Route { index: 0, .. }));
    }
}
