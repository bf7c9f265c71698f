//! Result merging.
//!
//! Every route unit returns its own result stream. Merged results
//! present them to the client as one.

pub mod error;
pub mod merged;
pub mod result;
pub mod show;
pub mod stream;

pub use error::Error;
pub use merged::{LabelMap, MergedResult};
pub use result::{MemoryQueryResult, QueryResult};
pub use show::{
    LogicTablesMergedResult, ShowCreateTableMergedResult, ShowDatabasesMergedResult,
    ShowTablesMergedResult,
};
pub use stream::{IteratorStreamMergedResult, TransparentMergedResult};

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::rule::ShardingRule;
use crate::statement::{Statement, StatementKind};

/// Merge streams, relabeling the columns named in `overrides`.
pub fn merge_results(
    streams: Vec<Box<dyn QueryResult>>,
    overrides: &IndexMap<String, usize>,
) -> Result<LogicTablesMergedResult, Error> {
    LogicTablesMergedResult::new(streams, overrides, None)
}

/// Picks the merge for a statement.
#[derive(Debug, Clone)]
pub struct MergeEngine {
    rule: Arc<ShardingRule>,
}

impl MergeEngine {
    pub fn new(rule: impl Into<Arc<ShardingRule>>) -> Self {
        Self { rule: rule.into() }
    }

    pub fn merge(
        &self,
        statement: &Statement,
        mut streams: Vec<Box<dyn QueryResult>>,
    ) -> Result<Box<dyn MergedResult>, Error> {
        use StatementKind::*;

        let rule = self.rule.clone();
        debug!(
            "merging {} streams for {:?} statement",
            streams.len(),
            statement.kind()
        );

        Ok(match statement.kind() {
            ShowDatabases => Box::new(ShowDatabasesMergedResult::new(rule.logic_schema())),
            ShowTables => Box::new(ShowTablesMergedResult::new(rule, streams)?),
            ShowCreateTable => Box::new(ShowCreateTableMergedResult::new(rule, streams)?),
            ShowTableStatus | ShowIndex => Box::new(LogicTablesMergedResult::new(
                streams,
                &IndexMap::new(),
                Some(rule),
            )?),
            kind if kind.is_dal() => {
                // Every data source answers the same, the first one is enough.
                if streams.is_empty() {
                    return Err(Error::NoStreams);
                }
                Box::new(TransparentMergedResult::new(streams.remove(0)))
            }
            _ if streams.len() == 1 => Box::new(TransparentMergedResult::new(streams.remove(0))),
            _ => Box::new(IteratorStreamMergedResult::new(streams)?),
        })
    }
}

#[cfg(test)]
mod test {
    use shardroute_config::Config;

    use super::*;
    use crate::statement::{StatementBuilder, Value};

    fn shard(schema: &str, table: &str) -> Box<dyn QueryResult> {
        Box::new(MemoryQueryResult::new(
            &[&format!("Tables_in_{}", schema)],
            vec![vec![Value::from(table)]],
        ))
    }

    fn labeled_rows(merged: &mut dyn MergedResult) -> Vec<(String, Value)> {
        let mut rows = vec![];
        while merged.next().unwrap() {
            rows.push((
                merged.column_label(0).unwrap().to_string(),
                merged.value(0).unwrap(),
            ));
        }
        rows
    }

    fn engine() -> MergeEngine {
        let config = Config::from_toml(
            r#"
[general]
logic_schema = "logic_db"

[[data_sources]]
name = "ds_0"

[[data_sources]]
name = "ds_1"

[[sharded_tables]]
name = "t_order"
data_nodes = ["ds_${0..1}.t_order_${0..1}"]
"#,
        )
        .unwrap();
        MergeEngine::new(ShardingRule::new(&config).unwrap())
    }

    fn statement(kind: StatementKind) -> Statement {
        StatementBuilder::default().kind(kind).build().unwrap()
    }

    #[test]
    fn test_merge_results_relabels() {
        let overrides = IndexMap::from([("Tables_in_logic_db".to_string(), 0)]);
        let mut merged =
            merge_results(vec![shard("db1", "t1"), shard("db1", "t1")], &overrides).unwrap();

        let expected = ("Tables_in_logic_db".to_string(), Value::from("t1"));
        assert_eq!(labeled_rows(&mut merged), vec![expected.clone(), expected]);
    }

    #[test]
    fn test_reset_label_map() {
        let overrides = IndexMap::from([("Tables_in_logic_db".to_string(), 0)]);
        let mut merged = merge_results(vec![shard("db1", "t1")], &overrides).unwrap();

        let reset = IndexMap::from([("Tables_in_other".to_string(), 0)]);
        merged.reset_label_map(&reset);
        merged.reset_label_map(&reset);
        assert_eq!(
            labeled_rows(&mut merged),
            vec![("Tables_in_other".to_string(), Value::from("t1"))]
        );
    }

    #[test]
    fn test_stream_error_propagates() {
        let failing = MemoryQueryResult::new(&["Tables_in_db1"], vec![vec![Value::from("t1")]])
            .fail_with("lost connection to ds_1");
        let mut merged = merge_results(
            vec![shard("db1", "t0"), Box::new(failing) as Box<dyn QueryResult>],
            &IndexMap::new(),
        )
        .unwrap();

        assert!(merged.next().unwrap());
        assert!(merged.next().unwrap());
        let err = merged.next().unwrap_err();
        assert!(matches!(err, Error::Stream(_)));
        assert_eq!(err.to_string(), "lost connection to ds_1");
    }

    #[test]
    fn test_engine_dispatch() {
        let engine = engine();

        let mut merged = engine
            .merge(
                &statement(StatementKind::ShowTables),
                vec![shard("db0", "t_order_0"), shard("db1", "t_order_1")],
            )
            .unwrap();
        assert_eq!(
            labeled_rows(merged.as_mut()),
            vec![("Tables_in_logic_db".to_string(), Value::from("t_order"))]
        );

        let mut merged = engine
            .merge(&statement(StatementKind::ShowDatabases), vec![])
            .unwrap();
        assert!(merged.value_by_label("Database").is_err());
        assert!(merged.next().unwrap());
        assert_eq!(
            merged.value_by_label("Database").unwrap(),
            Value::from("logic_db")
        );

        let mut merged = engine
            .merge(
                &statement(StatementKind::ShowOther),
                vec![shard("db0", "a"), shard("db1", "b")],
            )
            .unwrap();
        assert_eq!(labeled_rows(merged.as_mut()).len(), 1);

        let mut merged = engine
            .merge(
                &statement(StatementKind::Select),
                vec![shard("db0", "a"), shard("db1", "b")],
            )
            .unwrap();
        assert_eq!(labeled_rows(merged.as_mut()).len(), 2);

        assert!(matches!(
            engine.merge(&statement(StatementKind::ShowColumns), vec![]),
            Err(Error::NoStreams)
        ));
    }
}
