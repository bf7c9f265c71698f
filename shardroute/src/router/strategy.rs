//! Pick how a statement is routed.
use std::fmt::Display;

use super::sharding::ShardingConditions;
use crate::rule::ShardingRule;
use crate::statement::StatementKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingStrategy {
    /// Nothing to execute.
    Ignore,
    /// Every data source, no table.
    DatabaseBroadcast,
    /// Every data node of every table.
    TableBroadcast,
    /// Once per physical database instance.
    InstanceBroadcast,
    /// The default data source, tables unchanged.
    DefaultDatabase,
    /// Exactly one data source.
    Unicast,
    /// Sharding rules of one table (and its binding group).
    Standard { logic_table: String },
    /// Cartesian product of several table groups.
    Complex,
}

impl Display for RoutingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ignore => write!(f, "ignore"),
            Self::DatabaseBroadcast => write!(f, "database broadcast"),
            Self::TableBroadcast => write!(f, "table broadcast"),
            Self::InstanceBroadcast => write!(f, "instance broadcast"),
            Self::DefaultDatabase => write!(f, "default database"),
            Self::Unicast => write!(f, "unicast"),
            Self::Standard { logic_table } => write!(f, "standard on \"{}\"", logic_table),
            Self::Complex => write!(f, "complex"),
        }
    }
}

impl RoutingStrategy {
    /// First matching rule wins.
    pub fn select(
        kind: StatementKind,
        table_names: &[&str],
        conditions: &ShardingConditions,
        rule: &ShardingRule,
    ) -> Self {
        use StatementKind::*;

        if kind == Use {
            Self::Ignore
        } else if rule.is_all_broadcast_tables(table_names) && !kind.is_query() {
            Self::DatabaseBroadcast
        } else if kind.is_ddl() || kind.is_single_table_dcl() {
            Self::TableBroadcast
        } else if matches!(kind, ShowDatabases | SetParam | ResetParam)
            || (matches!(kind, ShowTables | ShowTableStatus) && table_names.is_empty())
        {
            Self::DatabaseBroadcast
        } else if kind.is_dcl() {
            Self::InstanceBroadcast
        } else if rule.is_all_in_default_data_source(table_names) {
            Self::DefaultDatabase
        } else if conditions.is_always_false() || kind.is_dal() {
            Self::Unicast
        } else if kind.is_query()
            && (table_names.is_empty() || rule.is_all_broadcast_tables(table_names))
        {
            Self::Unicast
        } else if table_names.is_empty() {
            Self::DatabaseBroadcast
        } else if table_names.len() == 1 || rule.is_all_binding_tables(table_names) {
            Self::Standard {
                logic_table: table_names[0].to_string(),
            }
        } else {
            Self::Complex
        }
    }
}

#[cfg(test)]
mod test {
    use shardroute_config::Config;

    use super::*;

    fn rule(default: bool) -> ShardingRule {
        let mut source = String::from(
            r#"
broadcast_tables = ["t_config"]

[[data_sources]]
name = "ds_0"

[[data_sources]]
name = "ds_1"

[[sharded_tables]]
name = "t_order"

[[sharded_tables]]
name = "t_order_item"

[[sharded_tables]]
name = "t_user"

[[binding_tables]]
tables = ["t_order", "t_order_item"]
"#,
        );
        if default {
            source.push_str("\n[general]\ndefault_data_source = \"ds_0\"\n");
        }
        ShardingRule::new(&Config::from_toml(&source).unwrap()).unwrap()
    }

    fn select(kind: StatementKind, tables: &[&str]) -> RoutingStrategy {
        RoutingStrategy::select(kind, tables, &ShardingConditions::default(), &rule(false))
    }

    #[test]
    fn test_selection_order() {
        use StatementKind::*;

        assert_eq!(select(Use, &["t_order"]), RoutingStrategy::Ignore);
        assert_eq!(
            select(Update, &["t_config"]),
            RoutingStrategy::DatabaseBroadcast
        );
        assert_eq!(select(Select, &["t_config"]), RoutingStrategy::Unicast);
        assert_eq!(select(Ddl, &["t_order"]), RoutingStrategy::TableBroadcast);
        assert_eq!(
            select(Dcl { single_table: true }, &["t_order"]),
            RoutingStrategy::TableBroadcast
        );
        assert_eq!(
            select(Dcl { single_table: false }, &[]),
            RoutingStrategy::InstanceBroadcast
        );
        assert_eq!(select(ShowDatabases, &[]), RoutingStrategy::DatabaseBroadcast);
        assert_eq!(select(ShowTables, &[]), RoutingStrategy::DatabaseBroadcast);
        assert_eq!(select(ShowTables, &["t_order"]), RoutingStrategy::Unicast);
        assert_eq!(select(SetParam, &[]), RoutingStrategy::DatabaseBroadcast);
        assert_eq!(select(ResetParam, &[]), RoutingStrategy::DatabaseBroadcast);
        assert_eq!(select(ShowOther, &[]), RoutingStrategy::Unicast);
        assert_eq!(select(Select, &[]), RoutingStrategy::Unicast);
        assert_eq!(select(Delete, &[]), RoutingStrategy::DatabaseBroadcast);
        assert_eq!(
            select(Select, &["t_order"]),
            RoutingStrategy::Standard {
                logic_table: "t_order".into()
            }
        );
        assert_eq!(
            select(Select, &["t_order", "t_order_item"]),
            RoutingStrategy::Standard {
                logic_table: "t_order".into()
            }
        );
        assert_eq!(
            select(Select, &["t_order", "t_user"]),
            RoutingStrategy::Complex
        );
    }

    #[test]
    fn test_default_database() {
        let rule = rule(true);
        let conditions = ShardingConditions::default();
        assert_eq!(
            RoutingStrategy::select(StatementKind::Select, &["t_other"], &conditions, &rule),
            RoutingStrategy::DefaultDatabase
        );
        assert_eq!(
            RoutingStrategy::select(StatementKind::Ddl, &["t_other"], &conditions, &rule),
            RoutingStrategy::TableBroadcast
        );
    }

    #[test]
    fn test_always_false_is_unicast() {
        let rule = rule(false);
        assert_eq!(
            RoutingStrategy::select(
                StatementKind::Select,
                &["t_order"],
                &ShardingConditions::always_false(),
                &rule
            ),
            RoutingStrategy::Unicast
        );
    }
}
