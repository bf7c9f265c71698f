//! Routing engines, one per strategy.

pub mod broadcast;
pub mod complex;
pub mod default_db;
pub mod standard;
pub mod unicast;

use tracing::debug;

use super::result::RoutingResult;
use super::sharding::ShardingConditions;
use super::strategy::RoutingStrategy;
use super::Error;
use crate::rule::ShardingRule;

impl RoutingStrategy {
    /// Compute table units for the statement's tables.
    pub fn route(
        &self,
        rule: &ShardingRule,
        table_names: &[&str],
        conditions: &ShardingConditions,
    ) -> Result<RoutingResult, Error> {
        let result = match self {
            Self::Ignore => RoutingResult::default(),
            Self::DatabaseBroadcast => broadcast::database(rule),
            Self::TableBroadcast => broadcast::table(rule, table_names)?,
            Self::InstanceBroadcast => broadcast::instance(rule),
            Self::DefaultDatabase => default_db::route(rule, table_names)?,
            Self::Unicast => unicast::route(rule, table_names)?,
            Self::Standard { logic_table } => standard::route(rule, logic_table, conditions)?,
            Self::Complex => complex::route(rule, table_names, conditions)?,
        };

        debug!("{} routing produced {} table units", self, result.len());

        Ok(result)
    }
}
