//! Statement router.
//!
//! Decides which data sources and physical tables execute a statement
//! and produces the SQL for each of them.

pub mod engine;
pub mod error;
pub mod generated_key;
pub mod optimize;
pub mod result;
pub mod rewrite;
pub mod sharding;
pub mod strategy;
pub mod subquery;

#[cfg(test)]
pub mod test;

pub use error::Error;
pub use generated_key::{GeneratedKey, Session};
pub use result::{RouteUnit, RoutingResult, RoutingTable, SqlRouteResult, TableUnit};
pub use rewrite::{RewriteContext, RewrittenSql, SqlRewriter, TokenRewriter};
pub use sharding::{ShardingCondition, ShardingConditions, ShardingValue};
pub use strategy::RoutingStrategy;

use std::fmt::Debug;
use std::sync::Arc;

use tracing::{debug, info};

use crate::rule::ShardingRule;
use crate::statement::{Statement, Value};

/// Routes statements using one sharding rule.
pub struct Router {
    rule: Arc<ShardingRule>,
    rewriter: Box<dyn SqlRewriter>,
}

impl Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router").field("rule", &self.rule).finish()
    }
}

impl Router {
    /// Router using the built-in token rewriter.
    pub fn new(rule: impl Into<Arc<ShardingRule>>) -> Self {
        Self::with_rewriter(rule, TokenRewriter)
    }

    pub fn with_rewriter(
        rule: impl Into<Arc<ShardingRule>>,
        rewriter: impl SqlRewriter + 'static,
    ) -> Self {
        Self {
            rule: rule.into(),
            rewriter: Box::new(rewriter),
        }
    }

    pub fn rule(&self) -> &ShardingRule {
        &self.rule
    }

    /// Route a parsed statement.
    ///
    /// `sql` is the logic SQL the statement was parsed from, `parameters`
    /// are the bound values. Keys generated for inserts are written into
    /// the SQL of each unit and recorded in the `session`.
    pub fn route(
        &self,
        sql: &str,
        parameters: &[Value],
        statement: Statement,
        session: &mut Session,
    ) -> Result<SqlRouteResult, Error> {
        let rule = self.rule.as_ref();

        let generated_key = if statement.kind().is_insert() {
            GeneratedKey::resolve(rule, &statement, parameters)?
        } else {
            None
        };

        let mut conditions =
            optimize::optimize(rule, &statement, parameters, generated_key.as_ref())?;

        let accumulated = generated_key.as_ref().map(|key| session.accumulate(key));

        subquery::reconcile(rule, &statement, &mut conditions)?;

        let table_names = statement.table_names();
        let strategy = RoutingStrategy::select(statement.kind(), &table_names, &conditions, rule);
        debug!("routing {:?} with {} strategy", table_names, strategy);

        let routing = strategy.route(rule, &table_names, &conditions)?;

        debug_assert!(
            routing.table_units().iter().all(|unit| unit
                .routing_tables()
                .iter()
                .all(|table| rule.resolves(unit.data_source_name(), &table.logic, &table.actual))),
            "table units must resolve to their logic tables"
        );

        let mut parameters = parameters.to_vec();
        let mut limit = None;
        if let Some(statement_limit) = statement.limit() {
            if statement.kind().is_query() && !routing.is_single_routing() {
                let revised = statement_limit.revise(&parameters, statement.fetch_all())?;
                statement_limit.apply(&revised, &mut parameters);
                limit = Some(revised);
            }
        }

        // Keys the statement supplies are already in its SQL.
        let injected_key = generated_key.as_ref().filter(|_| {
            statement
                .insert()
                .is_some_and(|insert| insert.generate_key_column_index.is_none())
        });

        let mut route_units = Vec::with_capacity(routing.len());
        for (index, unit) in routing.table_units().iter().enumerate() {
            // Insert conditions are one per row.
            let rows: &[usize] = if statement.kind().is_insert() {
                routing.conditions_of(index)
            } else {
                &[]
            };

            let rewritten = self.rewriter.rewrite(&RewriteContext {
                sql,
                statement: &statement,
                table_unit: unit,
                rule,
                parameters: &parameters,
                limit,
                generated_key: injected_key,
                rows,
            })?;
            route_units.push(RouteUnit {
                data_source: unit.data_source_name().to_string(),
                sql: rewritten.sql,
                parameters: rewritten.parameters,
            });
        }

        if rule.show_sql() {
            info!("Logic SQL: {}", sql);
            for unit in &route_units {
                info!("Actual SQL: {} ::: {}", unit.data_source, unit.sql);
            }
        }

        Ok(SqlRouteResult::new(
            statement,
            accumulated,
            conditions,
            route_units,
        ))
    }
}
