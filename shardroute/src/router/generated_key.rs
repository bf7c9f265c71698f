//! Primary keys of inserted rows.
use serde::Serialize;
use tracing::debug;

use super::Error;
use crate::rule::ShardingRule;
use crate::statement::{Column, Statement, Value};

/// Key column and one value per inserted row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedKey {
    column: Column,
    values: Vec<i64>,
}

impl GeneratedKey {
    pub fn new(column: Column, values: Vec<i64>) -> Self {
        Self { column, values }
    }

    pub fn column(&self) -> &Column {
        &self.column
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// Find the keys of an INSERT, either supplied by the statement
    /// or generated by the table's key generator.
    pub fn resolve(
        rule: &ShardingRule,
        statement: &Statement,
        parameters: &[Value],
    ) -> Result<Option<Self>, Error> {
        let Some(insert) = statement.insert() else {
            return Ok(None);
        };

        if insert.generate_key_column_index.is_some() {
            let Some(first) = insert.generated_key_conditions.first() else {
                return Ok(None);
            };

            if insert.generated_key_conditions.len() != insert.values {
                return Err(Error::GeneratedKeyCount {
                    keys: insert.generated_key_conditions.len(),
                    rows: insert.values,
                });
            }

            let mut values = vec![];
            for condition in &insert.generated_key_conditions {
                let value = condition.value.resolve(parameters).ok_or_else(|| {
                    crate::statement::Error::MissingParameter(
                        condition.value.parameter().unwrap_or_default(),
                    )
                })?;
                let value = match value {
                    Value::Integer(value) => *value,
                    value => value
                        .as_i64()
                        .ok_or_else(|| Error::GeneratedKeyNotNumeric(value.to_string()))?,
                };
                values.push(value);
            }

            return Ok(Some(Self::new(first.column.clone(), values)));
        }

        let Some(table) = statement.single_table_name() else {
            return Ok(None);
        };

        let Some(column) = rule.generate_key_column(table) else {
            return Ok(None);
        };

        let mut values = Vec::with_capacity(insert.values);
        for _ in 0..insert.values {
            values.push(rule.generate_key(table)?);
        }

        debug!(
            "generated {} keys for \"{}.{}\"",
            values.len(),
            column.table,
            column.name
        );

        Ok(Some(Self::new(column, values)))
    }
}

/// Per-client routing state.
#[derive(Debug, Default)]
pub struct Session {
    generated_keys: Vec<i64>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every key produced in this session so far.
    pub fn generated_keys(&self) -> &[i64] {
        &self.generated_keys
    }

    /// Record new keys, returning the key with the full session history.
    pub fn accumulate(&mut self, key: &GeneratedKey) -> GeneratedKey {
        self.generated_keys.extend_from_slice(key.values());
        GeneratedKey::new(key.column.clone(), self.generated_keys.clone())
    }
}
