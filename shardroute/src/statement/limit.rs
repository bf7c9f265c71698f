use serde::{Deserialize, Serialize};

use super::{ConditionValue, Error, Value};

/// LIMIT clause.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Limit {
    #[serde(default)]
    pub offset: Option<ConditionValue>,
    #[serde(default)]
    pub row_count: Option<ConditionValue>,
}

/// LIMIT values each shard must be sent when results
/// from several shards are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RevisedLimit {
    pub offset: Option<i64>,
    pub row_count: Option<i64>,
}

impl Limit {
    pub fn new(offset: Option<ConditionValue>, row_count: Option<ConditionValue>) -> Self {
        Self { offset, row_count }
    }

    /// Compute per-shard limits. Every shard has to return rows
    /// starting at zero; the merger skips the offset itself.
    ///
    /// If `fetch_all` is set, rows are grouped or aggregated in a different
    /// order than they are sorted, so no row can be dropped on the shards.
    pub fn revise(&self, parameters: &[Value], fetch_all: bool) -> Result<RevisedLimit, Error> {
        let offset = self
            .offset
            .as_ref()
            .map(|v| integer(v, parameters))
            .transpose()?;
        let row_count = self
            .row_count
            .as_ref()
            .map(|v| integer(v, parameters))
            .transpose()?;

        Ok(RevisedLimit {
            offset: offset.map(|_| 0),
            row_count: row_count.map(|row_count| {
                if fetch_all {
                    i64::MAX
                } else {
                    row_count.saturating_add(offset.unwrap_or_default())
                }
            }),
        })
    }

    /// Write revised values into the parameters they are bound to.
    pub fn apply(&self, revised: &RevisedLimit, parameters: &mut [Value]) {
        let targets = [
            (self.offset.as_ref(), revised.offset),
            (self.row_count.as_ref(), revised.row_count),
        ];

        for (value, revised) in targets {
            if let (Some(index), Some(revised)) = (value.and_then(|v| v.parameter()), revised) {
                if let Some(parameter) = parameters.get_mut(index) {
                    *parameter = Value::Integer(revised);
                }
            }
        }
    }
}

fn integer(value: &ConditionValue, parameters: &[Value]) -> Result<i64, Error> {
    let resolved = value
        .resolve(parameters)
        .ok_or_else(|| Error::MissingParameter(value.parameter().unwrap_or_default()))?;
    resolved
        .as_i64()
        .ok_or_else(|| Error::NotNumeric(resolved.to_string()))
}
