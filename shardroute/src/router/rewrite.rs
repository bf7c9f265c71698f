//! Produce the SQL executed by each table unit.
use std::ops::Range;

use thiserror::Error;

use super::generated_key::GeneratedKey;
use super::result::TableUnit;
use crate::rule::{self, ShardingRule};
use crate::statement::token::unquote;
use crate::statement::{RevisedLimit, SqlToken, Statement, Value};

#[derive(Debug, Error)]
pub enum Error {
    #[error("token \"{token}\" at {begin} is outside the statement ({len} bytes)")]
    TokenOutOfBounds {
        token: String,
        begin: usize,
        len: usize,
    },

    #[error("token \"{token}\" at {begin} overlaps the previous token")]
    TokenOverlap { token: String, begin: usize },

    #[error("token \"{token}\" at {begin} doesn't match the statement text")]
    TokenMismatch { token: String, begin: usize },

    #[error("token \"{token}\" at {begin} is not enclosed in parentheses")]
    NotParenthesized { token: String, begin: usize },

    #[error("generated key \"{0}\" can't be added, the statement has no column list or rows")]
    GeneratedKeyPosition(String),

    #[error("{keys} generated keys for {rows} inserted rows")]
    GeneratedKeyRows { keys: usize, rows: usize },

    #[error("insert rows use {expected} parameters, got {got}")]
    RowParameters { expected: usize, got: usize },

    #[error("{0}")]
    Rule(#[from] rule::Error),
}

/// Inputs for rewriting the SQL of one table unit.
#[derive(Debug)]
pub struct RewriteContext<'a> {
    pub sql: &'a str,
    pub statement: &'a Statement,
    pub table_unit: &'a TableUnit,
    pub rule: &'a ShardingRule,
    /// Bound values, with the LIMIT already revised.
    pub parameters: &'a [Value],
    /// Set when the statement is routed to more than one unit
    /// and its LIMIT had to be revised.
    pub limit: Option<RevisedLimit>,
    /// Keys generated for this statement's rows. Not set when the
    /// statement supplies the key column itself.
    pub generated_key: Option<&'a GeneratedKey>,
    /// Indexes of the INSERT rows stored in this unit. Empty means
    /// every row.
    pub rows: &'a [usize],
}

impl RewriteContext<'_> {
    fn keeps_row(&self, row: usize) -> bool {
        self.rows.is_empty() || self.rows.contains(&row)
    }
}

/// SQL and bound values of one table unit.
#[derive(Debug, Clone, PartialEq)]
pub struct RewrittenSql {
    pub sql: String,
    pub parameters: Vec<Value>,
}

/// Rewrites logic SQL into the SQL of one table unit.
pub trait SqlRewriter: Send + Sync {
    fn rewrite(&self, context: &RewriteContext<'_>) -> Result<RewrittenSql, Error>;
}

/// Replaces parser tokens in the original SQL text.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenRewriter;

impl TokenRewriter {
    fn table(&self, context: &RewriteContext<'_>, original: &str) -> Result<String, Error> {
        let logic = unquote(original);
        let unit = context.table_unit;

        let actual = match unit.actual_table(logic) {
            Some(actual) => actual.to_string(),
            None => match unit.actual_table_name() {
                Some(other) if context.rule.find_binding_table_rule(logic).is_some() => context
                    .rule
                    .binding_actual_table(unit.data_source_name(), logic, other)?,
                _ => return Ok(original.to_string()),
            },
        };

        Ok(quote_like(original, &actual))
    }

    fn limit(original: &str, revised: Option<i64>) -> String {
        match revised {
            // Parameters are revised in the bound values instead.
            Some(revised) if original.trim().parse::<i64>().is_ok() => revised.to_string(),
            _ => original.to_string(),
        }
    }

    fn validate(sql: &str, tokens: &[&SqlToken]) -> Result<(), Error> {
        let mut previous_end = 0;

        for token in tokens {
            let begin = token.begin();
            let out_of_bounds = || Error::TokenOutOfBounds {
                token: token.original().to_string(),
                begin,
                len: sql.len(),
            };

            let end = token.end().ok_or_else(out_of_bounds)?;
            if end > sql.len() || !sql.is_char_boundary(begin) || !sql.is_char_boundary(end) {
                return Err(out_of_bounds());
            }
            if begin < previous_end {
                return Err(Error::TokenOverlap {
                    token: token.original().to_string(),
                    begin,
                });
            }
            if !sql[begin..end].eq_ignore_ascii_case(token.original()) {
                return Err(Error::TokenMismatch {
                    token: token.original().to_string(),
                    begin,
                });
            }

            previous_end = end;
        }

        Ok(())
    }
}

/// INSERT rows as reported by the parser, with their parameters.
struct Rows<'a> {
    rows: Vec<(&'a SqlToken, Range<usize>)>,
    /// Parameters after the last row, e.g. in `ON DUPLICATE KEY UPDATE`.
    trailing: &'a [Value],
}

impl<'a> Rows<'a> {
    fn new(tokens: &[&'a SqlToken], parameters: &'a [Value]) -> Result<Self, Error> {
        let mut rows = vec![];
        let mut next = 0;

        for token in tokens.iter().copied() {
            if let SqlToken::InsertValues {
                parameters: count, ..
            } = token
            {
                rows.push((token, next..next + *count));
                next += *count;
            }
        }

        let trailing = parameters.get(next..).ok_or(Error::RowParameters {
            expected: next,
            got: parameters.len(),
        })?;

        Ok(Self { rows, trailing })
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Kept rows joined into one VALUES list. Their parameters, and the
    /// generated key if placeholders are used, go into `parameters`.
    fn write(
        &self,
        context: &RewriteContext<'_>,
        parameters: &mut Vec<Value>,
    ) -> Result<String, Error> {
        let mut kept = vec![];

        for (index, (token, range)) in self.rows.iter().enumerate() {
            if !context.keeps_row(index) {
                continue;
            }

            let values = context
                .parameters
                .get(range.clone())
                .ok_or(Error::RowParameters {
                    expected: range.end,
                    got: context.parameters.len(),
                })?;
            parameters.extend_from_slice(values);

            let key = context
                .generated_key
                .and_then(|key| key.values().get(index).copied());

            kept.push(match key {
                Some(key) if values.is_empty() => append(token, &key.to_string())?,
                Some(key) => {
                    parameters.push(Value::Integer(key));
                    append(token, "?")?
                }
                None => token.original().to_string(),
            });
        }

        Ok(kept.join(", "))
    }
}

// Add `value` as the last element of a parenthesized list.
fn append(token: &SqlToken, value: &str) -> Result<String, Error> {
    let original = token.original().trim_end();
    match original.strip_suffix(')') {
        Some(head) if original.starts_with('(') => Ok(format!("{}, {})", head, value)),
        _ => Err(Error::NotParenthesized {
            token: token.original().to_string(),
            begin: token.begin(),
        }),
    }
}

impl SqlRewriter for TokenRewriter {
    fn rewrite(&self, context: &RewriteContext<'_>) -> Result<RewrittenSql, Error> {
        let sql = context.sql;
        let mut tokens = context.statement.tokens().iter().collect::<Vec<_>>();
        tokens.sort_by_key(|token| token.begin());
        Self::validate(sql, &tokens)?;

        let rows = Rows::new(&tokens, context.parameters)?;

        if let Some(key) = context.generated_key {
            let has_columns = tokens
                .iter()
                .any(|token| matches!(token, SqlToken::InsertColumns { .. }));
            if !has_columns || rows.is_empty() {
                return Err(Error::GeneratedKeyPosition(key.column().name.clone()));
            }
            if key.values().len() != rows.len() {
                return Err(Error::GeneratedKeyRows {
                    keys: key.values().len(),
                    rows: rows.len(),
                });
            }
        }

        let mut result = String::with_capacity(sql.len());
        let mut parameters = vec![];
        let mut position = 0;
        // Rows seen so far. All rows are written at the first one,
        // the text between them is dropped.
        let mut row = 0;

        for token in tokens {
            // Validated above.
            let (begin, end) = (token.begin(), token.begin() + token.original().len());
            let is_row = matches!(token, SqlToken::InsertValues { .. });

            if !is_row && row > 0 && row < rows.len() {
                return Err(Error::TokenOverlap {
                    token: token.original().to_string(),
                    begin,
                });
            }

            if !(is_row && row > 0) {
                result.push_str(&sql[position..begin]);
            }

            let replacement = match token {
                SqlToken::Table { original, .. } => self.table(context, original)?,
                SqlToken::Offset { original, .. } => {
                    Self::limit(original, context.limit.and_then(|limit| limit.offset))
                }
                SqlToken::RowCount { original, .. } => {
                    Self::limit(original, context.limit.and_then(|limit| limit.row_count))
                }
                SqlToken::InsertColumns { .. } => match context.generated_key {
                    Some(key) => append(token, &key.column().name)?,
                    None => token.original().to_string(),
                },
                SqlToken::InsertValues { .. } => {
                    row += 1;
                    if row == 1 {
                        rows.write(context, &mut parameters)?
                    } else {
                        String::new()
                    }
                }
            };
            result.push_str(&replacement);

            position = end;
        }

        result.push_str(&sql[position..]);

        if rows.is_empty() {
            parameters = context.parameters.to_vec();
        } else {
            parameters.extend_from_slice(rows.trailing);
        }

        Ok(RewrittenSql {
            sql: result,
            parameters,
        })
    }
}

// Keep the identifier quoting of the original token.
fn quote_like(original: &str, identifier: &str) -> String {
    match original.chars().next() {
        Some('"') => format!("\"{}\"", identifier),
        Some('`') => format!("`{}`", identifier),
        Some('[') => format!("[{}]", identifier),
        _ => identifier.to_string(),
    }
}

#[cfg(test)]
mod test {
    use shardroute_config::Config;

    use super::*;
    use crate::statement::{Column, StatementBuilder};

    const INSERT: &str =
        "INSERT INTO t_order (user_id, status) VALUES (?, ?), (?, ?) ON DUPLICATE KEY UPDATE status = ?";

    fn rule() -> ShardingRule {
        let config = Config::from_toml(
            r#"
[[data_sources]]
name = "ds_0"

[[data_sources]]
name = "ds_1"

[[sharded_tables]]
name = "t_order"
data_nodes = ["ds_${0..1}.t_order_${0..1}"]

[[sharded_tables]]
name = "t_order_item"
data_nodes = ["ds_${0..1}.t_order_item_${0..1}"]

[[binding_tables]]
tables = ["t_order", "t_order_item"]
"#,
        )
        .unwrap();
        ShardingRule::new(&config).unwrap()
    }

    fn rewrite(sql: &str, tokens: Vec<SqlToken>, limit: Option<RevisedLimit>) -> Result<String, Error> {
        let rule = rule();
        let statement = StatementBuilder::default().tokens(tokens).build().unwrap();
        let unit = TableUnit::table("ds_1", "t_order", "t_order_1");
        TokenRewriter
            .rewrite(&RewriteContext {
                sql,
                statement: &statement,
                table_unit: &unit,
                rule: &rule,
                parameters: &[],
                limit,
                generated_key: None,
                rows: &[],
            })
            .map(|rewritten| rewritten.sql)
    }

    fn insert_tokens() -> Vec<SqlToken> {
        vec![
            SqlToken::table(12, "t_order"),
            SqlToken::insert_columns(20, "(user_id, status)"),
            SqlToken::insert_values(45, "(?, ?)", 2),
            SqlToken::insert_values(53, "(?, ?)", 2),
        ]
    }

    fn insert_parameters() -> Vec<Value> {
        vec![
            Value::from(10),
            Value::from("a"),
            Value::from(11),
            Value::from("b"),
            Value::from("c"),
        ]
    }

    fn rewrite_insert(
        sql: &str,
        tokens: Vec<SqlToken>,
        parameters: &[Value],
        generated_key: Option<&GeneratedKey>,
        rows: &[usize],
    ) -> Result<RewrittenSql, Error> {
        let rule = rule();
        let statement = StatementBuilder::default().tokens(tokens).build().unwrap();
        let unit = TableUnit::table("ds_1", "t_order", "t_order_1");
        TokenRewriter.rewrite(&RewriteContext {
            sql,
            statement: &statement,
            table_unit: &unit,
            rule: &rule,
            parameters,
            limit: None,
            generated_key,
            rows,
        })
    }

    fn order_ids(values: Vec<i64>) -> GeneratedKey {
        GeneratedKey::new(Column::new("order_id", "t_order"), values)
    }

    #[test]
    fn test_rewrite_tables() {
        let sql = "SELECT * FROM t_order o JOIN `t_order_item` i ON o.order_id = i.order_id";
        let sql_rewritten = rewrite(
            sql,
            vec![SqlToken::table(14, "t_order"), SqlToken::table(29, "`t_order_item`")],
            None,
        )
        .unwrap();
        assert_eq!(
            sql_rewritten,
            "SELECT * FROM t_order_1 o JOIN `t_order_item_1` i ON o.order_id = i.order_id"
        );
    }

    #[test]
    fn test_rewrite_limit() {
        let sql = "SELECT * FROM t_order LIMIT 10, 5";
        let tokens = vec![
            SqlToken::table(14, "t_order"),
            SqlToken::Offset {
                begin: 28,
                original: "10".into(),
            },
            SqlToken::RowCount {
                begin: 32,
                original: "5".into(),
            },
        ];
        let revised = RevisedLimit {
            offset: Some(0),
            row_count: Some(15),
        };

        assert_eq!(
            rewrite(sql, tokens.clone(), Some(revised)).unwrap(),
            "SELECT * FROM t_order_1 LIMIT 0, 15"
        );
        assert_eq!(
            rewrite(sql, tokens, None).unwrap(),
            "SELECT * FROM t_order_1 LIMIT 10, 5"
        );
    }

    #[test]
    fn test_parameter_limit_untouched() {
        let sql = "SELECT * FROM t_order LIMIT ?";
        let tokens = vec![SqlToken::RowCount {
            begin: 28,
            original: "?".into(),
        }];
        let revised = RevisedLimit {
            offset: None,
            row_count: Some(i64::MAX),
        };
        assert_eq!(rewrite(sql, tokens, Some(revised)).unwrap(), sql);
    }

    #[test]
    fn test_unknown_table_untouched() {
        let sql = "SELECT * FROM t_other";
        assert_eq!(
            rewrite(sql, vec![SqlToken::table(14, "t_other")], None).unwrap(),
            sql
        );
    }

    #[test]
    fn test_insert_rows_split() {
        let parameters = insert_parameters();

        let rewritten = rewrite_insert(INSERT, insert_tokens(), &parameters, None, &[1]).unwrap();
        assert_eq!(
            rewritten.sql,
            "INSERT INTO t_order_1 (user_id, status) VALUES (?, ?) ON DUPLICATE KEY UPDATE status = ?"
        );
        assert_eq!(
            rewritten.parameters,
            vec![Value::from(11), Value::from("b"), Value::from("c")]
        );

        let rewritten = rewrite_insert(INSERT, insert_tokens(), &parameters, None, &[]).unwrap();
        assert_eq!(
            rewritten.sql,
            "INSERT INTO t_order_1 (user_id, status) VALUES (?, ?), (?, ?) ON DUPLICATE KEY UPDATE status = ?"
        );
        assert_eq!(rewritten.parameters, parameters);
    }

    #[test]
    fn test_generated_key_parameter() {
        let key = order_ids(vec![100, 101]);
        let rewritten =
            rewrite_insert(INSERT, insert_tokens(), &insert_parameters(), Some(&key), &[0]).unwrap();

        assert_eq!(
            rewritten.sql,
            "INSERT INTO t_order_1 (user_id, status, order_id) VALUES (?, ?, ?) ON DUPLICATE KEY UPDATE status = ?"
        );
        assert_eq!(
            rewritten.parameters,
            vec![
                Value::from(10),
                Value::from("a"),
                Value::from(100),
                Value::from("c")
            ]
        );
    }

    #[test]
    fn test_generated_key_literal() {
        let sql = "INSERT INTO t_order (user_id) VALUES (10), (11)";
        let tokens = vec![
            SqlToken::table(12, "t_order"),
            SqlToken::insert_columns(20, "(user_id)"),
            SqlToken::insert_values(37, "(10)", 0),
            SqlToken::insert_values(43, "(11)", 0),
        ];
        let key = order_ids(vec![100, 101]);

        let rewritten = rewrite_insert(sql, tokens, &[], Some(&key), &[]).unwrap();
        assert_eq!(
            rewritten.sql,
            "INSERT INTO t_order_1 (user_id, order_id) VALUES (10, 100), (11, 101)"
        );
        assert!(rewritten.parameters.is_empty());
    }

    #[test]
    fn test_generated_key_needs_positions() {
        let key = order_ids(vec![100, 101]);

        let tokens = vec![SqlToken::table(12, "t_order")];
        let err = rewrite_insert(INSERT, tokens, &insert_parameters(), Some(&key), &[]).unwrap_err();
        assert!(matches!(err, Error::GeneratedKeyPosition(column) if column == "order_id"));

        let key = order_ids(vec![100]);
        let err =
            rewrite_insert(INSERT, insert_tokens(), &insert_parameters(), Some(&key), &[]).unwrap_err();
        assert!(matches!(err, Error::GeneratedKeyRows { keys: 1, rows: 2 }));
    }

    #[test]
    fn test_insert_missing_parameters() {
        let parameters = vec![Value::from(10), Value::from("a")];
        let err = rewrite_insert(INSERT, insert_tokens(), &parameters, None, &[]).unwrap_err();
        assert!(matches!(err, Error::RowParameters { expected: 4, got: 2 }));
    }

    #[test]
    fn test_token_out_of_bounds() {
        let err = rewrite("SELECT 1", vec![SqlToken::table(7, "t_order")], None).unwrap_err();
        assert!(matches!(err, Error::TokenOutOfBounds { begin: 7, len: 8, .. }));

        let err = rewrite("SELECT 1", vec![SqlToken::table(usize::MAX - 2, "t_order")], None)
            .unwrap_err();
        assert!(matches!(err, Error::TokenOutOfBounds { .. }));

        let err = rewrite("SELECT * FROM t_users", vec![SqlToken::table(14, "t_order")], None)
            .unwrap_err();
        assert!(matches!(err, Error::TokenMismatch { .. }));
    }
}
