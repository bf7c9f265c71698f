use super::setup::*;
use crate::router::Error;
use crate::statement::{
    AndCondition, Column, Condition, ConditionValue, GeneratedKeyCondition, Insert, OrCondition,
    SqlToken, Statement, StatementBuilder, StatementKind, Table, Value,
};

const INSERT: &str = "INSERT INTO t_order (user_id, status) VALUES (?, ?)";
const INSERT_TWO: &str = "INSERT INTO t_order (user_id, status) VALUES (?, ?), (?, ?)";

fn user_id(value: impl Into<ConditionValue>) -> AndCondition {
    AndCondition::from(vec![Condition::equal(
        Column::new("user_id", "t_order"),
        value,
    )])
}

// `(user_id, status)` then one `(?, ?)` per row.
fn insert(rows: Vec<AndCondition>) -> Statement {
    let mut tokens = vec![
        SqlToken::table(12, "t_order"),
        SqlToken::insert_columns(20, "(user_id, status)"),
    ];
    for row in 0..rows.len() {
        tokens.push(SqlToken::insert_values(45 + row * 8, "(?, ?)", 2));
    }

    StatementBuilder::default()
        .kind(StatementKind::Insert)
        .tables(vec![Table::from("t_order")])
        .insert(Insert {
            values: rows.len(),
            ..Default::default()
        })
        .conditions(OrCondition::from(rows))
        .tokens(tokens)
        .build()
        .unwrap()
}

#[test]
fn test_insert_generates_key() {
    let mut test = RouterTest::new();

    let result = test.execute(
        INSERT,
        &[Value::from(10), Value::from("init")],
        insert(vec![user_id(ConditionValue::Parameter(0))]),
    );

    let key = result.generated_key().unwrap();
    assert_eq!(key.column(), &Column::new("order_id", "t_order"));
    assert_eq!(key.values(), &[1]);
    assert_eq!(
        units(&result),
        vec!["ds_0: INSERT INTO t_order_1 (user_id, status, order_id) VALUES (?, ?, ?)"]
    );
    assert_eq!(
        result.route_units()[0].parameters,
        vec![Value::from(10), Value::from("init"), Value::from(1)]
    );
}

#[test]
fn test_generated_keys_accumulate_in_session() {
    let mut test = RouterTest::new();

    let first = test.execute(
        INSERT_TWO,
        &[
            Value::from(10),
            Value::from("a"),
            Value::from(11),
            Value::from("b"),
        ],
        insert(vec![
            user_id(ConditionValue::Parameter(0)),
            user_id(ConditionValue::Parameter(2)),
        ]),
    );
    assert_eq!(first.generated_key().unwrap().values(), &[1, 2]);
    assert_eq!(
        units(&first),
        vec![
            "ds_0: INSERT INTO t_order_1 (user_id, status, order_id) VALUES (?, ?, ?)",
            "ds_1: INSERT INTO t_order_0 (user_id, status, order_id) VALUES (?, ?, ?)",
        ]
    );
    assert_eq!(
        first.route_units()[0].parameters,
        vec![Value::from(10), Value::from("a"), Value::from(1)]
    );
    assert_eq!(
        first.route_units()[1].parameters,
        vec![Value::from(11), Value::from("b"), Value::from(2)]
    );

    let second = test.execute(
        INSERT,
        &[Value::from(12), Value::from("c")],
        insert(vec![user_id(ConditionValue::Parameter(0))]),
    );
    assert_eq!(second.generated_key().unwrap().values(), &[1, 2, 3]);
    assert_eq!(
        units(&second),
        vec!["ds_0: INSERT INTO t_order_1 (user_id, status, order_id) VALUES (?, ?, ?)"]
    );
    assert_eq!(
        second.route_units()[0].parameters,
        vec![Value::from(12), Value::from("c"), Value::from(3)]
    );
    assert_eq!(test.session.generated_keys(), &[1, 2, 3]);
}

#[test]
fn test_insert_with_supplied_key() {
    let mut test = RouterTest::new();
    let sql = "INSERT INTO t_order (user_id, order_id) VALUES (?, ?)";

    let statement = StatementBuilder::default()
        .kind(StatementKind::Insert)
        .tables(vec![Table::from("t_order")])
        .insert(Insert {
            generate_key_column_index: Some(1),
            generated_key_conditions: vec![GeneratedKeyCondition {
                column: Column::new("order_id", "t_order"),
                value: ConditionValue::Parameter(1),
            }],
            values: 1,
        })
        .conditions(OrCondition::from(vec![user_id(ConditionValue::Parameter(0))]))
        .tokens(vec![SqlToken::table(12, "t_order")])
        .build()
        .unwrap();

    let result = test.execute(sql, &[Value::from(10), Value::from(7)], statement);

    assert_eq!(result.generated_key().unwrap().values(), &[7]);
    assert_eq!(
        units(&result),
        vec!["ds_0: INSERT INTO t_order_1 (user_id, order_id) VALUES (?, ?)"]
    );
}

#[test]
fn test_insert_supplied_key_count_mismatch() {
    let mut test = RouterTest::new();

    let statement = StatementBuilder::default()
        .kind(StatementKind::Insert)
        .tables(vec![Table::from("t_order")])
        .insert(Insert {
            generate_key_column_index: Some(1),
            generated_key_conditions: vec![GeneratedKeyCondition {
                column: Column::new("order_id", "t_order"),
                value: ConditionValue::from(1),
            }],
            values: 2,
        })
        .build()
        .unwrap();

    let err = test.route(INSERT_TWO, &[], statement).unwrap_err();
    assert!(matches!(err, Error::GeneratedKeyCount { keys: 1, rows: 2 }));
    assert!(test.session.generated_keys().is_empty());
}

#[test]
fn test_insert_without_key_generator() {
    let mut test = RouterTest::new();
    let sql = "INSERT INTO t_order_item (user_id, order_id) VALUES (1, 1)";

    let statement = StatementBuilder::default()
        .kind(StatementKind::Insert)
        .tables(vec![Table::from("t_order_item")])
        .insert(Insert {
            values: 1,
            ..Default::default()
        })
        .conditions(OrCondition::from(vec![
            Condition::equal(Column::new("user_id", "t_order_item"), 1),
            Condition::equal(Column::new("order_id", "t_order_item"), 1),
        ]))
        .tokens(vec![SqlToken::table(12, "t_order_item")])
        .build()
        .unwrap();

    let result = test.execute(sql, &[], statement);
    assert!(result.generated_key().is_none());
    assert_eq!(
        units(&result),
        vec!["ds_1: INSERT INTO t_order_item_1 (user_id, order_id) VALUES (1, 1)"]
    );
}

#[test]
fn test_snowflake_key_routes_insert() {
    let mut test = RouterTest::new();
    let sql = "INSERT INTO t_user (name) VALUES ('alice')";

    let statement = StatementBuilder::default()
        .kind(StatementKind::Insert)
        .tables(vec![Table::from("t_user")])
        .insert(Insert {
            values: 1,
            ..Default::default()
        })
        .tokens(vec![
            SqlToken::table(12, "t_user"),
            SqlToken::insert_columns(19, "(name)"),
            SqlToken::insert_values(33, "('alice')", 0),
        ])
        .build()
        .unwrap();

    let result = test.execute(sql, &[], statement);
    let key = result.generated_key().unwrap().values()[0];
    assert!(key > 0);

    let expected = format!("ds_{}", key % 2);
    assert_eq!(result.route_units().len(), 1);
    assert_eq!(result.route_units()[0].data_source, expected);
    assert_eq!(
        result.route_units()[0].sql,
        format!("INSERT INTO t_user (name, user_id) VALUES ('alice', {})", key)
    );
}

#[test]
fn test_rows_split_by_shard() {
    let mut test = RouterTest::new();
    let sql = "INSERT INTO t_order (user_id, status) VALUES (?, ?), (?, ?), (?, ?)";

    let result = test.execute(
        sql,
        &[
            Value::from(10),
            Value::from("a"),
            Value::from(11),
            Value::from("b"),
            Value::from(12),
            Value::from("c"),
        ],
        insert(vec![
            user_id(ConditionValue::Parameter(0)),
            user_id(ConditionValue::Parameter(2)),
            user_id(ConditionValue::Parameter(4)),
        ]),
    );

    // Keys 1, 2, 3 pick t_order_1, t_order_0, t_order_1.
    assert_eq!(
        units(&result),
        vec![
            "ds_0: INSERT INTO t_order_1 (user_id, status, order_id) VALUES (?, ?, ?), (?, ?, ?)",
            "ds_1: INSERT INTO t_order_0 (user_id, status, order_id) VALUES (?, ?, ?)",
        ]
    );
    assert_eq!(
        result.route_units()[0].parameters,
        vec![
            Value::from(10),
            Value::from("a"),
            Value::from(1),
            Value::from(12),
            Value::from("c"),
            Value::from(3),
        ]
    );
    assert_eq!(
        result.route_units()[1].parameters,
        vec![Value::from(11), Value::from("b"), Value::from(2)]
    );
}

#[test]
fn test_supplied_key_rows_split() {
    let mut test = RouterTest::new();
    let sql = "INSERT INTO t_order (user_id, order_id) VALUES (1, 1), (2, 2)";

    let statement = StatementBuilder::default()
        .kind(StatementKind::Insert)
        .tables(vec![Table::from("t_order")])
        .insert(Insert {
            generate_key_column_index: Some(1),
            generated_key_conditions: vec![
                GeneratedKeyCondition {
                    column: Column::new("order_id", "t_order"),
                    value: ConditionValue::from(1),
                },
                GeneratedKeyCondition {
                    column: Column::new("order_id", "t_order"),
                    value: ConditionValue::from(2),
                },
            ],
            values: 2,
        })
        .conditions(OrCondition::from(vec![user_id(1), user_id(2)]))
        .tokens(vec![
            SqlToken::table(12, "t_order"),
            SqlToken::insert_columns(20, "(user_id, order_id)"),
            SqlToken::insert_values(47, "(1, 1)", 0),
            SqlToken::insert_values(55, "(2, 2)", 0),
        ])
        .build()
        .unwrap();

    let result = test.execute(sql, &[], statement);
    assert_eq!(
        units(&result),
        vec![
            "ds_1: INSERT INTO t_order_1 (user_id, order_id) VALUES (1, 1)",
            "ds_0: INSERT INTO t_order_0 (user_id, order_id) VALUES (2, 2)",
        ]
    );
}
