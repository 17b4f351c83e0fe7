//! Integration tests running real routine calls against PostgreSQL.
//!
//! These tests require a PostgreSQL 14+ instance.
//! Run with: cargo test --features postgres-tests
//!
//! Prerequisites:
//! 1. Create test database: `createdb -U postgres routine_call_test`
//! 2. Or point `DATABASE_URL` at any database the tests may create routines in

#![cfg(feature = "postgres-tests")]

use std::error::Error;
use std::sync::{Arc, OnceLock};

use postgres::{Client, NoTls};
use rust_decimal::Decimal;

use routine_call::backend::PostgresBackend;
use routine_call::call::{
    CallExecutor, ResultEnvelope, ReturnShape, Value, ValueKind, build_function,
    build_procedure,
};
use routine_call::error_log::TracingErrorLog;

/// Test connection string for PostgreSQL (local instance)
const PG_CONNECTION: &str = "host=localhost user=postgres dbname=routine_call_test";

const SCHEMA: &str = r#"
DROP TABLE IF EXISTS rc_items;
CREATE TABLE rc_items (id integer PRIMARY KEY, label text NOT NULL);

CREATE OR REPLACE FUNCTION rc_double(n integer) RETURNS integer
    LANGUAGE sql AS $$ SELECT n * 2 $$;

CREATE OR REPLACE FUNCTION rc_items_upto(n integer)
    RETURNS TABLE (id integer, label text, added date)
    LANGUAGE sql AS $$
        SELECT g, 'item ' || g, DATE '2024-01-01' + g
        FROM generate_series(1, n) AS g
    $$;

CREATE OR REPLACE PROCEDURE rc_totals(
    price numeric, qty integer, OUT subtotal numeric, OUT tax numeric)
    LANGUAGE plpgsql AS $$
    BEGIN
        subtotal := price * qty;
        tax := round(subtotal * 0.07, 2);
    END
    $$;

CREATE OR REPLACE PROCEDURE rc_add_item(item_id integer, item_label text)
    LANGUAGE sql AS $$ INSERT INTO rc_items VALUES (item_id, item_label) $$;
"#;

fn connection_string() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| PG_CONNECTION.to_string())
}

/// Create the test routines once per test binary.
fn setup() -> &'static Result<(), String> {
    static SETUP: OnceLock<Result<(), String>> = OnceLock::new();
    SETUP.get_or_init(|| {
        let mut client = Client::connect(&connection_string(), NoTls).map_err(|e| e.to_string())?;
        client.batch_execute(SCHEMA).map_err(|e| e.to_string())
    })
}

fn executor() -> Result<CallExecutor, Box<dyn Error>> {
    setup().clone()?;
    let backend = PostgresBackend::new(&connection_string())?;
    Ok(CallExecutor::new(Arc::new(backend), Arc::new(TracingErrorLog)))
}

#[test]
fn test_scalar_function() -> Result<(), Box<dyn Error>> {
    let executor = executor()?;
    let descriptor = build_function(
        "rc_double(?)",
        &[ValueKind::Integer],
        &[],
        &["Number"],
        &[ValueKind::Integer],
        ReturnShape::Scalar,
    )?;

    let envelope = executor.invoke(&descriptor, &[Some(Value::Integer(21))]);

    assert_eq!(envelope.scalar(), Some(&Value::Integer(42)));
    Ok(())
}

#[test]
fn test_tabular_function() -> Result<(), Box<dyn Error>> {
    let executor = executor()?;
    let descriptor = build_function(
        "rc_items_upto(?)",
        &[ValueKind::Integer],
        &[],
        &["Count"],
        &[ValueKind::Integer, ValueKind::Text, ValueKind::Date],
        ReturnShape::Tabular,
    )?;

    let rows = executor
        .invoke(&descriptor, &[Some(Value::Integer(3))])
        .into_rows()
        .ok_or("expected success")?;

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2][0], Some(Value::Integer(3)));
    assert_eq!(rows[2][1], Some(Value::Text("item 3".to_string())));
    assert_eq!(rows[2][2].as_ref().map(ToString::to_string).as_deref(), Some("2024-01-04"));

    let empty = executor.invoke(&descriptor, &[Some(Value::Integer(0))]);
    assert_eq!(empty, ResultEnvelope::Success { rows: vec![] });
    Ok(())
}

#[test]
fn test_procedure_outputs() -> Result<(), Box<dyn Error>> {
    let executor = executor()?;
    let descriptor = build_procedure(
        "rc_totals(?, ?, ?, ?)",
        &[
            ValueKind::DecimalText,
            ValueKind::Integer,
            ValueKind::DecimalText,
            ValueKind::DecimalText,
        ],
        &[],
        &["Price", "Quantity", "Subtotal", "Tax"],
        &[3, 4],
    )?;

    let envelope = executor.invoke(
        &descriptor,
        &[Some(Value::from("12.50")), Some(Value::Integer(2))],
    );

    assert_eq!(
        envelope.first_row(),
        Some(&vec![
            Some(Value::Decimal(Decimal::new(2500, 2))),
            Some(Value::Decimal(Decimal::new(175, 2))),
        ])
    );
    Ok(())
}

#[test]
fn test_malformed_decimal_never_reaches_database() -> Result<(), Box<dyn Error>> {
    let executor = executor()?;
    let descriptor = build_procedure(
        "rc_totals(?, ?, ?, ?)",
        &[
            ValueKind::DecimalText,
            ValueKind::Integer,
            ValueKind::DecimalText,
            ValueKind::DecimalText,
        ],
        &[],
        &["Price", "Quantity", "Subtotal", "Tax"],
        &[3, 4],
    )?;

    let envelope = executor.invoke(
        &descriptor,
        &[Some(Value::from("twelve")), Some(Value::Integer(2))],
    );

    assert_eq!(
        envelope,
        ResultEnvelope::ParamFailure {
            index: 0,
            name: "Price".to_string()
        }
    );
    Ok(())
}

#[test]
fn test_constraint_violation_is_rejected() -> Result<(), Box<dyn Error>> {
    let executor = executor()?;
    let descriptor = build_procedure(
        "rc_add_item(?, ?)",
        &[ValueKind::Integer, ValueKind::Text],
        &[],
        &["Item", "Label"],
        &[],
    )?;
    let values = [Some(Value::Integer(9001)), Some(Value::from("first"))];

    let first = executor.invoke(&descriptor, &values);
    let second = executor.invoke(&descriptor, &values);

    assert_eq!(first, ResultEnvelope::Success { rows: vec![vec![]] });
    assert_eq!(second, ResultEnvelope::RequestRejected);
    Ok(())
}

#[test]
fn test_unreachable_server_is_connection_failure() -> Result<(), Box<dyn Error>> {
    let backend = PostgresBackend::new("host=127.0.0.1 port=1 user=nobody connect_timeout=1")?;
    let executor = CallExecutor::new(Arc::new(backend), Arc::new(TracingErrorLog));
    let descriptor = build_function(
        "rc_double(?)",
        &[ValueKind::Integer],
        &[],
        &["Number"],
        &[ValueKind::Integer],
        ReturnShape::Scalar,
    )?;

    let envelope = executor.invoke(&descriptor, &[Some(Value::Integer(1))]);

    assert_eq!(envelope, ResultEnvelope::ConnectionFailure);
    Ok(())
}
