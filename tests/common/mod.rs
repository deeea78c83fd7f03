//! Shared fixtures for warehouse and pipeline tests.
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use revanta::config::FailurePolicy;
use revanta::schema;
use revanta::store::Warehouse;
use revanta::warehouse::{BuildContext, BuildReport, Orchestrator};
use rusqlite::params;

/// Fixed reference time used by every test build.
pub fn as_of() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 4, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn ctx() -> BuildContext {
    BuildContext::new(as_of())
}

/// In-memory warehouse with the schema applied and empty staging.
pub fn warehouse() -> Warehouse {
    let mut wh = Warehouse::open_in_memory().unwrap();
    schema::apply(&mut wh).unwrap();
    wh
}

pub fn customer(wh: &Warehouse, customer_id: &str, unique_id: &str) {
    wh.connection()
        .execute(
            "INSERT INTO stg_customers (customer_id, customer_unique_id, customer_zip_code_prefix, customer_city, customer_state)
             VALUES (?1, ?2, '01000', 'sao paulo', 'SP')",
            params![customer_id, unique_id],
        )
        .unwrap();
}

pub fn order(wh: &Warehouse, order_id: &str, customer_id: &str, status: &str, purchased: &str) {
    wh.connection()
        .execute(
            "INSERT INTO stg_orders (order_id, customer_id, order_status, order_purchase_timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![order_id, customer_id, status, purchased],
        )
        .unwrap();
}

pub fn delivered(wh: &Warehouse, order_id: &str, at: &str) {
    wh.connection()
        .execute(
            "UPDATE stg_orders SET order_delivered_customer_date = ?2 WHERE order_id = ?1",
            params![order_id, at],
        )
        .unwrap();
}

pub fn item(wh: &Warehouse, order_id: &str, seq: i64, product_id: &str, price: f64, freight: f64) {
    wh.connection()
        .execute(
            "INSERT INTO stg_order_items (order_id, order_item_id, product_id, seller_id, price, freight_value, item_total_value)
             VALUES (?1, ?2, ?3, 's1', ?4, ?5, ?6)",
            params![order_id, seq, product_id, price, freight, price + freight],
        )
        .unwrap();
}

pub fn product(wh: &Warehouse, product_id: &str, category: &str) {
    wh.connection()
        .execute(
            "INSERT INTO stg_products (product_id, product_category_name, product_photos_qty, product_weight_g)
             VALUES (?1, ?2, 1, 500)",
            params![product_id, category],
        )
        .unwrap();
}

pub fn translation(wh: &Warehouse, category: &str, english: &str) {
    wh.connection()
        .execute(
            "INSERT INTO stg_category_translation (product_category_name, product_category_name_english)
             VALUES (?1, ?2)",
            params![category, english],
        )
        .unwrap();
}

/// A small but complete staging data set: three customers, two products,
/// five orders across two months.
pub fn seed(wh: &Warehouse) {
    customer(wh, "c1", "u1");
    customer(wh, "c2", "u2");
    customer(wh, "c3", "u3");
    product(wh, "p1", "beleza_saude");
    product(wh, "p2", "informatica_acessorios");
    translation(wh, "beleza_saude", "health_beauty");
    translation(wh, "informatica_acessorios", "computers_accessories");

    order(wh, "o1", "c1", "delivered", "2024-01-10 09:00:00");
    delivered(wh, "o1", "2024-01-15 12:00:00");
    item(wh, "o1", 1, "p1", 40.0, 5.0);
    item(wh, "o1", 2, "p2", 100.0, 10.0);

    order(wh, "o2", "c1", "shipped", "2024-03-02 14:30:00");
    item(wh, "o2", 1, "p1", 40.0, 5.0);

    order(wh, "o3", "c2", "delivered", "2024-01-20 08:00:00");
    delivered(wh, "o3", "2024-01-28 18:00:00");
    item(wh, "o3", 1, "p2", 120.0, 12.0);

    order(wh, "o4", "c2", "canceled", "2024-02-05 10:00:00");
    item(wh, "o4", 1, "p2", 999.0, 1.0);

    order(wh, "o5", "c3", "approved", "2024-03-20 11:00:00");
    item(wh, "o5", 1, "p1", 35.5, 4.5);
}

pub fn build(wh: &mut Warehouse) -> BuildReport {
    Orchestrator::new(ctx()).unwrap().run(wh).unwrap()
}

pub fn build_with(wh: &mut Warehouse, policy: FailurePolicy) -> BuildReport {
    Orchestrator::new(ctx().with_failure_policy(policy))
        .unwrap()
        .run(wh)
        .unwrap()
}

pub fn query_i64(wh: &Warehouse, sql: &str) -> i64 {
    wh.connection().query_row(sql, [], |row| row.get(0)).unwrap()
}

pub fn query_f64(wh: &Warehouse, sql: &str) -> f64 {
    wh.connection().query_row(sql, [], |row| row.get(0)).unwrap()
}

pub fn query_opt_i64(wh: &Warehouse, sql: &str) -> Option<i64> {
    wh.connection().query_row(sql, [], |row| row.get(0)).unwrap()
}

pub fn query_opt_f64(wh: &Warehouse, sql: &str) -> Option<f64> {
    wh.connection().query_row(sql, [], |row| row.get(0)).unwrap()
}

pub fn query_string(wh: &Warehouse, sql: &str) -> String {
    wh.connection().query_row(sql, [], |row| row.get(0)).unwrap()
}

pub fn query_opt_string(wh: &Warehouse, sql: &str) -> Option<String> {
    wh.connection().query_row(sql, [], |row| row.get(0)).unwrap()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}
