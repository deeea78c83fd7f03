#[path = "../common/mod.rs"]
mod common;

use chrono::Duration;
use common::*;
use revanta::store::Warehouse;
use revanta::warehouse::{BuildContext, Orchestrator};

// ============================================================================
// Marts
// ============================================================================

#[test]
fn test_monthly_sales_rollup() {
    let mut wh = warehouse();
    seed(&wh);
    build(&mut wh);

    // The only February order is canceled.
    assert_eq!(query_i64(&wh, "SELECT COUNT(*) FROM mart_monthly_sales"), 2);

    let jan = |column: &str| {
        query_f64(
            &wh,
            &format!("SELECT {} FROM mart_monthly_sales WHERE year_month = '2024-01'", column),
        )
    };
    assert_close(jan("total_orders"), 2.0);
    assert_close(jan("unique_customers"), 2.0);
    assert_close(jan("total_items"), 3.0);
    assert_close(jan("total_revenue"), 287.0);
    assert_close(jan("total_freight"), 27.0);
    assert_close(jan("avg_order_value"), 143.5);

    assert_close(
        query_f64(&wh, "SELECT total_revenue FROM mart_monthly_sales WHERE year_month = '2024-03'"),
        85.0,
    );
    assert_close(
        query_f64(&wh, "SELECT avg_order_value FROM mart_monthly_sales WHERE year_month = '2024-03'"),
        42.5,
    );
}

#[test]
fn test_product_sales_rollup() {
    let mut wh = warehouse();
    seed(&wh);
    build(&mut wh);

    assert_eq!(
        query_i64(&wh, "SELECT units_sold FROM mart_product_sales WHERE product_id = 'p1'"),
        3
    );
    assert_close(
        query_f64(&wh, "SELECT total_revenue FROM mart_product_sales WHERE product_id = 'p1'"),
        115.5,
    );
    assert_close(
        query_f64(&wh, "SELECT total_freight FROM mart_product_sales WHERE product_id = 'p1'"),
        14.5,
    );
    assert_eq!(
        query_string(&wh, "SELECT category_english FROM mart_product_sales WHERE product_id = 'p2'"),
        "computers_accessories"
    );
}

// ============================================================================
// Monthly revenue
// ============================================================================

#[test]
fn test_monthly_revenue_growth() {
    let mut wh = warehouse();
    seed(&wh);
    build(&mut wh);

    assert_eq!(
        query_opt_f64(
            &wh,
            "SELECT previous_month_revenue FROM analytics_monthly_revenue WHERE year_month = '2024-01'"
        ),
        None
    );
    assert_eq!(
        query_opt_f64(
            &wh,
            "SELECT mom_growth_pct FROM analytics_monthly_revenue WHERE year_month = '2024-01'"
        ),
        None
    );

    // March follows January: February had no sales.
    let march = |column: &str| {
        query_f64(
            &wh,
            &format!(
                "SELECT {} FROM analytics_monthly_revenue WHERE year_month = '2024-03'",
                column
            ),
        )
    };
    assert_close(march("previous_month_revenue"), 287.0);
    assert_close(march("mom_growth_pct"), -70.38);
    assert_close(march("cumulative_revenue"), 372.0);
}

// ============================================================================
// Risk scoring
// ============================================================================

fn single_order_customer(spend_price: f64, purchased: &str) -> Warehouse {
    let mut wh = warehouse();
    customer(&wh, "c1", "u1");
    order(&wh, "o1", "c1", "delivered", purchased);
    item(&wh, "o1", 1, "p1", spend_price, 10.0);
    build(&mut wh);
    wh
}

#[test]
fn test_risk_critical_above_spend_threshold() {
    // 91 days before 2024-04-01, lifetime value 501.
    let wh = single_order_customer(491.0, "2024-01-01 10:00:00");

    assert_eq!(
        query_i64(&wh, "SELECT days_since_last_purchase FROM analytics_customer_risk_scoring"),
        91
    );
    assert_eq!(
        query_string(&wh, "SELECT risk_category FROM analytics_customer_risk_scoring"),
        "CRITICAL"
    );
    assert_eq!(
        query_string(&wh, "SELECT risk_reason FROM analytics_customer_risk_scoring"),
        "Inactive > 90 days"
    );
    assert_eq!(query_i64(&wh, "SELECT alert_flag FROM analytics_customer_risk_scoring"), 1);
    assert_close(
        query_f64(&wh, "SELECT risk_score FROM analytics_customer_risk_scoring"),
        0.5,
    );
}

#[test]
fn test_risk_high_at_spend_threshold() {
    let wh = single_order_customer(490.0, "2024-01-01 10:00:00");

    assert_eq!(
        query_string(&wh, "SELECT risk_category FROM analytics_customer_risk_scoring"),
        "HIGH"
    );
    assert_eq!(query_i64(&wh, "SELECT alert_flag FROM analytics_customer_risk_scoring"), 0);
}

#[test]
fn test_risk_medium_at_ninety_days() {
    let wh = single_order_customer(991.0, "2024-01-02 10:00:00");

    assert_eq!(
        query_i64(&wh, "SELECT days_since_last_purchase FROM analytics_customer_risk_scoring"),
        90
    );
    assert_eq!(
        query_string(&wh, "SELECT risk_category FROM analytics_customer_risk_scoring"),
        "MEDIUM"
    );
    assert_eq!(query_i64(&wh, "SELECT alert_flag FROM analytics_customer_risk_scoring"), 0);
}

#[test]
fn test_risk_and_dimension_agree_on_recency_mid_day() {
    let mut wh = warehouse();
    customer(&wh, "c1", "u1");
    order(&wh, "o1", "c1", "delivered", "2024-01-02 10:00:00");
    item(&wh, "o1", 1, "p1", 991.0, 10.0);
    Orchestrator::new(BuildContext::new(as_of() + Duration::hours(12)))
        .unwrap()
        .run(&mut wh)
        .unwrap();

    assert_eq!(
        query_i64(&wh, "SELECT days_since_last_purchase FROM analytics_customer_risk_scoring"),
        90
    );
    assert_eq!(query_i64(&wh, "SELECT is_active FROM dim_customers"), 1);
    assert_eq!(
        query_string(&wh, "SELECT risk_category FROM analytics_customer_risk_scoring"),
        "MEDIUM"
    );
    // 90/365 * 0.4 + 0.3 for a single order, with no inactivity term.
    assert_close(
        query_f64(&wh, "SELECT risk_score FROM analytics_customer_risk_scoring"),
        0.4,
    );
    assert_eq!(
        query_string(&wh, "SELECT risk_reason FROM analytics_customer_risk_scoring"),
        "Low purchase frequency"
    );
}

#[test]
fn test_risk_without_counted_orders() {
    let mut wh = warehouse();
    customer(&wh, "c1", "u1");
    order(&wh, "o1", "c1", "canceled", "2024-03-01 10:00:00");
    item(&wh, "o1", 1, "p1", 900.0, 10.0);
    build(&mut wh);

    assert_eq!(
        query_opt_i64(&wh, "SELECT days_since_last_purchase FROM analytics_customer_risk_scoring"),
        None
    );
    assert_eq!(
        query_string(&wh, "SELECT risk_category FROM analytics_customer_risk_scoring"),
        "HIGH"
    );
    assert_eq!(
        query_string(&wh, "SELECT risk_reason FROM analytics_customer_risk_scoring"),
        "No qualifying purchases"
    );
    assert_eq!(query_i64(&wh, "SELECT alert_flag FROM analytics_customer_risk_scoring"), 0);
    assert_close(
        query_f64(&wh, "SELECT risk_score FROM analytics_customer_risk_scoring"),
        1.0,
    );
    assert_eq!(
        query_opt_f64(&wh, "SELECT average_order_value FROM analytics_customer_risk_scoring"),
        None
    );
}

#[test]
fn test_risk_for_seeded_customers() {
    let mut wh = warehouse();
    seed(&wh);
    build(&mut wh);

    let category = |uid: &str| {
        query_string(
            &wh,
            &format!(
                "SELECT risk_category FROM analytics_customer_risk_scoring WHERE customer_unique_id = '{}'",
                uid
            ),
        )
    };
    assert_eq!(category("u1"), "VERY_LOW");
    assert_eq!(category("u2"), "MEDIUM");
    assert_eq!(category("u3"), "VERY_LOW");

    assert_eq!(
        query_string(
            &wh,
            "SELECT risk_reason FROM analytics_customer_risk_scoring WHERE customer_unique_id = 'u1'"
        ),
        "Low purchase frequency"
    );
    assert_close(
        query_f64(
            &wh,
            "SELECT risk_score FROM analytics_customer_risk_scoring WHERE customer_unique_id = 'u3'"
        ),
        0.51,
    );
    assert_eq!(
        query_i64(&wh, "SELECT SUM(alert_flag) FROM analytics_customer_risk_scoring"),
        0
    );
}

// ============================================================================
// RFM
// ============================================================================

/// Five customers where customer k has k orders worth 10 each, and a
/// later customer number means a more recent last purchase.
fn rfm_warehouse() -> Warehouse {
    let mut wh = warehouse();
    let last_purchase = [
        "2023-12-01 10:00:00",
        "2024-01-15 10:00:00",
        "2024-02-15 10:00:00",
        "2024-03-01 10:00:00",
        "2024-03-25 10:00:00",
    ];
    for (i, last) in last_purchase.iter().enumerate() {
        let k = i + 1;
        let cid = format!("c{}", k);
        customer(&wh, &cid, &format!("u{}", k));
        for n in 1..k {
            let oid = format!("o{}_{}", k, n);
            order(&wh, &oid, &cid, "delivered", &format!("2023-11-{:02} 10:00:00", n));
            item(&wh, &oid, 1, "p1", 10.0, 0.0);
        }
        let oid = format!("o{}_last", k);
        order(&wh, &oid, &cid, "delivered", last);
        item(&wh, &oid, 1, "p1", 10.0, 0.0);
    }
    // Never purchased: excluded from segmentation.
    customer(&wh, "c6", "u6");
    build(&mut wh);
    wh
}

#[test]
fn test_rfm_scores_and_segments() {
    let wh = rfm_warehouse();

    assert_eq!(query_i64(&wh, "SELECT COUNT(*) FROM analytics_customer_rfm"), 5);

    let field = |uid: &str, column: &str| {
        query_string(
            &wh,
            &format!(
                "SELECT {} FROM analytics_customer_rfm WHERE customer_unique_id = '{}'",
                column, uid
            ),
        )
    };
    assert_eq!(field("u5", "rfm_score"), "555");
    assert_eq!(field("u5", "segment"), "Champions");
    assert_eq!(field("u4", "segment"), "Champions");
    assert_eq!(field("u3", "segment"), "Loyal Customers");
    assert_eq!(field("u2", "segment"), "Hibernating");
    assert_eq!(field("u1", "rfm_score"), "111");
    assert_eq!(field("u1", "segment"), "Hibernating");

    assert_eq!(
        query_i64(
            &wh,
            "SELECT recency_days FROM analytics_customer_rfm WHERE customer_unique_id = 'u5'"
        ),
        7
    );
    assert_close(
        query_f64(&wh, "SELECT monetary FROM analytics_customer_rfm WHERE customer_unique_id = 'u4'"),
        40.0,
    );
}

#[test]
fn test_rfm_scores_are_in_range() {
    let mut wh = warehouse();
    seed(&wh);
    build(&mut wh);

    assert_eq!(
        query_i64(
            &wh,
            "SELECT COUNT(*) FROM analytics_customer_rfm
             WHERE r_score NOT BETWEEN 1 AND 5
                OR f_score NOT BETWEEN 1 AND 5
                OR m_score NOT BETWEEN 1 AND 5"
        ),
        0
    );
}

// ============================================================================
// Product performance
// ============================================================================

#[test]
fn test_product_performance() {
    let mut wh = warehouse();
    seed(&wh);
    build(&mut wh);

    let p = |product: &str, column: &str| {
        query_f64(
            &wh,
            &format!(
                "SELECT {} FROM analytics_product_performance WHERE product_id = '{}'",
                column, product
            ),
        )
    };
    assert_close(p("p1", "total_units_sold"), 3.0);
    assert_close(p("p1", "total_revenue"), 130.0);
    assert_close(p("p1", "avg_price"), 38.5);
    // Order lines are not filtered by status.
    assert_close(p("p2", "total_revenue"), 1242.0);
    assert_close(p("p2", "avg_price"), 406.33);
}
