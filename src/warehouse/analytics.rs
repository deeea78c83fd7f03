//! Analytics models: the reporting tables handed to BI.
//!
//! Every time-relative column is computed against the run's `:as_of`.

use super::Model;
use crate::schema::tables;

/// Recency/frequency/monetary quintiles per purchasing customer.
///
/// Quintile ties are broken by `customer_sk` so rebuilds are reproducible.
pub static ANALYTICS_CUSTOMER_RFM: Model = Model {
    target: &tables::ANALYTICS_CUSTOMER_RFM,
    depends_on: &["dim_customers"],
    description: "RFM segmentation",
    insert_sql: "
        INSERT INTO analytics_customer_rfm (
            customer_sk,
            customer_unique_id,
            recency_days,
            frequency,
            monetary,
            r_score,
            f_score,
            m_score,
            rfm_score,
            segment
        )
        WITH base AS (
            SELECT
                customer_sk,
                customer_unique_id,
                CAST(julianday(:as_of) - julianday(last_order_date) AS INTEGER) AS recency_days,
                total_orders AS frequency,
                ROUND(total_spent, 2) AS monetary
            FROM dim_customers
            WHERE total_orders > 0
              AND last_order_date IS NOT NULL
        ),
        scored AS (
            SELECT
                base.*,
                NTILE(5) OVER (ORDER BY recency_days DESC, customer_sk) AS r_score,
                NTILE(5) OVER (ORDER BY frequency, customer_sk) AS f_score,
                NTILE(5) OVER (ORDER BY monetary, customer_sk) AS m_score
            FROM base
        )
        SELECT
            customer_sk,
            customer_unique_id,
            recency_days,
            frequency,
            monetary,
            r_score,
            f_score,
            m_score,
            r_score || f_score || m_score,
            CASE
                WHEN r_score >= 4 AND f_score >= 4 AND m_score >= 4 THEN 'Champions'
                WHEN r_score >= 3 AND f_score >= 3 THEN 'Loyal Customers'
                WHEN r_score >= 4 THEN 'Potential Loyalists'
                WHEN r_score <= 2 AND f_score >= 3 THEN 'At Risk'
                WHEN r_score <= 2 THEN 'Hibernating'
                ELSE 'Others'
            END
        FROM scored
        ORDER BY customer_sk
    ",
};

/// Month-over-month revenue with running total.
///
/// The previous month is the previous month that had sales.
pub static ANALYTICS_MONTHLY_REVENUE: Model = Model {
    target: &tables::ANALYTICS_MONTHLY_REVENUE,
    depends_on: &["mart_monthly_sales"],
    description: "Monthly revenue trend",
    insert_sql: "
        INSERT INTO analytics_monthly_revenue (
            year_month,
            total_orders,
            total_revenue,
            previous_month_revenue,
            mom_growth_pct,
            cumulative_revenue
        )
        SELECT
            year_month,
            total_orders,
            total_revenue,
            LAG(total_revenue) OVER w,
            ROUND(
                (total_revenue - LAG(total_revenue) OVER w) * 100.0
                / NULLIF(LAG(total_revenue) OVER w, 0),
                2
            ),
            ROUND(SUM(total_revenue) OVER (
                ORDER BY year_month
                ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW
            ), 2)
        FROM mart_monthly_sales
        WINDOW w AS (ORDER BY year_month)
        ORDER BY year_month
    ",
};

/// Weighted churn-risk score (0 to 1) and category per customer.
///
/// Score weights: recency as a fraction of a year, capped at 1 (0.4);
/// fewer than 3 orders (0.3); lifetime spend under 100 (0.2); inactive
/// (0.1). Customers with no counted order take the full recency weight.
pub static ANALYTICS_CUSTOMER_RISK_SCORING: Model = Model {
    target: &tables::ANALYTICS_CUSTOMER_RISK_SCORING,
    depends_on: &["dim_customers"],
    description: "Customer risk scoring",
    insert_sql: "
        INSERT INTO analytics_customer_risk_scoring (
            customer_sk,
            customer_unique_id,
            last_purchase_date,
            days_since_last_purchase,
            purchase_frequency,
            average_order_value,
            lifetime_value,
            risk_score,
            risk_category,
            risk_reason,
            alert_flag
        )
        WITH base AS (
            SELECT
                customer_sk,
                customer_unique_id,
                last_order_date,
                total_orders,
                total_spent,
                is_active,
                CAST(julianday(:as_of) - julianday(last_order_date) AS INTEGER) AS days_since
            FROM dim_customers
        )
        SELECT
            customer_sk,
            customer_unique_id,
            last_order_date,
            days_since,
            total_orders,
            ROUND(total_spent / NULLIF(total_orders, 0), 2),
            total_spent,
            ROUND(
                MAX(MIN(COALESCE(days_since / 365.0, 1.0), 1.0), 0.0) * 0.4
                + CASE WHEN total_orders < 3 THEN 0.3 ELSE 0 END
                + CASE WHEN total_spent < 100 THEN 0.2 ELSE 0 END
                + CASE WHEN is_active = 0 THEN 0.1 ELSE 0 END,
                2
            ),
            CASE
                WHEN days_since IS NULL THEN 'HIGH'
                WHEN days_since > 90 AND total_spent > 500 THEN 'CRITICAL'
                WHEN days_since > 90 THEN 'HIGH'
                WHEN days_since > 60 THEN 'MEDIUM'
                WHEN days_since > 30 THEN 'LOW'
                ELSE 'VERY_LOW'
            END,
            CASE
                WHEN days_since IS NULL THEN 'No qualifying purchases'
                WHEN days_since > 90 THEN 'Inactive > 90 days'
                WHEN total_orders < 3 THEN 'Low purchase frequency'
                WHEN total_spent < 100 THEN 'Low lifetime value'
                ELSE 'Active customer'
            END,
            CASE WHEN days_since > 90 AND total_spent > 500 THEN 1 ELSE 0 END
        FROM base
        ORDER BY customer_sk
    ",
};

pub static ANALYTICS_PRODUCT_PERFORMANCE: Model = Model {
    target: &tables::ANALYTICS_PRODUCT_PERFORMANCE,
    depends_on: &["fct_order_items", "dim_products"],
    description: "Product performance",
    insert_sql: "
        INSERT INTO analytics_product_performance (
            product_sk,
            product_id,
            category_english,
            total_units_sold,
            total_revenue,
            avg_price
        )
        SELECT
            dp.product_sk,
            dp.product_id,
            dp.product_category_name_english,
            COUNT(*),
            ROUND(SUM(foi.item_total_value), 2),
            ROUND(AVG(foi.item_price), 2)
        FROM fct_order_items foi
        JOIN dim_products dp
            ON foi.product_sk = dp.product_sk
        GROUP BY dp.product_sk, dp.product_id, dp.product_category_name_english
        ORDER BY dp.product_sk
    ",
};

pub static MODELS: &[&Model] = &[
    &ANALYTICS_CUSTOMER_RFM,
    &ANALYTICS_MONTHLY_REVENUE,
    &ANALYTICS_CUSTOMER_RISK_SCORING,
    &ANALYTICS_PRODUCT_PERFORMANCE,
];
