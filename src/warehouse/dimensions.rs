//! Dimension models: customers, products and the order calendar.

use super::Model;
use crate::schema::tables;

/// One row per (customer_unique_id, customer_id) with order history
/// aggregated over counted orders only. Orders are collapsed to one row per
/// order_id and line items to one total per order before joining, so
/// repeated staging keys never multiply spend. Recency is measured in whole
/// days from the last order date, the same basis the risk model uses.
pub static DIM_CUSTOMERS: Model = Model {
    target: &tables::DIM_CUSTOMERS,
    depends_on: &["stg_customers", "stg_orders", "stg_order_items"],
    description: "Customer dimension with order history",
    insert_sql: "
        INSERT INTO dim_customers (
            customer_unique_id,
            customer_id,
            customer_city,
            customer_state,
            customer_zip_code_prefix,
            first_order_date,
            last_order_date,
            total_orders,
            total_spent,
            is_active
        )
        WITH customers AS (
            SELECT
                customer_unique_id,
                customer_id,
                MIN(customer_city) AS customer_city,
                MIN(customer_state) AS customer_state,
                MIN(customer_zip_code_prefix) AS customer_zip_code_prefix
            FROM stg_customers
            WHERE customer_unique_id IS NOT NULL
              AND customer_id IS NOT NULL
            GROUP BY customer_unique_id, customer_id
        ),
        counted_orders AS (
            SELECT
                order_id,
                MIN(customer_id) AS customer_id,
                MIN(order_purchase_timestamp) AS purchased_at
            FROM stg_orders
            WHERE order_id IS NOT NULL
              AND order_status IN (SELECT value FROM json_each(:counted_statuses))
            GROUP BY order_id
        ),
        order_totals AS (
            SELECT order_id, SUM(item_total_value) AS order_value
            FROM stg_order_items
            GROUP BY order_id
        ),
        history AS (
            SELECT
                o.customer_id,
                DATE(MIN(o.purchased_at)) AS first_order_date,
                DATE(MAX(o.purchased_at)) AS last_order_date,
                COUNT(*) AS total_orders,
                COALESCE(SUM(t.order_value), 0) AS total_spent
            FROM counted_orders o
            LEFT JOIN order_totals t
                ON t.order_id = o.order_id
            GROUP BY o.customer_id
        )
        SELECT
            c.customer_unique_id,
            c.customer_id,
            c.customer_city,
            c.customer_state,
            c.customer_zip_code_prefix,
            h.first_order_date,
            h.last_order_date,
            COALESCE(h.total_orders, 0),
            COALESCE(h.total_spent, 0),
            CASE
                WHEN CAST(julianday(:as_of) - julianday(h.last_order_date) AS INTEGER)
                     <= :recency_window_days THEN 1
                ELSE 0
            END
        FROM customers c
        LEFT JOIN history h
            ON h.customer_id = c.customer_id
        ORDER BY c.customer_unique_id, c.customer_id
    ",
};

/// One row per product. Products whose category has no translation keep
/// their original label and a NULL English name.
pub static DIM_PRODUCTS: Model = Model {
    target: &tables::DIM_PRODUCTS,
    depends_on: &["stg_products", "stg_category_translation"],
    description: "Product dimension with English category names",
    insert_sql: "
        INSERT INTO dim_products (
            product_id,
            product_category_name,
            product_category_name_english,
            product_name_lenght,
            product_description_lenght,
            product_photos_qty,
            product_weight_g,
            product_volume_cm3
        )
        SELECT
            p.product_id,
            p.product_category_name,
            ct.product_category_name_english,
            p.product_name_lenght,
            p.product_description_lenght,
            p.product_photos_qty,
            p.product_weight_g,
            p.product_volume_cm3
        FROM stg_products p
        LEFT JOIN (
            SELECT
                product_category_name,
                MIN(product_category_name_english) AS product_category_name_english
            FROM stg_category_translation
            GROUP BY product_category_name
        ) ct
            ON p.product_category_name = ct.product_category_name
        WHERE p.product_id IS NOT NULL
        ORDER BY p.product_id
    ",
};

/// One row per day between the first and last purchase date in staging.
/// No orders means no rows.
pub static DIM_DATE: Model = Model {
    target: &tables::DIM_DATE,
    depends_on: &["stg_orders"],
    description: "Calendar spanning the order history",
    insert_sql: "
        INSERT INTO dim_date (
            date_sk, date, year, quarter, month, day,
            day_of_week, week_of_year, is_weekend
        )
        WITH RECURSIVE
            bounds AS (
                SELECT
                    DATE(MIN(order_purchase_timestamp)) AS first_day,
                    DATE(MAX(order_purchase_timestamp)) AS last_day
                FROM stg_orders
            ),
            calendar(d) AS (
                SELECT first_day FROM bounds WHERE first_day IS NOT NULL
                UNION ALL
                SELECT DATE(calendar.d, '+1 day')
                FROM calendar, bounds
                WHERE calendar.d < bounds.last_day
            )
        SELECT
            CAST(strftime('%Y%m%d', d) AS INTEGER),
            d,
            CAST(strftime('%Y', d) AS INTEGER),
            (CAST(strftime('%m', d) AS INTEGER) - 1) / 3 + 1,
            CAST(strftime('%m', d) AS INTEGER),
            CAST(strftime('%d', d) AS INTEGER),
            CAST(strftime('%w', d) AS INTEGER),
            CAST(strftime('%W', d) AS INTEGER),
            CASE WHEN strftime('%w', d) IN ('0', '6') THEN 1 ELSE 0 END
        FROM calendar
        ORDER BY d
    ",
};

pub static MODELS: &[&Model] = &[&DIM_CUSTOMERS, &DIM_PRODUCTS, &DIM_DATE];
