//! Fact models. Dimension keys are resolved with inner joins, so source
//! rows without a matching dimension row are dropped rather than failing
//! the build. Measures keep full precision.

use super::Model;
use crate::schema::tables;

/// One row per counted order. Line items are totalled per order before the
/// join, and a customer_id shared by several people resolves to its lowest
/// surrogate key, so each order's money is counted once.
pub static FCT_SALES: Model = Model {
    target: &tables::FCT_SALES,
    depends_on: &["stg_orders", "stg_order_items", "dim_customers", "dim_date"],
    description: "Order-grain sales fact",
    insert_sql: "
        INSERT INTO fct_sales (
            order_id,
            customer_sk,
            order_date_sk,
            order_status,
            total_price,
            total_freight,
            total_order_value,
            order_item_count,
            days_to_delivery,
            is_delivered
        )
        WITH counted_orders AS (
            SELECT
                order_id,
                MIN(customer_id) AS customer_id,
                MIN(order_status) AS order_status,
                MIN(order_purchase_timestamp) AS purchased_at,
                MIN(order_delivered_customer_date) AS delivered_at
            FROM stg_orders
            WHERE order_id IS NOT NULL
              AND order_status IN (SELECT value FROM json_each(:counted_statuses))
            GROUP BY order_id
        ),
        order_totals AS (
            SELECT
                order_id,
                SUM(price) AS total_price,
                SUM(freight_value) AS total_freight,
                SUM(item_total_value) AS total_order_value,
                COUNT(DISTINCT order_item_id) AS order_item_count
            FROM stg_order_items
            GROUP BY order_id
        ),
        customer_keys AS (
            SELECT customer_id, MIN(customer_sk) AS customer_sk
            FROM dim_customers
            GROUP BY customer_id
        )
        SELECT
            o.order_id,
            ck.customer_sk,
            dd.date_sk,
            o.order_status,
            COALESCE(t.total_price, 0),
            COALESCE(t.total_freight, 0),
            COALESCE(t.total_order_value, 0),
            COALESCE(t.order_item_count, 0),
            CASE
                WHEN o.delivered_at IS NOT NULL
                THEN CAST(julianday(o.delivered_at) - julianday(o.purchased_at) AS INTEGER)
            END,
            CASE WHEN o.delivered_at IS NOT NULL THEN 1 ELSE 0 END
        FROM counted_orders o
        JOIN customer_keys ck
            ON ck.customer_id = o.customer_id
        JOIN dim_date dd
            ON dd.date = DATE(o.purchased_at)
        LEFT JOIN order_totals t
            ON t.order_id = o.order_id
        ORDER BY o.order_id
    ",
};

/// One row per order line whose product is in the product dimension.
pub static FCT_ORDER_ITEMS: Model = Model {
    target: &tables::FCT_ORDER_ITEMS,
    depends_on: &["stg_order_items", "dim_products"],
    description: "Line-item fact",
    insert_sql: "
        INSERT INTO fct_order_items (
            order_id,
            item_sequence,
            product_sk,
            item_price,
            item_freight,
            item_total_value
        )
        SELECT
            oi.order_id,
            oi.order_item_id,
            dp.product_sk,
            oi.price,
            oi.freight_value,
            COALESCE(oi.item_total_value, oi.price + oi.freight_value)
        FROM stg_order_items oi
        JOIN dim_products dp
            ON dp.product_id = oi.product_id
        ORDER BY oi.order_id, oi.order_item_id
    ",
};

pub static MODELS: &[&Model] = &[&FCT_SALES, &FCT_ORDER_ITEMS];
