//! Mart models: business rollups over facts and dimensions.

use super::Model;
use crate::schema::tables;

pub static MART_MONTHLY_SALES: Model = Model {
    target: &tables::MART_MONTHLY_SALES,
    depends_on: &["fct_sales", "dim_date"],
    description: "Sales rolled up by calendar month",
    insert_sql: "
        INSERT INTO mart_monthly_sales (
            year_month,
            year,
            month,
            total_orders,
            unique_customers,
            total_items,
            total_revenue,
            total_freight,
            avg_order_value
        )
        SELECT
            printf('%04d-%02d', dd.year, dd.month),
            dd.year,
            dd.month,
            COUNT(*),
            COUNT(DISTINCT fs.customer_sk),
            SUM(fs.order_item_count),
            ROUND(SUM(fs.total_order_value), 2),
            ROUND(SUM(fs.total_freight), 2),
            ROUND(AVG(fs.total_order_value), 2)
        FROM fct_sales fs
        JOIN dim_date dd
            ON dd.date_sk = fs.order_date_sk
        GROUP BY dd.year, dd.month
        ORDER BY dd.year, dd.month
    ",
};

pub static MART_PRODUCT_SALES: Model = Model {
    target: &tables::MART_PRODUCT_SALES,
    depends_on: &["fct_order_items", "dim_products"],
    description: "Sales rolled up by product",
    insert_sql: "
        INSERT INTO mart_product_sales (
            product_sk,
            product_id,
            product_category_name,
            category_english,
            total_orders,
            units_sold,
            total_revenue,
            total_freight
        )
        SELECT
            dp.product_sk,
            dp.product_id,
            dp.product_category_name,
            dp.product_category_name_english,
            COUNT(DISTINCT foi.order_id),
            COUNT(*),
            ROUND(SUM(foi.item_price), 2),
            ROUND(SUM(foi.item_freight), 2)
        FROM fct_order_items foi
        JOIN dim_products dp
            ON dp.product_sk = foi.product_sk
        GROUP BY dp.product_sk
        ORDER BY dp.product_sk
    ",
};

pub static MODELS: &[&Model] = &[&MART_MONTHLY_SALES, &MART_PRODUCT_SALES];
