//! Table declarations for every warehouse layer.

use super::{ColumnDef as C, Layer, TableSchema};

// =============================================================================
// Staging (replaced wholesale by the load step)
// =============================================================================

pub static STG_ORDERS: TableSchema = TableSchema {
    name: "stg_orders",
    layer: Layer::Staging,
    columns: &[
        C::text("order_id"),
        C::text("customer_id"),
        C::text("order_status"),
        C::text("order_purchase_timestamp"),
        C::text("order_approved_at"),
        C::text("order_delivered_carrier_date"),
        C::text("order_delivered_customer_date"),
        C::text("order_estimated_delivery_date"),
    ],
    primary_key: &[],
    unique: &[],
    indexes: &[&["customer_id"]],
};

pub static STG_CUSTOMERS: TableSchema = TableSchema {
    name: "stg_customers",
    layer: Layer::Staging,
    columns: &[
        C::text("customer_id"),
        C::text("customer_unique_id"),
        C::text("customer_zip_code_prefix"),
        C::text("customer_city"),
        C::text("customer_state"),
    ],
    primary_key: &[],
    unique: &[],
    indexes: &[],
};

pub static STG_ORDER_ITEMS: TableSchema = TableSchema {
    name: "stg_order_items",
    layer: Layer::Staging,
    columns: &[
        C::text("order_id"),
        C::int("order_item_id"),
        C::text("product_id"),
        C::text("seller_id"),
        C::text("shipping_limit_date"),
        C::real("price"),
        C::real("freight_value"),
        C::real("item_total_value"),
    ],
    primary_key: &[],
    unique: &[],
    indexes: &[&["order_id"]],
};

pub static STG_PRODUCTS: TableSchema = TableSchema {
    name: "stg_products",
    layer: Layer::Staging,
    columns: &[
        C::text("product_id"),
        C::text("product_category_name"),
        C::real("product_name_lenght"),
        C::real("product_description_lenght"),
        C::real("product_photos_qty"),
        C::real("product_weight_g"),
        C::real("product_length_cm"),
        C::real("product_height_cm"),
        C::real("product_width_cm"),
        C::real("product_volume_cm3"),
    ],
    primary_key: &[],
    unique: &[],
    indexes: &[],
};

pub static STG_CATEGORY_TRANSLATION: TableSchema = TableSchema {
    name: "stg_category_translation",
    layer: Layer::Staging,
    columns: &[
        C::text("product_category_name"),
        C::text("product_category_name_english"),
    ],
    primary_key: &[],
    unique: &[],
    indexes: &[],
};

// =============================================================================
// Dimensions
// =============================================================================

pub static DIM_CUSTOMERS: TableSchema = TableSchema {
    name: "dim_customers",
    layer: Layer::Dimension,
    columns: &[
        C::int("customer_sk"),
        C::text("customer_unique_id").not_null(),
        C::text("customer_id").not_null(),
        C::text("customer_city"),
        C::text("customer_state"),
        C::text("customer_zip_code_prefix"),
        C::text("first_order_date"),
        C::text("last_order_date"),
        C::int("total_orders").not_null(),
        C::real("total_spent").not_null(),
        C::int("is_active").not_null(),
    ],
    primary_key: &["customer_sk"],
    unique: &[&["customer_unique_id", "customer_id"]],
    indexes: &[&["customer_id"]],
};

pub static DIM_PRODUCTS: TableSchema = TableSchema {
    name: "dim_products",
    layer: Layer::Dimension,
    columns: &[
        C::int("product_sk"),
        C::text("product_id").not_null(),
        C::text("product_category_name"),
        C::text("product_category_name_english"),
        C::real("product_name_lenght"),
        C::real("product_description_lenght"),
        C::real("product_photos_qty"),
        C::real("product_weight_g"),
        C::real("product_volume_cm3"),
    ],
    primary_key: &["product_sk"],
    unique: &[&["product_id"]],
    indexes: &[],
};

pub static DIM_DATE: TableSchema = TableSchema {
    name: "dim_date",
    layer: Layer::Dimension,
    columns: &[
        C::int("date_sk").not_null(),
        C::text("date").not_null(),
        C::int("year").not_null(),
        C::int("quarter").not_null(),
        C::int("month").not_null(),
        C::int("day").not_null(),
        C::int("day_of_week").not_null(),
        C::int("week_of_year").not_null(),
        C::int("is_weekend").not_null(),
    ],
    primary_key: &["date_sk"],
    unique: &[&["date"]],
    indexes: &[],
};

// =============================================================================
// Facts
// =============================================================================

pub static FCT_SALES: TableSchema = TableSchema {
    name: "fct_sales",
    layer: Layer::Fact,
    columns: &[
        C::text("order_id").not_null(),
        C::int("customer_sk").not_null(),
        C::int("order_date_sk").not_null(),
        C::text("order_status").not_null(),
        C::real("total_price").not_null(),
        C::real("total_freight").not_null(),
        C::real("total_order_value").not_null(),
        C::int("order_item_count").not_null(),
        C::int("days_to_delivery"),
        C::int("is_delivered").not_null(),
    ],
    primary_key: &["order_id"],
    unique: &[],
    indexes: &[&["customer_sk"], &["order_date_sk"]],
};

pub static FCT_ORDER_ITEMS: TableSchema = TableSchema {
    name: "fct_order_items",
    layer: Layer::Fact,
    columns: &[
        C::text("order_id").not_null(),
        C::int("item_sequence").not_null(),
        C::int("product_sk").not_null(),
        C::real("item_price").not_null(),
        C::real("item_freight").not_null(),
        C::real("item_total_value").not_null(),
    ],
    primary_key: &["order_id", "item_sequence"],
    unique: &[],
    indexes: &[&["product_sk"]],
};

// =============================================================================
// Marts
// =============================================================================

pub static MART_MONTHLY_SALES: TableSchema = TableSchema {
    name: "mart_monthly_sales",
    layer: Layer::Mart,
    columns: &[
        C::text("year_month").not_null(),
        C::int("year").not_null(),
        C::int("month").not_null(),
        C::int("total_orders").not_null(),
        C::int("unique_customers").not_null(),
        C::int("total_items").not_null(),
        C::real("total_revenue").not_null(),
        C::real("total_freight").not_null(),
        C::real("avg_order_value").not_null(),
    ],
    primary_key: &["year_month"],
    unique: &[],
    indexes: &[],
};

pub static MART_PRODUCT_SALES: TableSchema = TableSchema {
    name: "mart_product_sales",
    layer: Layer::Mart,
    columns: &[
        C::int("product_sk").not_null(),
        C::text("product_id").not_null(),
        C::text("product_category_name"),
        C::text("category_english"),
        C::int("total_orders").not_null(),
        C::int("units_sold").not_null(),
        C::real("total_revenue").not_null(),
        C::real("total_freight").not_null(),
    ],
    primary_key: &["product_sk"],
    unique: &[],
    indexes: &[],
};

// =============================================================================
// Analytics
// =============================================================================

pub static ANALYTICS_CUSTOMER_RFM: TableSchema = TableSchema {
    name: "analytics_customer_rfm",
    layer: Layer::Analytics,
    columns: &[
        C::int("customer_sk").not_null(),
        C::text("customer_unique_id").not_null(),
        C::int("recency_days").not_null(),
        C::int("frequency").not_null(),
        C::real("monetary").not_null(),
        C::int("r_score").not_null(),
        C::int("f_score").not_null(),
        C::int("m_score").not_null(),
        C::text("rfm_score").not_null(),
        C::text("segment").not_null(),
    ],
    primary_key: &["customer_sk"],
    unique: &[],
    indexes: &[],
};

pub static ANALYTICS_MONTHLY_REVENUE: TableSchema = TableSchema {
    name: "analytics_monthly_revenue",
    layer: Layer::Analytics,
    columns: &[
        C::text("year_month").not_null(),
        C::int("total_orders").not_null(),
        C::real("total_revenue").not_null(),
        C::real("previous_month_revenue"),
        C::real("mom_growth_pct"),
        C::real("cumulative_revenue").not_null(),
    ],
    primary_key: &["year_month"],
    unique: &[],
    indexes: &[],
};

pub static ANALYTICS_CUSTOMER_RISK_SCORING: TableSchema = TableSchema {
    name: "analytics_customer_risk_scoring",
    layer: Layer::Analytics,
    columns: &[
        C::int("customer_sk").not_null(),
        C::text("customer_unique_id").not_null(),
        C::text("last_purchase_date"),
        C::int("days_since_last_purchase"),
        C::int("purchase_frequency").not_null(),
        C::real("average_order_value"),
        C::real("lifetime_value").not_null(),
        C::real("risk_score").not_null(),
        C::text("risk_category").not_null(),
        C::text("risk_reason").not_null(),
        C::int("alert_flag").not_null(),
    ],
    primary_key: &["customer_sk"],
    unique: &[],
    indexes: &[&["risk_category"]],
};

pub static ANALYTICS_PRODUCT_PERFORMANCE: TableSchema = TableSchema {
    name: "analytics_product_performance",
    layer: Layer::Analytics,
    columns: &[
        C::int("product_sk").not_null(),
        C::text("product_id").not_null(),
        C::text("category_english"),
        C::int("total_units_sold").not_null(),
        C::real("total_revenue").not_null(),
        C::real("avg_price").not_null(),
    ],
    primary_key: &["product_sk"],
    unique: &[],
    indexes: &[],
};

/// Every declared table, staging first, in layer order.
pub static ALL: &[&TableSchema] = &[
    &STG_ORDERS,
    &STG_CUSTOMERS,
    &STG_ORDER_ITEMS,
    &STG_PRODUCTS,
    &STG_CATEGORY_TRANSLATION,
    &DIM_CUSTOMERS,
    &DIM_PRODUCTS,
    &DIM_DATE,
    &FCT_SALES,
    &FCT_ORDER_ITEMS,
    &MART_MONTHLY_SALES,
    &MART_PRODUCT_SALES,
    &ANALYTICS_CUSTOMER_RFM,
    &ANALYTICS_MONTHLY_REVENUE,
    &ANALYTICS_CUSTOMER_RISK_SCORING,
    &ANALYTICS_PRODUCT_PERFORMANCE,
];

/// Look up a declared table by name.
pub fn find(name: &str) -> Option<&'static TableSchema> {
    ALL.iter().copied().find(|t| t.name == name)
}
