//! Source entities: the five flat files the pipeline ingests.

use std::fmt;

use crate::schema::{tables, TableSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceEntity {
    Orders,
    Customers,
    OrderItems,
    Products,
    CategoryTranslation,
}

impl SourceEntity {
    pub const ALL: [SourceEntity; 5] = [
        SourceEntity::Orders,
        SourceEntity::Customers,
        SourceEntity::OrderItems,
        SourceEntity::Products,
        SourceEntity::CategoryTranslation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceEntity::Orders => "orders",
            SourceEntity::Customers => "customers",
            SourceEntity::OrderItems => "order_items",
            SourceEntity::Products => "products",
            SourceEntity::CategoryTranslation => "category_translation",
        }
    }

    /// File name under the raw data directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            SourceEntity::Orders => "olist_orders_dataset.csv",
            SourceEntity::Customers => "olist_customers_dataset.csv",
            SourceEntity::OrderItems => "olist_order_items_dataset.csv",
            SourceEntity::Products => "olist_products_dataset.csv",
            SourceEntity::CategoryTranslation => "product_category_name_translation.csv",
        }
    }

    pub fn staging_table(&self) -> &'static TableSchema {
        match self {
            SourceEntity::Orders => &tables::STG_ORDERS,
            SourceEntity::Customers => &tables::STG_CUSTOMERS,
            SourceEntity::OrderItems => &tables::STG_ORDER_ITEMS,
            SourceEntity::Products => &tables::STG_PRODUCTS,
            SourceEntity::CategoryTranslation => &tables::STG_CATEGORY_TRANSLATION,
        }
    }

    /// Columns the raw file must provide.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            SourceEntity::Orders => &[
                "order_id",
                "customer_id",
                "order_status",
                "order_purchase_timestamp",
                "order_approved_at",
                "order_delivered_carrier_date",
                "order_delivered_customer_date",
                "order_estimated_delivery_date",
            ],
            SourceEntity::Customers => &[
                "customer_id",
                "customer_unique_id",
                "customer_zip_code_prefix",
                "customer_city",
                "customer_state",
            ],
            SourceEntity::OrderItems => &[
                "order_id",
                "order_item_id",
                "product_id",
                "seller_id",
                "shipping_limit_date",
                "price",
                "freight_value",
            ],
            SourceEntity::Products => &[
                "product_id",
                "product_category_name",
                "product_name_lenght",
                "product_description_lenght",
                "product_photos_qty",
                "product_weight_g",
                "product_length_cm",
                "product_height_cm",
                "product_width_cm",
            ],
            SourceEntity::CategoryTranslation => {
                &["product_category_name", "product_category_name_english"]
            }
        }
    }

    /// Columns identifying one row after cleaning.
    pub fn grain(&self) -> &'static [&'static str] {
        match self {
            SourceEntity::Orders => &["order_id"],
            SourceEntity::Customers => &["customer_unique_id"],
            SourceEntity::OrderItems => &["order_id", "order_item_id"],
            SourceEntity::Products => &["product_id"],
            SourceEntity::CategoryTranslation => &["product_category_name"],
        }
    }
}

impl fmt::Display for SourceEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
