use revanta::dataset::Dataset;
use revanta::etl::{transform, transform_all, SourceEntity, TransformError};
use revanta::store::Value;

fn dataset(columns: &[&str], rows: &[&[&str]]) -> Dataset {
    Dataset::new(
        "raw",
        columns.iter().map(|c| c.to_string()).collect(),
        rows.iter()
            .map(|r| r.iter().map(|v| Value::text(*v)).collect())
            .collect(),
    )
}

fn counted() -> Vec<String> {
    vec!["delivered".to_string(), "shipped".to_string(), "approved".to_string()]
}

const ORDER_COLUMNS: &[&str] = &[
    "order_id",
    "customer_id",
    "order_status",
    "order_purchase_timestamp",
    "order_approved_at",
    "order_delivered_carrier_date",
    "order_delivered_customer_date",
    "order_estimated_delivery_date",
];

const ITEM_COLUMNS: &[&str] = &[
    "order_id",
    "order_item_id",
    "product_id",
    "seller_id",
    "shipping_limit_date",
    "price",
    "freight_value",
];

const PRODUCT_COLUMNS: &[&str] = &[
    "product_id",
    "product_category_name",
    "product_name_lenght",
    "product_description_lenght",
    "product_photos_qty",
    "product_weight_g",
    "product_length_cm",
    "product_height_cm",
    "product_width_cm",
];

// ============================================================================
// Orders
// ============================================================================

#[test]
fn test_orders_are_filtered_by_status() {
    let raw = dataset(
        ORDER_COLUMNS,
        &[
            &["o1", "c1", "delivered", "2018-01-02 10:00:00", "", "", "2018-01-09 12:00:00", ""],
            &["o2", "c1", "canceled", "2018-01-03 10:00:00", "", "", "", ""],
            &["o3", "c2", "shipped", "2018-01-04 10:00:00", "", "", "", ""],
            &["o4", "c3", "unavailable", "2018-01-05 10:00:00", "", "", "", ""],
        ],
    );

    let clean = transform(SourceEntity::Orders, &raw, &counted()).unwrap();

    let ids: Vec<String> = clean.rows.iter().map(|r| r[0].to_string()).collect();
    assert_eq!(ids, vec!["o1", "o3"]);
    assert_eq!(clean.name, "stg_orders");
}

#[test]
fn test_order_timestamps_are_parsed() {
    let raw = dataset(
        ORDER_COLUMNS,
        &[&["o1", "c1", "delivered", "2018-01-02 10:00:00", "garbage", "", "2018-01-09", ""]],
    );

    let clean = transform(SourceEntity::Orders, &raw, &counted()).unwrap();

    assert!(matches!(
        clean.get(0, "order_purchase_timestamp"),
        Some(Value::Timestamp(_))
    ));
    assert_eq!(clean.get(0, "order_approved_at"), Some(&Value::Null));
    assert_eq!(
        clean.get(0, "order_delivered_customer_date").unwrap().to_string(),
        "2018-01-09 00:00:00"
    );
}

#[test]
fn test_extra_columns_are_dropped() {
    let mut columns = ORDER_COLUMNS.to_vec();
    columns.push("notes");
    let raw = dataset(
        &columns,
        &[&["o1", "c1", "delivered", "2018-01-02 10:00:00", "", "", "", "", "fragile"]],
    );

    let clean = transform(SourceEntity::Orders, &raw, &counted()).unwrap();

    assert_eq!(clean.width(), ORDER_COLUMNS.len());
    assert_eq!(clean.column_index("notes"), None);
}

#[test]
fn test_duplicate_orders_keep_first_row() {
    let raw = dataset(
        ORDER_COLUMNS,
        &[
            &["o1", "c1", "delivered", "2018-01-02 10:00:00", "", "", "", ""],
            &["o1", "c9", "delivered", "2018-01-02 10:00:00", "", "", "", ""],
        ],
    );

    let clean = transform(SourceEntity::Orders, &raw, &counted()).unwrap();

    assert_eq!(clean.len(), 1);
    assert_eq!(clean.get(0, "customer_id").unwrap().to_string(), "c1");
}

// ============================================================================
// Customers
// ============================================================================

#[test]
fn test_customers_are_unique_per_person() {
    let raw = dataset(
        &["customer_id", "customer_unique_id", "customer_zip_code_prefix", "customer_city", "customer_state"],
        &[
            &["c1", "u1", "01000", "sao paulo", "SP"],
            &["c2", "u1", "01000", "sao paulo", "SP"],
            &["c3", "u2", "20000", "rio de janeiro", "RJ"],
        ],
    );

    let clean = transform(SourceEntity::Customers, &raw, &counted()).unwrap();

    assert_eq!(clean.len(), 2);
    assert_eq!(clean.get(0, "customer_id").unwrap().to_string(), "c1");
}

// ============================================================================
// Order items
// ============================================================================

#[test]
fn test_order_items_require_valid_amounts() {
    let raw = dataset(
        ITEM_COLUMNS,
        &[
            &["o1", "1", "p1", "s1", "2018-01-05 10:00:00", "29.90", "8.72"],
            &["o1", "2", "p2", "s1", "2018-01-05 10:00:00", "0", "5.00"],
            &["o2", "1", "p1", "s1", "2018-01-05 10:00:00", "10.00", "-1"],
            &["o3", "1", "p1", "s1", "2018-01-05 10:00:00", "n/a", "1.00"],
            &["o4", "1", "p3", "s2", "2018-01-05 10:00:00", "15.50", "0"],
        ],
    );

    let clean = transform(SourceEntity::OrderItems, &raw, &counted()).unwrap();

    assert_eq!(clean.len(), 2);
    assert_eq!(clean.get(0, "order_item_id"), Some(&Value::Integer(1)));
    match clean.get(0, "item_total_value") {
        Some(Value::Real(total)) => assert!((total - 38.62).abs() < 1e-9),
        other => panic!("unexpected total: {:?}", other),
    }
    assert_eq!(clean.get(1, "item_total_value"), Some(&Value::Real(15.5)));
}

#[test]
fn test_order_item_grain_is_order_and_sequence() {
    let raw = dataset(
        ITEM_COLUMNS,
        &[
            &["o1", "1", "p1", "s1", "", "10", "1"],
            &["o1", "2", "p1", "s1", "", "10", "1"],
            &["o1", "1", "p2", "s1", "", "99", "1"],
        ],
    );

    let clean = transform(SourceEntity::OrderItems, &raw, &counted()).unwrap();

    assert_eq!(clean.len(), 2);
    assert_eq!(clean.get(0, "product_id").unwrap().to_string(), "p1");
}

// ============================================================================
// Products
// ============================================================================

#[test]
fn test_products_without_category_are_dropped() {
    let raw = dataset(
        PRODUCT_COLUMNS,
        &[
            &["p1", "beleza_saude", "40", "300", "1", "500", "10", "20", "30"],
            &["p2", "", "40", "300", "1", "500", "10", "20", "30"],
        ],
    );

    let clean = transform(SourceEntity::Products, &raw, &counted()).unwrap();

    assert_eq!(clean.len(), 1);
    assert_eq!(clean.get(0, "product_volume_cm3"), Some(&Value::Real(6000.0)));
}

#[test]
fn test_missing_product_measures_become_zero() {
    let raw = dataset(
        PRODUCT_COLUMNS,
        &[&["p1", "beleza_saude", "", "", "", "", "", "20", "30"]],
    );

    let clean = transform(SourceEntity::Products, &raw, &counted()).unwrap();

    assert_eq!(clean.get(0, "product_weight_g"), Some(&Value::Real(0.0)));
    assert_eq!(clean.get(0, "product_volume_cm3"), Some(&Value::Real(0.0)));
}

#[test]
fn test_negative_product_measure_is_integrity_error() {
    let raw = dataset(
        PRODUCT_COLUMNS,
        &[&["p1", "beleza_saude", "40", "300", "1", "-5", "10", "20", "30"]],
    );

    let err = transform(SourceEntity::Products, &raw, &counted()).unwrap_err();

    match err {
        TransformError::Integrity { entity, message } => {
            assert_eq!(entity, SourceEntity::Products);
            assert!(message.contains("product_weight_g"), "{}", message);
        }
        other => panic!("unexpected: {:?}", other),
    }
}

// ============================================================================
// Category translation
// ============================================================================

#[test]
fn test_incomplete_translations_are_dropped() {
    let raw = dataset(
        &["product_category_name", "product_category_name_english"],
        &[
            &["beleza_saude", "health_beauty"],
            &["pcs", ""],
            &["", "computers"],
        ],
    );

    let clean = transform(SourceEntity::CategoryTranslation, &raw, &counted()).unwrap();

    assert_eq!(clean.len(), 1);
}

#[test]
fn test_transform_all_keeps_source_order() {
    let raw = vec![
        (
            SourceEntity::CategoryTranslation,
            dataset(
                &["product_category_name", "product_category_name_english"],
                &[&["beleza_saude", "health_beauty"]],
            ),
        ),
        (
            SourceEntity::Customers,
            dataset(
                &["customer_id", "customer_unique_id", "customer_zip_code_prefix", "customer_city", "customer_state"],
                &[&["c1", "u1", "01000", "sao paulo", "SP"]],
            ),
        ),
    ];

    let clean = transform_all(&raw, &counted()).unwrap();

    let tables: Vec<&str> = clean.iter().map(|(_, d)| d.name.as_str()).collect();
    assert_eq!(tables, vec!["stg_category_translation", "stg_customers"]);
}
