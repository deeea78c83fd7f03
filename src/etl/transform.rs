//! Row-level cleaning of extracted datasets.
//!
//! Each entity goes through the same steps:
//!
//! 1. column names are trimmed and lowercased
//! 2. the required columns are selected, in declared order
//! 3. timestamps and numbers are coerced
//! 4. entity rules filter and derive
//! 5. rows are deduplicated on the grain (first row wins)
//! 6. the grain is asserted unique and non-null
//!
//! Cleaning is hygiene only; business rules live in the warehouse models.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};

use super::SourceEntity;
use crate::dataset::Dataset;
use crate::store::Value;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("{entity}: missing required column {column}")]
    MissingColumn {
        entity: SourceEntity,
        column: String,
    },

    #[error("{entity}: integrity check failed: {message}")]
    Integrity {
        entity: SourceEntity,
        message: String,
    },
}

pub type TransformResult<T> = Result<T, TransformError>;

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const ORDER_TIMESTAMPS: &[&str] = &[
    "order_purchase_timestamp",
    "order_approved_at",
    "order_delivered_carrier_date",
    "order_delivered_customer_date",
    "order_estimated_delivery_date",
];

const PRODUCT_MEASURES: &[&str] = &[
    "product_name_lenght",
    "product_description_lenght",
    "product_photos_qty",
    "product_weight_g",
    "product_length_cm",
    "product_height_cm",
    "product_width_cm",
];

/// Parse a timestamp cell; anything unparseable becomes NULL.
pub fn coerce_timestamp(value: &Value) -> Value {
    let Some(s) = value.as_str().map(str::trim) else {
        return match value {
            Value::Timestamp(_) => value.clone(),
            _ => Value::Null,
        };
    };

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(Value::Timestamp)
        .unwrap_or(Value::Null)
}

/// Parse a numeric cell as REAL; anything unparseable becomes NULL.
pub fn coerce_real(value: &Value) -> Value {
    value.as_f64().filter(|f| f.is_finite()).map(Value::Real).unwrap_or(Value::Null)
}

/// Parse a numeric cell as INTEGER. Integral reals are accepted.
pub fn coerce_integer(value: &Value) -> Value {
    match value {
        Value::Integer(_) => value.clone(),
        Value::Text(s) => match s.trim().parse::<i64>() {
            Ok(i) => Value::Integer(i),
            Err(_) => integral(value.as_f64()),
        },
        _ => integral(value.as_f64()),
    }
}

fn integral(f: Option<f64>) -> Value {
    match f {
        Some(f) if f.is_finite() && f.fract() == 0.0 => Value::Integer(f as i64),
        _ => Value::Null,
    }
}

/// Clean one raw dataset.
///
/// `counted_statuses` restricts orders to the statuses the warehouse counts.
pub fn transform(
    entity: SourceEntity,
    raw: &Dataset,
    counted_statuses: &[String],
) -> TransformResult<Dataset> {
    let mut data = select_columns(entity, raw)?;

    match entity {
        SourceEntity::Orders => clean_orders(&mut data, counted_statuses)?,
        SourceEntity::Customers => {}
        SourceEntity::OrderItems => clean_order_items(&mut data)?,
        SourceEntity::Products => clean_products(&mut data)?,
        SourceEntity::CategoryTranslation => clean_category_translation(&mut data),
    }

    dedup(entity, &mut data)?;
    check_grain(entity, &data)?;

    tracing::info!(
        entity = entity.as_str(),
        rows_in = raw.len(),
        rows_out = data.len(),
        "Transformed {}",
        entity
    );
    Ok(data)
}

/// Clean every extracted dataset, keeping their order.
pub fn transform_all(
    raw: &[(SourceEntity, Dataset)],
    counted_statuses: &[String],
) -> TransformResult<Vec<(SourceEntity, Dataset)>> {
    raw.iter()
        .map(|(entity, data)| Ok((*entity, transform(*entity, data, counted_statuses)?)))
        .collect()
}

fn select_columns(entity: SourceEntity, raw: &Dataset) -> TransformResult<Dataset> {
    let normalized: Vec<String> = raw
        .columns
        .iter()
        .map(|c| c.trim().to_lowercase())
        .collect();

    let mut positions = Vec::with_capacity(entity.required_columns().len());
    for &column in entity.required_columns() {
        let pos = normalized
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| TransformError::MissingColumn {
                entity,
                column: column.to_string(),
            })?;
        positions.push(pos);
    }

    let rows = raw
        .rows
        .iter()
        .map(|row| {
            positions
                .iter()
                .map(|&i| row.get(i).cloned().unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    let columns = entity
        .required_columns()
        .iter()
        .map(|c| c.to_string())
        .collect();
    Ok(Dataset::new(entity.staging_table().name, columns, rows))
}

/// Index of a column the entity's cleaning rules read.
fn col(entity: SourceEntity, data: &Dataset, name: &str) -> TransformResult<usize> {
    data.column_index(name)
        .ok_or_else(|| TransformError::MissingColumn {
            entity,
            column: name.to_string(),
        })
}

fn map_column(
    entity: SourceEntity,
    data: &mut Dataset,
    name: &str,
    f: impl Fn(&Value) -> Value,
) -> TransformResult<()> {
    let idx = col(entity, data, name)?;
    for row in &mut data.rows {
        if let Some(cell) = row.get_mut(idx) {
            *cell = f(&*cell);
        }
    }
    Ok(())
}

fn retain_logged(data: &mut Dataset, what: &str, keep: impl Fn(&[Value]) -> bool) {
    let before = data.len();
    data.rows.retain(|row| keep(row.as_slice()));
    tracing::debug!(table = %data.name, before, after = data.len(), "{}", what);
}

fn clean_orders(data: &mut Dataset, counted_statuses: &[String]) -> TransformResult<()> {
    let entity = SourceEntity::Orders;
    for &name in ORDER_TIMESTAMPS {
        map_column(entity, data, name, coerce_timestamp)?;
    }

    let status = col(entity, data, "order_status")?;
    retain_logged(data, "Filtered orders by status", |row| {
        row.get(status)
            .and_then(Value::as_str)
            .is_some_and(|s| counted_statuses.iter().any(|c| c == s))
    });
    Ok(())
}

fn clean_order_items(data: &mut Dataset) -> TransformResult<()> {
    let entity = SourceEntity::OrderItems;
    map_column(entity, data, "shipping_limit_date", coerce_timestamp)?;
    map_column(entity, data, "order_item_id", coerce_integer)?;
    map_column(entity, data, "price", coerce_real)?;
    map_column(entity, data, "freight_value", coerce_real)?;

    let price = col(entity, data, "price")?;
    let freight = col(entity, data, "freight_value")?;
    retain_logged(data, "Filtered by valid price/freight", |row| {
        matches!(row.get(price), Some(Value::Real(p)) if *p > 0.0)
            && matches!(row.get(freight), Some(Value::Real(f)) if *f >= 0.0)
    });

    data.columns.push("item_total_value".to_string());
    for row in &mut data.rows {
        let total = match (row.get(price), row.get(freight)) {
            (Some(Value::Real(p)), Some(Value::Real(f))) => Value::Real(p + f),
            _ => Value::Null,
        };
        row.push(total);
    }
    Ok(())
}

fn clean_products(data: &mut Dataset) -> TransformResult<()> {
    let entity = SourceEntity::Products;
    let category = col(entity, data, "product_category_name")?;
    retain_logged(data, "Removed rows with missing category", |row| {
        row.get(category).is_some_and(|v| !v.is_null())
    });

    for &name in PRODUCT_MEASURES {
        map_column(entity, data, name, |v| match coerce_real(v) {
            Value::Null => Value::Real(0.0),
            real => real,
        })?;
    }

    for &name in PRODUCT_MEASURES {
        let idx = col(entity, data, name)?;
        let negative = data
            .rows
            .iter()
            .find(|row| row.get(idx).and_then(Value::as_f64).is_some_and(|f| f < 0.0));
        if let Some(row) = negative {
            let product = row.first().map(ToString::to_string).unwrap_or_default();
            return Err(TransformError::Integrity {
                entity,
                message: format!("negative {} for product {}", name, product),
            });
        }
    }

    let dims = ["product_length_cm", "product_height_cm", "product_width_cm"]
        .iter()
        .map(|name| col(entity, data, name))
        .collect::<TransformResult<Vec<usize>>>()?;
    data.columns.push("product_volume_cm3".to_string());
    for row in &mut data.rows {
        let volume: f64 = dims
            .iter()
            .map(|&i| row.get(i).and_then(Value::as_f64).unwrap_or(0.0))
            .product();
        row.push(Value::Real(volume));
    }
    Ok(())
}

fn clean_category_translation(data: &mut Dataset) {
    retain_logged(data, "Removed rows with missing translations", |row| {
        row.iter().all(|v| !v.is_null())
    });
}

fn grain_columns(entity: SourceEntity, data: &Dataset) -> TransformResult<Vec<usize>> {
    entity
        .grain()
        .iter()
        .map(|name| col(entity, data, name))
        .collect()
}

fn grain_key(grain: &[usize], row: &[Value]) -> Vec<String> {
    grain
        .iter()
        .map(|&i| row.get(i).map(ToString::to_string).unwrap_or_default())
        .collect()
}

fn dedup(entity: SourceEntity, data: &mut Dataset) -> TransformResult<()> {
    let grain = grain_columns(entity, data)?;
    let before = data.len();
    let mut seen = HashSet::with_capacity(before);
    data.rows.retain(|row| seen.insert(grain_key(&grain, row)));

    if data.len() < before {
        tracing::info!(
            entity = entity.as_str(),
            before,
            after = data.len(),
            "Deduplicated on {}",
            entity.grain().join(", ")
        );
    }
    Ok(())
}

fn check_grain(entity: SourceEntity, data: &Dataset) -> TransformResult<()> {
    let grain = grain_columns(entity, data)?;
    let mut seen = HashSet::with_capacity(data.len());

    for row in &data.rows {
        if grain.iter().any(|&i| row.get(i).map_or(true, Value::is_null)) {
            return Err(TransformError::Integrity {
                entity,
                message: format!("NULL in grain column(s) {}", entity.grain().join(", ")),
            });
        }
        let key = grain_key(&grain, row);
        if !seen.insert(key.clone()) {
            return Err(TransformError::Integrity {
                entity,
                message: format!("{} is not unique: {}", entity.grain().join(", "), key.join(", ")),
            });
        }
    }
    Ok(())
}
