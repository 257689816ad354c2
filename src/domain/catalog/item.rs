//! Catalog item entity

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A catalog item as stored by the backing store
///
/// Items are created and updated by an external write path; this crate only
/// reads them. SKU uniqueness is enforced by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub brand: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub rating: Decimal,
    pub reviews_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
pub mod fixtures {
    use super::*;
    use chrono::TimeZone;

    /// Builds an item with deterministic values derived from `id`
    pub fn item(id: i64) -> Item {
        let created_at = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .unwrap()
            + chrono::Duration::minutes(id);

        Item {
            id,
            sku: format!("SKU-{:05}", id),
            name: format!("Item {}", id),
            description: Some(format!("Description for item {}", id)),
            category: "General".to_string(),
            brand: "Acme".to_string(),
            price: Decimal::new(999 + id * 100, 2),
            stock_quantity: 10,
            rating: Decimal::new(40, 1),
            reviews_count: 3,
            created_at,
            updated_at: created_at,
        }
    }

    /// `count` items with ids 1..=count
    pub fn items(count: i64) -> Vec<Item> {
        (1..=count).map(item).collect()
    }
}
