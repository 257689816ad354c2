//! Result shapes returned by the catalog service and cached as JSON

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::item::Item;

/// One page of a list query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPage {
    pub data: Vec<Item>,
    /// Rows matching the filter across all pages
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u64,
}

/// Catalog-wide aggregates
///
/// Every field is zero for an empty catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_products: i64,
    pub total_categories: i64,
    pub total_brands: i64,
    pub price_min: Decimal,
    pub price_max: Decimal,
    pub avg_rating: Decimal,
    pub total_stock: i64,
}

/// Deduplicated values of one column, sorted ascending
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistinctValues {
    pub values: Vec<String>,
    pub total: usize,
}

impl DistinctValues {
    pub fn new(mut values: Vec<String>) -> Self {
        values.sort();
        values.dedup();

        Self {
            total: values.len(),
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats_are_zero() {
        let stats = AggregateStats::default();

        assert_eq!(stats.total_products, 0);
        assert_eq!(stats.price_min, Decimal::ZERO);
        assert_eq!(stats.price_max, Decimal::ZERO);
        assert_eq!(stats.avg_rating, Decimal::ZERO);
        assert_eq!(stats.total_stock, 0);
    }

    #[test]
    fn test_stats_serialize_without_nulls() {
        let json = serde_json::to_string(&AggregateStats::default()).unwrap();

        assert!(!json.contains("null"));
        assert!(json.contains("\"total_products\":0"));
    }

    #[test]
    fn test_distinct_values_sorted_and_deduplicated() {
        let values = DistinctValues::new(vec![
            "Toys".to_string(),
            "Books".to_string(),
            "Toys".to_string(),
            "Garden".to_string(),
        ]);

        assert_eq!(values.values, vec!["Books", "Garden", "Toys"]);
        assert_eq!(values.total, 3);
    }
}
