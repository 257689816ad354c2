//! In-memory item repository
//!
//! Evaluates the same [`ItemQuery`] and [`CountQuery`] values the Postgres
//! repository renders to SQL. Every call counts as one store round trip.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::catalog::{
    AggregateStats, CountQuery, DistinctColumn, Item, ItemQuery, ItemRepository,
};
use crate::domain::DomainError;

/// In-memory implementation of ItemRepository
#[derive(Debug, Default)]
pub struct InMemoryItemRepository {
    items: RwLock<Vec<Item>>,
    queries: AtomicUsize,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            items: RwLock::new(items.into_iter().collect()),
            queries: AtomicUsize::new(0),
        }
    }

    /// Replaces or inserts an item, bypassing any cache in front of this store
    pub fn upsert(&self, item: Item) -> Result<(), DomainError> {
        let mut items = self.write()?;

        match items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => items.push(item),
        }

        Ok(())
    }

    /// Number of store round trips served so far
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<Item>>, DomainError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.items
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<Item>>, DomainError> {
        self.items
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn find_page(&self, query: &ItemQuery) -> Result<Vec<Item>, DomainError> {
        let items = self.read()?;

        let mut matching: Vec<&Item> = items.iter().filter(|item| query.matches(item)).collect();
        matching.sort_by(|a, b| query.order.compare(a, b));

        let offset = usize::try_from(query.window.offset).unwrap_or(usize::MAX);

        Ok(matching
            .into_iter()
            .skip(offset)
            .take(query.window.limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, query: &CountQuery) -> Result<u64, DomainError> {
        let items = self.read()?;

        Ok(items.iter().filter(|item| query.matches(item)).count() as u64)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Item>, DomainError> {
        let items = self.read()?;

        Ok(items.iter().find(|item| item.id == id).cloned())
    }

    async fn aggregate_stats(&self) -> Result<AggregateStats, DomainError> {
        let items = self.read()?;

        if items.is_empty() {
            return Ok(AggregateStats::default());
        }

        let mut categories: Vec<&str> = items.iter().map(|i| i.category.as_str()).collect();
        categories.sort_unstable();
        categories.dedup();

        let mut brands: Vec<&str> = items.iter().map(|i| i.brand.as_str()).collect();
        brands.sort_unstable();
        brands.dedup();

        let rating_sum: Decimal = items.iter().map(|i| i.rating).sum();
        let avg_rating = (rating_sum / Decimal::from(items.len()))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .normalize();

        Ok(AggregateStats {
            total_products: items.len() as i64,
            total_categories: categories.len() as i64,
            total_brands: brands.len() as i64,
            price_min: items.iter().map(|i| i.price).min().unwrap_or_default(),
            price_max: items.iter().map(|i| i.price).max().unwrap_or_default(),
            avg_rating,
            total_stock: items.iter().map(|i| i64::from(i.stock_quantity)).sum(),
        })
    }

    async fn distinct_values(&self, column: DistinctColumn) -> Result<Vec<String>, DomainError> {
        let items = self.read()?;

        let mut values: Vec<String> = items
            .iter()
            .map(|item| match column {
                DistinctColumn::Category => item.category.clone(),
                DistinctColumn::Brand => item.brand.clone(),
            })
            .collect();
        values.sort();
        values.dedup();

        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{fixtures, ItemQueryBuilder, QueryFilter, SortDirection, SortField};

    #[tokio::test]
    async fn test_find_page_windows_sorted_results() {
        let repo = InMemoryItemRepository::with_items(fixtures::items(10));
        let filter = QueryFilter::builder()
            .sort_field(SortField::Price)
            .sort_direction(SortDirection::Desc)
            .page(2)
            .limit(3)
            .build()
            .unwrap();
        let (query, _) = ItemQueryBuilder::build(&filter);

        let page = repo.find_page(&query).await.unwrap();
        let ids: Vec<i64> = page.iter().map(|i| i.id).collect();

        assert_eq!(ids, vec![7, 6, 5]);
        assert_eq!(repo.query_count(), 1);
    }

    #[tokio::test]
    async fn test_count_ignores_window() {
        let repo = InMemoryItemRepository::with_items(fixtures::items(10));
        let filter = QueryFilter::builder().limit(2).build().unwrap();
        let (_, count) = ItemQueryBuilder::build(&filter);

        assert_eq!(repo.count(&count).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_stats() {
        let mut items = fixtures::items(3);
        items[0].category = "Books".to_string();
        items[1].brand = "Globex".to_string();
        items[0].rating = Decimal::new(5, 0);
        items[1].rating = Decimal::new(4, 0);
        items[2].rating = Decimal::new(4, 0);
        for item in &mut items {
            item.stock_quantity = 10;
        }

        let repo = InMemoryItemRepository::with_items(items);
        let stats = repo.aggregate_stats().await.unwrap();

        assert_eq!(stats.total_products, 3);
        assert_eq!(stats.total_categories, 2);
        assert_eq!(stats.total_brands, 2);
        assert_eq!(stats.price_min, Decimal::new(1099, 2));
        assert_eq!(stats.price_max, Decimal::new(1299, 2));
        assert_eq!(stats.avg_rating, Decimal::new(433, 2));
        assert_eq!(stats.total_stock, 30);
    }

    #[tokio::test]
    async fn test_empty_stats() {
        let repo = InMemoryItemRepository::new();

        assert_eq!(repo.aggregate_stats().await.unwrap(), AggregateStats::default());
    }

    #[tokio::test]
    async fn test_distinct_values_sorted() {
        let mut items = fixtures::items(4);
        items[0].brand = "Zeta".to_string();
        items[1].brand = "Beta".to_string();

        let repo = InMemoryItemRepository::with_items(items);
        let brands = repo.distinct_values(DistinctColumn::Brand).await.unwrap();

        assert_eq!(brands, vec!["Acme", "Beta", "Zeta"]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let repo = InMemoryItemRepository::with_items(fixtures::items(2));
        let mut item = fixtures::item(1);
        item.name = "Renamed".to_string();

        repo.upsert(item).unwrap();

        let found = repo.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(found.name, "Renamed");
        assert!(repo.find_by_id(99).await.unwrap().is_none());
    }
}
