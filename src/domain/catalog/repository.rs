//! Backing store boundary for catalog reads

use std::fmt;

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::item::Item;
use super::page::AggregateStats;
use super::query::{CountQuery, ItemQuery};
use crate::domain::DomainError;

/// Columns whose distinct values may be listed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistinctColumn {
    Category,
    Brand,
}

impl DistinctColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Brand => "brand",
        }
    }
}

impl fmt::Display for DistinctColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only repository over catalog items
///
/// Every method is one store round trip. Connection and timeout failures are
/// reported as `DomainError::Storage`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Fetches the window of items selected by the query
    async fn find_page(&self, query: &ItemQuery) -> Result<Vec<Item>, DomainError>;

    /// Counts all items matching the query's predicates
    async fn count(&self, query: &CountQuery) -> Result<u64, DomainError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Item>, DomainError>;

    /// Computes all aggregates in one pass, zero-filled for an empty catalog
    async fn aggregate_stats(&self) -> Result<AggregateStats, DomainError>;

    /// Distinct values of a column, sorted ascending
    async fn distinct_values(&self, column: DistinctColumn) -> Result<Vec<String>, DomainError>;
}
