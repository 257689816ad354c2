//! Catalog domain - items, list filters and store query construction

mod filter;
mod item;
mod page;
mod query;
mod repository;

pub use filter::{
    QueryFilter, QueryFilterBuilder, SortDirection, SortField, DEFAULT_LIMIT, DEFAULT_PAGE,
    MAX_LIMIT,
};
pub use item::Item;
pub use page::{AggregateStats, DistinctValues, ItemPage};
pub use query::{
    total_pages, CountQuery, ItemQuery, ItemQueryBuilder, OrderBy, Predicate, Window,
};
pub use repository::{DistinctColumn, ItemRepository};

#[cfg(test)]
pub use item::fixtures;
#[cfg(test)]
pub use repository::MockItemRepository;
