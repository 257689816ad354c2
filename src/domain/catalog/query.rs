//! Store-neutral query construction
//!
//! A [`QueryFilter`] becomes an [`ItemQuery`] (predicates, ordering, window)
//! plus a [`CountQuery`] sharing the same predicates. Store implementations
//! render these; they never see caller strings for column names.

use std::cmp::Ordering;

use rust_decimal::Decimal;

use super::filter::{QueryFilter, SortDirection, SortField};
use super::item::Item;

/// One independent filter condition; a query ANDs all of its predicates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    CategoryEq(String),
    BrandEq(String),
    /// Inclusive lower price bound
    PriceAtLeast(Decimal),
    /// Inclusive upper price bound
    PriceAtMost(Decimal),
    /// Case-insensitive substring over name, description and SKU (ORed)
    Search(String),
}

impl Predicate {
    /// Evaluates the predicate against an item
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Self::CategoryEq(category) => item.category == *category,
            Self::BrandEq(brand) => item.brand == *brand,
            Self::PriceAtLeast(min) => item.price >= *min,
            Self::PriceAtMost(max) => item.price <= *max,
            Self::Search(term) => {
                let needle = term.to_lowercase();
                item.name.to_lowercase().contains(&needle)
                    || item
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
                    || item.sku.to_lowercase().contains(&needle)
            }
        }
    }
}

/// Ordering for a list query
///
/// Unless the primary field already is `id`, `id` in the same direction is
/// appended so page windows are stable across requests. Names compare by
/// bytes; the Postgres repository sorts them with `COLLATE "C"` to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: SortField,
    pub direction: SortDirection,
}

impl OrderBy {
    /// Ordering clauses in priority order
    pub fn clauses(&self) -> Vec<(SortField, SortDirection)> {
        let mut clauses = vec![(self.field, self.direction)];

        if self.field != SortField::Id {
            clauses.push((SortField::Id, self.direction));
        }

        clauses
    }

    /// Compares two items under this ordering
    pub fn compare(&self, a: &Item, b: &Item) -> Ordering {
        self.clauses()
            .into_iter()
            .map(|(field, direction)| {
                let ordering = match field {
                    SortField::Id => a.id.cmp(&b.id),
                    SortField::Name => a.name.cmp(&b.name),
                    SortField::Price => a.price.cmp(&b.price),
                    SortField::Rating => a.rating.cmp(&b.rating),
                    SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                };

                match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

/// Result window: `limit` rows starting at `offset`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u32,
}

/// Bounded query for one page of items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemQuery {
    pub predicates: Vec<Predicate>,
    pub order: OrderBy,
    pub window: Window,
}

/// Count of all rows matching the same predicates, without ordering or window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountQuery {
    pub predicates: Vec<Predicate>,
}

impl CountQuery {
    pub fn matches(&self, item: &Item) -> bool {
        self.predicates.iter().all(|p| p.matches(item))
    }
}

impl ItemQuery {
    pub fn matches(&self, item: &Item) -> bool {
        self.predicates.iter().all(|p| p.matches(item))
    }
}

/// Translates a validated [`QueryFilter`] into store queries
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemQueryBuilder;

impl ItemQueryBuilder {
    pub fn build(filter: &QueryFilter) -> (ItemQuery, CountQuery) {
        let predicates = Self::predicates(filter);

        let item_query = ItemQuery {
            predicates: predicates.clone(),
            order: OrderBy {
                field: filter.sort_field(),
                direction: filter.sort_direction(),
            },
            window: Window {
                offset: filter.offset(),
                limit: filter.limit(),
            },
        };

        (item_query, CountQuery { predicates })
    }

    fn predicates(filter: &QueryFilter) -> Vec<Predicate> {
        let mut predicates = Vec::new();

        // An empty category or brand filters nothing
        if let Some(category) = filter.category().filter(|c| !c.is_empty()) {
            predicates.push(Predicate::CategoryEq(category.to_string()));
        }

        if let Some(brand) = filter.brand().filter(|b| !b.is_empty()) {
            predicates.push(Predicate::BrandEq(brand.to_string()));
        }

        if let Some(min) = filter.min_price() {
            predicates.push(Predicate::PriceAtLeast(min));
        }

        if let Some(max) = filter.max_price() {
            predicates.push(Predicate::PriceAtMost(max));
        }

        if let Some(term) = filter.search() {
            predicates.push(Predicate::Search(term.to_string()));
        }

        predicates
    }
}

/// ceil(total / limit); zero when there are no rows
pub fn total_pages(total: u64, limit: u32) -> u64 {
    if limit == 0 {
        return 0;
    }

    total.div_ceil(u64::from(limit))
}
