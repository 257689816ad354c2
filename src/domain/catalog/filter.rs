//! List query filter and the sortable-field allow-list

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::cache::CacheKeyParams;
use crate::domain::DomainError;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 100;

/// Fields a list may be ordered by
///
/// This is the only route from caller input to an ordering clause; anything
/// outside the set is rejected when parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Id,
    Name,
    Price,
    Rating,
    CreatedAt,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::Id,
        SortField::Name,
        SortField::Price,
        SortField::Rating,
        SortField::CreatedAt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Price => "price",
            Self::Rating => "rating",
            Self::CreatedAt => "created_at",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| {
                DomainError::invalid_query(format!(
                    "Unsupported sort field '{}'. Valid fields: id, name, price, rating, created_at",
                    s
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(DomainError::invalid_query(format!(
                "Unsupported sort order '{}'. Valid orders: asc, desc",
                s
            ))),
        }
    }
}

/// A validated list query: filters, ordering and pagination
///
/// Immutable once built. Optional fields keep `None` (absent) apart from
/// `Some("")` (present but empty) all the way into the cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFilter {
    page: u32,
    limit: u32,
    sort_field: SortField,
    sort_direction: SortDirection,
    category: Option<String>,
    brand: Option<String>,
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
    search: Option<String>,
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort_field: SortField::default(),
            sort_direction: SortDirection::default(),
            category: None,
            brand: None,
            min_price: None,
            max_price: None,
            search: None,
        }
    }
}

impl QueryFilter {
    pub fn builder() -> QueryFilterBuilder {
        QueryFilterBuilder::default()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn sort_field(&self) -> SortField {
        self.sort_field
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    pub fn min_price(&self) -> Option<Decimal> {
        self.min_price
    }

    pub fn max_price(&self) -> Option<Decimal> {
        self.max_price
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Row offset of the first item on the requested page
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// Every field, with absent optionals as explicit sentinels
    pub fn to_key_params(&self) -> CacheKeyParams {
        CacheKeyParams::new()
            .with_component("page", self.page)
            .with_component("limit", self.limit)
            .with_component("sort_by", self.sort_field.as_str())
            .with_component("sort_order", self.sort_direction.as_str())
            .with_component("category", self.category.as_ref())
            .with_component("brand", self.brand.as_ref())
            .with_component("min_price", self.min_price)
            .with_component("max_price", self.max_price)
            .with_component("search", self.search.as_ref())
    }
}

/// Builder for [`QueryFilter`]; `build` enforces the bounds
#[derive(Debug, Clone, Default)]
pub struct QueryFilterBuilder {
    page: Option<u32>,
    limit: Option<u32>,
    sort_field: Option<SortField>,
    sort_direction: Option<SortDirection>,
    category: Option<String>,
    brand: Option<String>,
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
    search: Option<String>,
}

impl QueryFilterBuilder {
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sort_field(mut self, field: SortField) -> Self {
        self.sort_field = Some(field);
        self
    }

    pub fn sort_direction(mut self, direction: SortDirection) -> Self {
        self.sort_direction = Some(direction);
        self
    }

    pub fn category(mut self, category: Option<impl Into<String>>) -> Self {
        self.category = category.map(Into::into);
        self
    }

    pub fn brand(mut self, brand: Option<impl Into<String>>) -> Self {
        self.brand = brand.map(Into::into);
        self
    }

    pub fn min_price(mut self, min_price: Option<Decimal>) -> Self {
        self.min_price = min_price;
        self
    }

    pub fn max_price(mut self, max_price: Option<Decimal>) -> Self {
        self.max_price = max_price;
        self
    }

    pub fn search(mut self, search: Option<impl Into<String>>) -> Self {
        self.search = search.map(Into::into);
        self
    }

    pub fn build(self) -> Result<QueryFilter, DomainError> {
        let page = self.page.unwrap_or(DEFAULT_PAGE);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);

        if page < 1 {
            return Err(DomainError::invalid_query("page must be at least 1"));
        }

        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(DomainError::invalid_query(format!(
                "limit must be between 1 and {}",
                MAX_LIMIT
            )));
        }

        for (name, bound) in [("min_price", self.min_price), ("max_price", self.max_price)] {
            if bound.is_some_and(|p| p < Decimal::ZERO) {
                return Err(DomainError::invalid_query(format!(
                    "{} must not be negative",
                    name
                )));
            }
        }

        Ok(QueryFilter {
            page,
            limit,
            sort_field: self.sort_field.unwrap_or_default(),
            sort_direction: self.sort_direction.unwrap_or_default(),
            category: self.category,
            brand: self.brand,
            min_price: self.min_price,
            max_price: self.max_price,
            search: self.search,
        })
    }
}
