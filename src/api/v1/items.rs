//! Catalog item endpoint handlers

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::{Validate, ValidationError};

use crate::api::state::AppState;
use crate::api::types::{ApiError, Path, Query};
use crate::domain::catalog::{
    AggregateStats, Item, ItemPage, QueryFilter, SortDirection, SortField,
};
use crate::domain::DomainError;

/// Query parameters accepted by `GET /items`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ListItemsQuery {
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100, message = "must be between 1 and 100"))]
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    #[validate(custom(function = "non_negative"))]
    pub min_price: Option<Decimal>,
    #[validate(custom(function = "non_negative"))]
    pub max_price: Option<Decimal>,
    pub search: Option<String>,
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut error = ValidationError::new("range");
        error.message = Some("must not be negative".into());
        return Err(error);
    }

    Ok(())
}

impl ListItemsQuery {
    /// Resolves sort names through the allow-list and builds the filter
    pub fn into_filter(self) -> Result<QueryFilter, DomainError> {
        let mut builder = QueryFilter::builder()
            .category(self.category)
            .brand(self.brand)
            .min_price(self.min_price)
            .max_price(self.max_price)
            .search(self.search);

        if let Some(page) = self.page {
            builder = builder.page(page);
        }

        if let Some(limit) = self.limit {
            builder = builder.limit(limit);
        }

        if let Some(sort_by) = &self.sort_by {
            builder = builder.sort_field(sort_by.parse::<SortField>()?);
        }

        if let Some(sort_order) = &self.sort_order {
            builder = builder.sort_direction(sort_order.parse::<SortDirection>()?);
        }

        builder.build()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BrandsResponse {
    pub brands: Vec<String>,
    pub total: usize,
}

/// GET /items
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListItemsQuery>,
) -> Result<Json<ItemPage>, ApiError> {
    query.validate()?;

    let filter = query.into_filter().map_err(|e| state.api_error(e))?;
    debug!(page = filter.page(), limit = filter.limit(), "Listing items");

    let page = state
        .catalog
        .list(&filter)
        .await
        .map_err(|e| state.api_error(e))?;

    Ok(Json(page))
}

/// GET /items/{id}
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Item>, ApiError> {
    debug!(item_id = id, "Getting item");

    let item = state
        .catalog
        .get(id)
        .await
        .map_err(|e| state.api_error(e))?
        .ok_or_else(|| ApiError::not_found(format!("Item {} not found", id)).with_param("id"))?;

    Ok(Json(item))
}

/// GET /items/stats
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<AggregateStats>, ApiError> {
    let stats = state
        .catalog
        .stats()
        .await
        .map_err(|e| state.api_error(e))?;

    Ok(Json(stats))
}

/// GET /items/categories
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoriesResponse>, ApiError> {
    let values = state
        .catalog
        .categories()
        .await
        .map_err(|e| state.api_error(e))?;

    Ok(Json(CategoriesResponse {
        categories: values.values,
        total: values.total,
    }))
}

/// GET /items/brands
pub async fn list_brands(State(state): State<AppState>) -> Result<Json<BrandsResponse>, ApiError> {
    let values = state
        .catalog
        .brands()
        .await
        .map_err(|e| state.api_error(e))?;

    Ok(Json(BrandsResponse {
        brands: values.values,
        total: values.total,
    }))
}
