//! PostgreSQL item repository implementation

use std::time::Instant;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::debug;

use crate::domain::catalog::{
    AggregateStats, CountQuery, DistinctColumn, Item, ItemQuery, ItemRepository, OrderBy,
    Predicate, SortDirection, SortField, Window,
};
use crate::domain::DomainError;
use crate::infrastructure::metrics::record_store_query;

const ITEM_COLUMNS: &str = "id, sku, name, description, category, brand, price, \
                            stock_quantity, rating, reviews_count, created_at, updated_at";

/// PostgreSQL implementation of ItemRepository
#[derive(Debug, Clone)]
pub struct PostgresItemRepository {
    pool: PgPool,
}

impl PostgresItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemRepository for PostgresItemRepository {
    async fn find_page(&self, query: &ItemQuery) -> Result<Vec<Item>, DomainError> {
        let mut qb = page_query(query)?;
        debug!(sql = qb.sql(), "Fetching item page");

        let started = Instant::now();
        let rows = qb.build().fetch_all(&self.pool).await;
        record_store_query("list", started.elapsed(), rows.is_ok());

        let rows = rows.map_err(|e| DomainError::storage(format!("Failed to list items: {}", e)))?;

        rows.iter().map(row_to_item).collect()
    }

    async fn count(&self, query: &CountQuery) -> Result<u64, DomainError> {
        let mut qb = count_query(query);
        debug!(sql = qb.sql(), "Counting items");

        let started = Instant::now();
        let count = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await;
        record_store_query("count", started.elapsed(), count.is_ok());

        let count =
            count.map_err(|e| DomainError::storage(format!("Failed to count items: {}", e)))?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Item>, DomainError> {
        let sql = format!("SELECT {} FROM items WHERE id = $1", ITEM_COLUMNS);

        let started = Instant::now();
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        record_store_query("detail", started.elapsed(), row.is_ok());

        let row = row.map_err(|e| DomainError::storage(format!("Failed to get item: {}", e)))?;

        row.as_ref().map(row_to_item).transpose()
    }

    async fn aggregate_stats(&self) -> Result<AggregateStats, DomainError> {
        let started = Instant::now();
        let row = sqlx::query(
            r#"
            SELECT COUNT(*)                                 AS total_products,
                   COUNT(DISTINCT category)                 AS total_categories,
                   COUNT(DISTINCT brand)                    AS total_brands,
                   COALESCE(MIN(price), 0)                  AS price_min,
                   COALESCE(MAX(price), 0)                  AS price_max,
                   COALESCE(ROUND(AVG(rating), 2), 0)       AS avg_rating,
                   COALESCE(SUM(stock_quantity), 0)::BIGINT AS total_stock
            FROM items
            "#,
        )
        .fetch_one(&self.pool)
        .await;
        record_store_query("stats", started.elapsed(), row.is_ok());

        let row =
            row.map_err(|e| DomainError::storage(format!("Failed to compute stats: {}", e)))?;

        Ok(AggregateStats {
            total_products: column(&row, "total_products")?,
            total_categories: column(&row, "total_categories")?,
            total_brands: column(&row, "total_brands")?,
            price_min: column(&row, "price_min")?,
            price_max: column(&row, "price_max")?,
            avg_rating: column::<Decimal>(&row, "avg_rating")?.normalize(),
            total_stock: column(&row, "total_stock")?,
        })
    }

    async fn distinct_values(&self, column: DistinctColumn) -> Result<Vec<String>, DomainError> {
        let sql = distinct_query(column);

        let started = Instant::now();
        let values = sqlx::query_scalar::<_, String>(&sql)
            .fetch_all(&self.pool)
            .await;
        record_store_query(shape_for(column), started.elapsed(), values.is_ok());

        values.map_err(|e| {
            DomainError::storage(format!("Failed to list distinct {} values: {}", column.as_str(), e))
        })
    }
}

fn shape_for(column: DistinctColumn) -> &'static str {
    match column {
        DistinctColumn::Category => "categories",
        DistinctColumn::Brand => "brands",
    }
}

fn page_query(query: &ItemQuery) -> Result<QueryBuilder<'static, Postgres>, DomainError> {
    let mut qb = QueryBuilder::new(format!("SELECT {} FROM items WHERE 1=1", ITEM_COLUMNS));

    push_predicates(&mut qb, &query.predicates);
    push_order(&mut qb, &query.order);
    push_window(&mut qb, &query.window)?;

    Ok(qb)
}

fn count_query(query: &CountQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM items WHERE 1=1");
    push_predicates(&mut qb, &query.predicates);
    qb
}

fn push_predicates(qb: &mut QueryBuilder<'static, Postgres>, predicates: &[Predicate]) {
    for predicate in predicates {
        match predicate {
            Predicate::CategoryEq(category) => {
                qb.push(" AND category = ").push_bind(category.clone());
            }
            Predicate::BrandEq(brand) => {
                qb.push(" AND brand = ").push_bind(brand.clone());
            }
            Predicate::PriceAtLeast(min) => {
                qb.push(" AND price >= ").push_bind(*min);
            }
            Predicate::PriceAtMost(max) => {
                qb.push(" AND price <= ").push_bind(*max);
            }
            Predicate::Search(term) => {
                let pattern = format!("%{}%", escape_like(term));

                qb.push(" AND (name ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR description ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR sku ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
        }
    }
}

fn push_order(qb: &mut QueryBuilder<'static, Postgres>, order: &OrderBy) {
    let clauses = order
        .clauses()
        .into_iter()
        .map(|(field, direction)| {
            let direction = match direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            match field {
                // Byte order, independent of the database's default collation
                SortField::Name => format!("{} COLLATE \"C\" {}", field.as_str(), direction),
                _ => format!("{} {}", field.as_str(), direction),
            }
        })
        .collect::<Vec<_>>()
        .join(", ");

    qb.push(" ORDER BY ").push(clauses);
}

/// Distinct non-null values in byte order; column names come from the enum
fn distinct_query(column: DistinctColumn) -> String {
    let name = column.as_str();
    format!(
        "SELECT DISTINCT {name} COLLATE \"C\" AS {name} FROM items \
         WHERE {name} IS NOT NULL ORDER BY {name}"
    )
}

fn push_window(qb: &mut QueryBuilder<'static, Postgres>, window: &Window) -> Result<(), DomainError> {
    let offset = i64::try_from(window.offset)
        .map_err(|_| DomainError::invalid_query("page is out of range"))?;

    qb.push(" LIMIT ")
        .push_bind(i64::from(window.limit))
        .push(" OFFSET ")
        .push_bind(offset);

    Ok(())
}

/// Escapes LIKE metacharacters so the term matches literally (backslash is
/// PostgreSQL's default LIKE escape)
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());

    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| DomainError::storage(format!("Invalid '{}' column in database: {}", name, e)))
}

fn row_to_item(row: &PgRow) -> Result<Item, DomainError> {
    Ok(Item {
        id: column(row, "id")?,
        sku: column(row, "sku")?,
        name: column(row, "name")?,
        description: column(row, "description")?,
        category: column(row, "category")?,
        brand: column(row, "brand")?,
        price: column(row, "price")?,
        stock_quantity: column(row, "stock_quantity")?,
        rating: column(row, "rating")?,
        reviews_count: column(row, "reviews_count")?,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}
