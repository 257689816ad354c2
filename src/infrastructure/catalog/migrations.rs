//! Schema bootstrap for the items table

use sqlx::PgPool;
use tracing::info;

use crate::domain::DomainError;

/// A versioned schema change, applied once
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    /// Executed in order inside one transaction
    pub statements: &'static [&'static str],
}

/// Migrations for the catalog schema, in version order
pub fn catalog_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Create items table",
            statements: &[
                r#"
                CREATE TABLE IF NOT EXISTS items (
                    id             BIGSERIAL PRIMARY KEY,
                    sku            VARCHAR(50)    NOT NULL UNIQUE,
                    name           VARCHAR(200)   NOT NULL,
                    description    TEXT,
                    category       VARCHAR(100)   NOT NULL,
                    brand          VARCHAR(100)   NOT NULL,
                    price          NUMERIC(10, 2) NOT NULL,
                    stock_quantity INTEGER        NOT NULL DEFAULT 0,
                    rating         NUMERIC(3, 2)  NOT NULL DEFAULT 0,
                    reviews_count  INTEGER        NOT NULL DEFAULT 0,
                    created_at     TIMESTAMPTZ    NOT NULL DEFAULT NOW(),
                    updated_at     TIMESTAMPTZ    NOT NULL DEFAULT NOW()
                )
                "#,
                "CREATE INDEX IF NOT EXISTS idx_items_name ON items (name)",
                "CREATE INDEX IF NOT EXISTS idx_items_category ON items (category)",
                "CREATE INDEX IF NOT EXISTS idx_items_brand ON items (brand)",
                "CREATE INDEX IF NOT EXISTS idx_items_price ON items (price DESC)",
                "CREATE INDEX IF NOT EXISTS idx_items_rating ON items (rating DESC)",
                "CREATE INDEX IF NOT EXISTS idx_items_created_at ON items (created_at DESC)",
                "CREATE INDEX IF NOT EXISTS idx_items_category_price ON items (category, price)",
                "CREATE INDEX IF NOT EXISTS idx_items_brand_price ON items (brand, price)",
            ],
        },
    ]
}

/// PostgreSQL migrator tracking applied versions in `_migrations`
#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    /// Applies every migration not yet recorded, returning how many ran
    pub async fn run(&self, migrations: &[Migration]) -> Result<usize, DomainError> {
        self.ensure_migrations_table().await?;

        let applied = self.applied_versions().await?;
        let mut count = 0;

        for migration in migrations {
            if applied.contains(&migration.version) {
                continue;
            }

            self.apply(migration).await?;
            info!(
                version = migration.version,
                description = migration.description,
                "Applied migration"
            );
            count += 1;
        }

        Ok(count)
    }

    async fn apply(&self, migration: &Migration) -> Result<(), DomainError> {
        let failed = |e: sqlx::Error| {
            DomainError::storage(format!(
                "Failed to run migration {}: {}",
                migration.version, e
            ))
        };

        let mut tx = self.pool.begin().await.map_err(failed)?;

        for statement in migration.statements {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(failed)?;
        }

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(migration.description)
            .execute(&mut *tx)
            .await
            .map_err(failed)?;

        tx.commit().await.map_err(failed)
    }

    /// Returns all applied migration versions
    pub async fn applied_versions(&self) -> Result<Vec<i64>, DomainError> {
        sqlx::query_scalar("SELECT version FROM _migrations ORDER BY version")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get applied migrations: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_are_strictly_increasing() {
        let migrations = catalog_migrations();

        assert!(!migrations.is_empty());
        assert!(migrations.windows(2).all(|w| w[0].version < w[1].version));
    }

    #[test]
    fn test_items_schema_has_indexes() {
        let statements = catalog_migrations()[0].statements;
        let sql = statements.join("\n");

        assert!(sql.contains("sku            VARCHAR(50)    NOT NULL UNIQUE"));
        for index in [
            "idx_items_category ",
            "idx_items_brand ",
            "idx_items_price ",
            "idx_items_rating ",
            "idx_items_created_at ",
            "idx_items_category_price ",
            "idx_items_brand_price ",
        ] {
            assert!(sql.contains(index), "missing {}", index);
        }
    }

    #[test]
    fn test_each_statement_is_single() {
        // Prepared statements reject multi-statement strings
        for migration in catalog_migrations() {
            for statement in migration.statements {
                assert!(!statement.trim().trim_end_matches(';').contains(';'));
            }
        }
    }
}
