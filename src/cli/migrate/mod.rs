//! Migrate command - applies the catalog schema and exits

use tracing::info;

/// Apply pending migrations against `database.url`
pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let pool = crate::create_pool(&config.database)?;
    let applied = crate::run_migrations(&pool).await?;

    if applied == 0 {
        info!("Schema already up to date");
    }

    pool.close().await;
    Ok(())
}
