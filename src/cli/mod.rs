//! CLI module for the Catalog API
//!
//! - `serve`: run the HTTP API
//! - `migrate`: apply the catalog schema
//! - `cache clear`: drop every cached entry in the catalog namespace

pub mod cache;
pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Catalog API - cached, paginated item catalog
#[derive(Parser)]
#[command(name = "catalog-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server
    Serve,

    /// Apply pending database migrations and exit
    Migrate,

    /// Cache maintenance
    #[command(subcommand)]
    Cache(cache::CacheCommand),
}

/// Load `.env`, configuration and logging shared by every subcommand
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    config.validate()?;
    logging::init_logging(&config.logging)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["catalog-api", "serve"]).unwrap();
        assert!(matches!(cli.command, Command::Serve));

        let cli = Cli::try_parse_from(["catalog-api", "migrate"]).unwrap();
        assert!(matches!(cli.command, Command::Migrate));

        let cli = Cli::try_parse_from(["catalog-api", "cache", "clear"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Cache(cache::CacheCommand::Clear)
        ));
    }

    #[test]
    fn test_unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["catalog-api", "ui"]).is_err());
        assert!(Cli::try_parse_from(["catalog-api", "cache"]).is_err());
    }
}
