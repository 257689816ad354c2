//! Catalog infrastructure - ItemRepository implementations and schema

mod in_memory;
mod migrations;
mod postgres;

pub use in_memory::InMemoryItemRepository;
pub use migrations::{catalog_migrations, Migration, PostgresMigrator};
pub use postgres::PostgresItemRepository;
