//! Database driver adapters.
//!
//! A driver owns the version table for one SQL dialect: it creates the
//! table, reads back the latest applied version and records new versions.
//! Migration bodies themselves are executed by the migrator, not the driver.

pub mod postgres;
pub mod sqlite;

use async_trait::async_trait;
use sqlx::{AnyConnection, AnyPool};

/// Constructor for a driver, given the pool and the version table name.
pub type NewDriver = fn(AnyPool, &str) -> Box<dyn Driver>;

/// Version bookkeeping for one SQL dialect.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Returns the driver name, matched against the driver tag of migration files.
    fn name(&self) -> &str;

    /// Creates the version table if it does not exist.
    async fn create_version_table(&self) -> Result<(), sqlx::Error>;

    /// Returns the most recent schema version, or 0 if none was recorded.
    async fn get_version(&self) -> Result<i64, sqlx::Error>;

    /// Records `version` on the connection of an open transaction.
    ///
    /// Implementations must not commit or roll back.
    async fn add_version(&self, conn: &mut AnyConnection, version: i64) -> Result<(), sqlx::Error>;
}

#[cfg(test)]
pub(crate) mod testing {
    use sqlx::any::AnyPoolOptions;
    use sqlx::AnyPool;

    /// Single connection in-memory SQLite pool.
    pub async fn create_test_pool() -> AnyPool {
        sqlx::any::install_default_drivers();
        AnyPoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory SQLite pool")
    }
}
