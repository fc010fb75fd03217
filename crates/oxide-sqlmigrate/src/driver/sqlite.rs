//! SQLite driver.

use async_trait::async_trait;
use sqlx::{AnyConnection, AnyPool};

use super::Driver;

/// Name of the SQLite driver, used as driver tag in file names.
pub const NAME: &str = "sqlite";

/// Creates a SQLite driver storing versions in `table_name`.
///
/// The table name is interpolated into SQL as is and must be trusted.
#[must_use]
pub fn new(db: AnyPool, table_name: &str) -> Box<dyn Driver> {
    Box::new(SqliteDriver::new(db, table_name))
}

/// Version bookkeeping for SQLite.
#[derive(Debug, Clone)]
pub struct SqliteDriver {
    db: AnyPool,
    table_name: String,
}

impl SqliteDriver {
    /// Creates a new SQLite driver.
    pub fn new(db: AnyPool, table_name: impl Into<String>) -> Self {
        Self {
            db,
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl Driver for SqliteDriver {
    fn name(&self) -> &str {
        NAME
    }

    async fn create_version_table(&self) -> Result<(), sqlx::Error> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (version INTEGER PRIMARY KEY, date TIMESTAMP DEFAULT CURRENT_TIMESTAMP)",
            self.table_name
        );
        sqlx::query(&sql).execute(&self.db).await?;
        Ok(())
    }

    async fn get_version(&self) -> Result<i64, sqlx::Error> {
        let sql = format!(
            "SELECT version FROM {} ORDER BY version DESC LIMIT 1",
            self.table_name
        );
        let version: Option<i64> = sqlx::query_scalar(&sql)
            .fetch_optional(&self.db)
            .await?;
        Ok(version.unwrap_or(0))
    }

    async fn add_version(&self, conn: &mut AnyConnection, version: i64) -> Result<(), sqlx::Error> {
        let sql = format!("INSERT INTO {} (version) VALUES (?)", self.table_name);
        sqlx::query(&sql).bind(version).execute(conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testing::create_test_pool;

    #[tokio::test]
    async fn test_create_version_table() {
        let pool = create_test_pool().await;
        let driver = new(pool, "gomigrate");

        // Should not fail
        driver.create_version_table().await.unwrap();
        // Should be idempotent
        driver.create_version_table().await.unwrap();
        assert_eq!(driver.name(), "sqlite");
    }

    #[tokio::test]
    async fn test_empty_table_is_version_zero() {
        let pool = create_test_pool().await;
        let driver = new(pool, "gomigrate");
        driver.create_version_table().await.unwrap();

        assert_eq!(driver.get_version().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_version_in_transaction() {
        let pool = create_test_pool().await;
        let driver = new(pool.clone(), "schema_versions");
        driver.create_version_table().await.unwrap();

        let mut tx = pool.begin().await.unwrap();
        driver.add_version(&mut tx, 1).await.unwrap();
        driver.add_version(&mut tx, 3).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(driver.get_version().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_add_version_rolled_back() {
        let pool = create_test_pool().await;
        let driver = new(pool.clone(), "gomigrate");
        driver.create_version_table().await.unwrap();

        let mut tx = pool.begin().await.unwrap();
        driver.add_version(&mut tx, 7).await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(driver.get_version().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_version_is_rejected() {
        let pool = create_test_pool().await;
        let driver = new(pool.clone(), "gomigrate");
        driver.create_version_table().await.unwrap();

        let mut tx = pool.begin().await.unwrap();
        driver.add_version(&mut tx, 1).await.unwrap();
        assert!(driver.add_version(&mut tx, 1).await.is_err());
    }
}
