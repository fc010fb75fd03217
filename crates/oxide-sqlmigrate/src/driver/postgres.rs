//! PostgreSQL driver.

use async_trait::async_trait;
use sqlx::{AnyConnection, AnyPool};

use super::Driver;

/// Name of the PostgreSQL driver, used as driver tag in file names.
pub const NAME: &str = "postgres";

/// Creates a PostgreSQL driver storing versions in `table_name`.
///
/// The table name is interpolated into SQL as is and must be trusted.
#[must_use]
pub fn new(db: AnyPool, table_name: &str) -> Box<dyn Driver> {
    Box::new(PostgresDriver::new(db, table_name))
}

/// Version bookkeeping for PostgreSQL.
#[derive(Debug, Clone)]
pub struct PostgresDriver {
    db: AnyPool,
    table_name: String,
}

impl PostgresDriver {
    /// Creates a new PostgreSQL driver.
    pub fn new(db: AnyPool, table_name: impl Into<String>) -> Self {
        Self {
            db,
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl Driver for PostgresDriver {
    fn name(&self) -> &str {
        NAME
    }

    async fn create_version_table(&self) -> Result<(), sqlx::Error> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (version BIGINT PRIMARY KEY, date TIMESTAMP DEFAULT CURRENT_TIMESTAMP)",
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
        let sql = format!("INSERT INTO {} (version) VALUES ($1)", self.table_name);
        sqlx::query(&sql).bind(version).execute(conn).await?;
        Ok(())
    }
}
