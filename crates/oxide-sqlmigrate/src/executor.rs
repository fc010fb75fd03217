//! Migration executor.
//!
//! This module applies migrations against a database. Every migration runs
//! in its own transaction together with the insert of its version row, so a
//! migration is either fully applied and recorded or not at all.

use sqlx::AnyPool;
use tracing::{debug, info, warn};

use crate::driver::Driver;
use crate::error::{ExecuteError, MigrateError, Result};
use crate::migration::Migration;
use crate::source::FileSource;

/// Applies migrations read from a file source.
pub struct MigrationExecutor<'a, F: ?Sized> {
    pool: &'a AnyPool,
    driver: &'a dyn Driver,
    files: &'a F,
}

impl<'a, F: FileSource + ?Sized> MigrationExecutor<'a, F> {
    /// Creates a new migration executor.
    pub fn new(pool: &'a AnyPool, driver: &'a dyn Driver, files: &'a F) -> Self {
        Self {
            pool,
            driver,
            files,
        }
    }

    /// Applies a single migration in one transaction.
    ///
    /// # Errors
    ///
    /// Returns the step that failed. The transaction is rolled back when the
    /// body or the version insert fails.
    pub async fn apply(&self, migration: &Migration) -> std::result::Result<(), ExecuteError> {
        info!(
            version = migration.version,
            name = %migration.name,
            "Applying migration"
        );

        let data = self
            .files
            .read_file(&migration.file_path)
            .map_err(ExecuteError::Read)?;
        let sql = String::from_utf8(data).map_err(|e| {
            ExecuteError::Read(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;

        let mut tx = self.pool.begin().await.map_err(ExecuteError::Begin)?;

        debug!(file = %migration.file_path, "Executing SQL");
        if let Err(err) = sqlx::raw_sql(&sql).execute(&mut *tx).await {
            if let Err(rollback) = tx.rollback().await {
                warn!(error = %rollback, "Rollback failed");
            }
            return Err(ExecuteError::Execute(err));
        }

        if let Err(err) = self.driver.add_version(&mut *tx, migration.version).await {
            if let Err(rollback) = tx.rollback().await {
                warn!(error = %rollback, "Rollback failed");
            }
            return Err(ExecuteError::SetVersion(err));
        }

        tx.commit().await.map_err(ExecuteError::Commit)?;

        info!(
            version = migration.version,
            name = %migration.name,
            "Migration applied successfully"
        );

        Ok(())
    }

    /// Applies migrations in order, stopping at the first failure.
    ///
    /// Returns the number of applied migrations.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Migration`] for the first migration that
    /// failed. Migrations before it stay applied.
    pub async fn apply_all<'m, I>(&self, migrations: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'m Migration>,
    {
        let mut applied = 0;
        for migration in migrations {
            self.apply(migration)
                .await
                .map_err(|source| MigrateError::Migration {
                    name: migration.name.clone(),
                    file_path: migration.file_path.clone(),
                    version: migration.version,
                    source,
                })?;
            applied += 1;
        }
        Ok(applied)
    }
}
