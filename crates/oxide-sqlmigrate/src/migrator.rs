//! Migration orchestration.
//!
//! [`Migrator`] ties the pieces together: it loads the migrations for the
//! active driver, compares them with the version stored in the database and
//! applies the missing ones in order.

use std::future::Future;
use std::time::Duration;

use sqlx::AnyPool;
use tracing::instrument::WithSubscriber;
use tracing::{debug, info};

use crate::config::Config;
use crate::driver::{Driver, NewDriver};
use crate::error::{MigrateError, Result};
use crate::executor::MigrationExecutor;
use crate::migration::Migration;
use crate::resolver::load_migrations;
use crate::source::FileSource;

/// Brings a database schema up to date from versioned SQL files.
///
/// ```rust,ignore
/// use oxide_sqlmigrate::prelude::*;
///
/// let applied = Migrator::new(Directory::new("."))
///     .database(pool)
///     .driver(sqlite::new)
///     .table_name("schema_version")
///     .run()
///     .await?;
/// ```
pub struct Migrator<F> {
    files: F,
    db: Option<AnyPool>,
    new_driver: Option<NewDriver>,
    config: Config,
}

/// Schema version stored in the database next to the known migrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// Version stored in the version table, 0 if none.
    pub current: i64,
    /// Migrations applying to the driver, sorted by version.
    pub migrations: Vec<Migration>,
}

impl Status {
    /// Returns the highest known migration version.
    #[must_use]
    pub fn latest(&self) -> Option<i64> {
        self.migrations.last().map(|m| m.version)
    }

    /// Returns the migrations that are not applied yet.
    #[must_use]
    pub fn pending(&self) -> Vec<&Migration> {
        self.migrations
            .iter()
            .filter(|m| m.version > self.current)
            .collect()
    }

    /// Returns whether `migration` is covered by the stored version.
    #[must_use]
    pub const fn is_applied(&self, migration: &Migration) -> bool {
        migration.version <= self.current
    }
}

impl<F: FileSource> Migrator<F> {
    /// Creates a migrator reading migration files from `files`.
    pub fn new(files: F) -> Self {
        Self {
            files,
            db: None,
            new_driver: None,
            config: Config::default(),
        }
    }

    /// Sets the database to migrate.
    #[must_use]
    pub fn database(mut self, db: AnyPool) -> Self {
        self.db = Some(db);
        self
    }

    /// Sets the driver constructor for the database dialect.
    #[must_use]
    pub fn driver(mut self, new_driver: NewDriver) -> Self {
        self.new_driver = Some(new_driver);
        self
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Sets the directory the migration files are loaded from.
    #[must_use]
    pub fn directory(mut self, directory: impl Into<String>) -> Self {
        self.config = self.config.directory(directory);
        self
    }

    /// Sets the name of the table the schema version is stored in.
    #[must_use]
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.config = self.config.table_name(table_name);
        self
    }

    /// Sends the diagnostics of a run to `logger`.
    #[must_use]
    pub fn logger(mut self, logger: impl Into<tracing::Dispatch>) -> Self {
        self.config = self.config.logger(logger);
        self
    }

    /// Aborts a run once `timeout` has elapsed.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn configuration(&self) -> &Config {
        &self.config
    }

    /// Applies every migration newer than the stored schema version.
    ///
    /// Each migration runs in its own transaction. The run stops at the first
    /// failing migration; migrations applied before it stay applied, so
    /// running again resumes after the last successful one. Returns the
    /// number of migrations applied, 0 when the schema was up to date.
    ///
    /// # Errors
    ///
    /// * No database or driver was set
    /// * The migration files cannot be listed or parsed, or none was found
    /// * The version table cannot be created or read
    /// * The stored version is ahead of the newest migration
    /// * A migration fails to apply
    /// * The configured timeout elapsed
    pub async fn run(&self) -> Result<usize> {
        self.scoped(self.migrate()).await
    }

    /// Reports the stored schema version and the known migrations without
    /// applying anything.
    ///
    /// # Errors
    ///
    /// Fails for the same reasons as [`Migrator::run`] up to reading the
    /// stored version.
    pub async fn status(&self) -> Result<Status> {
        self.scoped(async {
            let (_, driver) = self.validate()?;
            let migrations = self.load(driver.as_ref())?;
            let current = Self::current_version(driver.as_ref()).await?;
            Ok(Status {
                current,
                migrations,
            })
        })
        .await
    }

    /// Runs `fut` with the configured logger and timeout.
    async fn scoped<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        let fut = async move {
            match self.config.timeout {
                Some(timeout) => tokio::time::timeout(timeout, fut)
                    .await
                    .map_err(|_| MigrateError::TimedOut(timeout))?,
                None => fut.await,
            }
        };

        match &self.config.logger {
            Some(logger) => fut.with_subscriber(logger.clone()).await,
            None => fut.await,
        }
    }

    async fn migrate(&self) -> Result<usize> {
        let (pool, driver) = self.validate()?;
        let migrations = self.load(driver.as_ref())?;
        let current = Self::current_version(driver.as_ref()).await?;

        // Sorted and non-empty after `load`.
        let latest = migrations[migrations.len() - 1].version;

        if current == latest {
            info!(version = current, "Database schema is up to date");
            return Ok(0);
        }

        if current > latest {
            return Err(MigrateError::SchemaAhead { current, latest });
        }

        let pending = migrations.iter().filter(|m| m.version > current);
        let executor = MigrationExecutor::new(pool, driver.as_ref(), &self.files);
        let applied = executor.apply_all(pending).await?;

        info!(applied, version = latest, "Database schema migrated");
        Ok(applied)
    }

    fn validate(&self) -> Result<(&AnyPool, Box<dyn Driver>)> {
        let pool = self.db.as_ref().ok_or(MigrateError::NoDatabase)?;
        let new_driver = self.new_driver.ok_or(MigrateError::NoDriver)?;
        let driver = new_driver(pool.clone(), &self.config.table_name);
        Ok((pool, driver))
    }

    fn load(&self, driver: &dyn Driver) -> Result<Vec<Migration>> {
        let directory = &self.config.directory;
        let migrations = load_migrations(&self.files, directory, driver.name())?;
        if migrations.is_empty() {
            return Err(MigrateError::NoMigrations {
                directory: directory.clone(),
            });
        }
        debug!(
            count = migrations.len(),
            directory = %directory,
            driver = driver.name(),
            "Loaded migrations"
        );
        Ok(migrations)
    }

    async fn current_version(driver: &dyn Driver) -> Result<i64> {
        driver
            .create_version_table()
            .await
            .map_err(MigrateError::CreateVersionTable)?;

        let current = driver
            .get_version()
            .await
            .map_err(MigrateError::GetVersion)?;
        debug!(version = current, "Current schema version");
        Ok(current)
    }
}

/// Applies the migrations in `files` to `db`.
///
/// Shorthand for building a [`Migrator`] with `config` and calling
/// [`Migrator::run`].
///
/// # Errors
///
/// See [`Migrator::run`].
pub async fn migrate<F: FileSource>(
    db: AnyPool,
    new_driver: NewDriver,
    files: F,
    config: Config,
) -> Result<usize> {
    Migrator::new(files)
        .database(db)
        .driver(new_driver)
        .config(config)
        .run()
        .await
}
