//! Error types for the migration system.

use std::num::ParseIntError;
use std::time::Duration;

/// Errors that can occur while resolving or applying migrations.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// No database pool was given to the migrator.
    #[error("no database provided")]
    NoDatabase,

    /// No driver constructor was given to the migrator.
    #[error("no driver provided")]
    NoDriver,

    /// The migrations directory could not be listed.
    #[error("failed to read migrations directory '{directory}'")]
    ReadDirectory {
        /// Directory that was listed.
        directory: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file does not end in `.sql`.
    #[error("invalid migration file extension: {0}")]
    InvalidExtension(String),

    /// The file name is not `<version>_<name>[.<driver>].sql`.
    #[error("invalid migration file name: {0}")]
    InvalidFileName(String),

    /// The version prefix of the file name is not a number.
    #[error("failed to parse migration version of '{file_name}'")]
    InvalidVersion {
        /// Offending file name.
        file_name: String,
        /// Parse error for the version prefix.
        #[source]
        source: ParseIntError,
    },

    /// Two migrations share a version and a driver tag.
    #[error(
        "duplicate migration version and driver: version={version}, driver1={driver1}, driver2={driver2}"
    )]
    DuplicateVersion {
        /// Conflicting version.
        version: i64,
        /// Driver tag of the migration loaded first.
        driver1: String,
        /// Driver tag of the migration loaded second.
        driver2: String,
    },

    /// The migrations directory holds no applicable migration.
    #[error("no migrations found in {directory}")]
    NoMigrations {
        /// Directory that was searched.
        directory: String,
    },

    /// The version table could not be created.
    #[error("failed to create version table")]
    CreateVersionTable(#[source] sqlx::Error),

    /// The current schema version could not be read.
    #[error("failed to get current version")]
    GetVersion(#[source] sqlx::Error),

    /// The database is at a version newer than every known migration.
    #[error("schema version is ahead of migrations: current={current}, latest={latest}")]
    SchemaAhead {
        /// Version stored in the database.
        current: i64,
        /// Highest version found on disk.
        latest: i64,
    },

    /// A single migration failed to apply.
    #[error("migration {name} failed")]
    Migration {
        /// Human readable migration name.
        name: String,
        /// Path of the migration file inside the file source.
        file_path: String,
        /// Version of the failed migration.
        version: i64,
        /// What went wrong.
        #[source]
        source: ExecuteError,
    },

    /// The run did not finish within the configured timeout.
    #[error("migration run timed out after {0:?}")]
    TimedOut(Duration),
}

/// Failure of one step while applying a single migration.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    /// The migration body could not be read.
    #[error("failed to read migration file")]
    Read(#[source] std::io::Error),

    /// The transaction could not be started.
    #[error("failed to start transaction")]
    Begin(#[source] sqlx::Error),

    /// The migration body failed to execute.
    #[error("failed to execute migration")]
    Execute(#[source] sqlx::Error),

    /// The version row could not be written.
    #[error("failed to set version")]
    SetVersion(#[source] sqlx::Error),

    /// The transaction could not be committed.
    #[error(transparent)]
    Commit(sqlx::Error),
}

impl MigrateError {
    /// Returns the failed step when this is a per-migration error.
    #[must_use]
    pub const fn execute_error(&self) -> Option<&ExecuteError> {
        match self {
            Self::Migration { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
