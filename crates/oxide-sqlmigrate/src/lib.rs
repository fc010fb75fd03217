//! Versioned SQL file migrations for Rust.
//!
//! `oxide-sqlmigrate` brings a database schema up to date from a directory of
//! plain SQL files, applying each file exactly once:
//! - Files are named `<version>_<name>[.<driver>].sql` and applied in version order
//! - Each migration runs in its own transaction together with its version record
//! - A file tagged with a driver replaces the universal file of the same version
//! - The highest applied version is kept in a version table (`gomigrate` by default)
//!
//! # Architecture
//!
//! - **Migration** - Parses file names into version, name and driver tag
//! - **Resolver** - Lists, filters, deduplicates and sorts migration files
//! - **Source** - Read-only file access, on disk or in memory
//! - **Driver** - Version table handling for one SQL dialect (SQLite, PostgreSQL)
//! - **Executor** - Applies one migration in a transaction
//! - **Migrator** - Compares the stored version with the files and drives the run
//!
//! # Example
//!
//! ```rust,ignore
//! use oxide_sqlmigrate::prelude::*;
//! use sqlx::any::AnyPoolOptions;
//!
//! sqlx::any::install_default_drivers();
//! let pool = AnyPoolOptions::new().connect("sqlite:db.sqlite3").await?;
//!
//! // migrations/1_create_users_table.sql
//! // migrations/2_add_email_to_users_table.postgres.sql
//! // migrations/2_add_email_to_users_table.sqlite.sql
//! Migrator::new(Directory::new("."))
//!     .database(pool)
//!     .driver(sqlite::new)
//!     .run()
//!     .await?;
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Apply pending migrations
//! oxide-sqlmigrate --database sqlite:db.sqlite3 migrate
//!
//! # Show migration status
//! oxide-sqlmigrate --database postgres://localhost/app status
//! ```
//!
//! Concurrent runs against the same database are not coordinated; their
//! outcome depends on the database's transaction isolation.

pub mod config;
pub mod driver;
pub mod error;
pub mod executor;
pub mod migration;
pub mod migrator;
pub mod resolver;
pub mod source;

pub use migrator::{migrate, Migrator, Status};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::driver::{postgres, sqlite, Driver, NewDriver};
    pub use crate::error::{ExecuteError, MigrateError, Result};
    pub use crate::executor::MigrationExecutor;
    pub use crate::migration::Migration;
    pub use crate::migrator::{migrate, Migrator, Status};
    pub use crate::resolver::load_migrations;
    pub use crate::source::{DirEntry, Directory, FileSource, MemoryFiles};
}
