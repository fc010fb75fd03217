//! oxide-sqlmigrate CLI
//!
//! Command-line tool for applying versioned SQL migrations.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use sqlx::any::AnyPoolOptions;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_sqlmigrate::prelude::*;

/// Versioned SQL file migrations for Rust.
#[derive(Parser)]
#[command(name = "oxide-sqlmigrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
    database: String,

    /// Migrations directory.
    #[arg(short, long, default_value = "migrations")]
    migrations_dir: PathBuf,

    /// Name of the version table.
    #[arg(short, long, default_value = oxide_sqlmigrate::config::DEFAULT_TABLE_NAME)]
    table: String,

    /// Database driver (detected from the URL if not specified).
    #[arg(long, value_enum)]
    driver: Option<DriverKind>,

    /// Abort after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations.
    Migrate,

    /// Show migration status.
    Status,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DriverKind {
    Sqlite,
    Postgres,
}

impl DriverKind {
    fn from_url(url: &str) -> Self {
        if url.starts_with("postgres:") || url.starts_with("postgresql:") {
            Self::Postgres
        } else {
            Self::Sqlite
        }
    }

    fn constructor(self) -> NewDriver {
        match self {
            Self::Sqlite => sqlite::new,
            Self::Postgres => postgres::new,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Connect to database
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .connect(&cli.database)
        .await?;

    let driver = cli
        .driver
        .unwrap_or_else(|| DriverKind::from_url(&cli.database));

    // The directory is split into a filesystem root and the listed directory
    // so file paths in errors stay relative, e.g. `migrations/1_initial.sql`.
    let (root, directory) = match (cli.migrations_dir.parent(), cli.migrations_dir.file_name()) {
        (Some(parent), Some(name)) => (
            parent.to_path_buf(),
            name.to_string_lossy().into_owned(),
        ),
        _ => (PathBuf::from("."), cli.migrations_dir.to_string_lossy().into_owned()),
    };

    let mut migrator = Migrator::new(Directory::new(root))
        .database(pool)
        .driver(driver.constructor())
        .directory(directory)
        .table_name(cli.table);
    if let Some(secs) = cli.timeout_secs {
        migrator = migrator.timeout(Duration::from_secs(secs));
    }

    match cli.command {
        Commands::Migrate => {
            let applied = migrator.run().await?;
            info!("{} migration(s) applied.", applied);
        }

        Commands::Status => {
            let status = migrator.status().await?;

            println!("\nSchema version: {}", status.current);
            println!("{:-<60}", "");
            for migration in &status.migrations {
                let mark = if status.is_applied(migration) { "X" } else { " " };
                let driver = if migration.is_universal() {
                    String::new()
                } else {
                    format!(" ({})", migration.driver)
                };
                println!(" [{}] {} {}{}", mark, migration.version, migration.name, driver);
            }
            println!();

            let pending = status.pending().len();
            if pending == 0 {
                info!("Database schema is up to date.");
            } else {
                info!("{} migration(s) pending.", pending);
            }
        }
    }

    Ok(())
}
