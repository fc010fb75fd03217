//! Embedded migrations example.
//!
//! Migration bodies are compiled into the binary and applied to an in-memory
//! SQLite database. Run with:
//!
//! ```bash
//! cargo run --example embedded -p oxide-sqlmigrate
//! ```

use std::time::Duration;

use oxide_sqlmigrate::prelude::*;
use sqlx::any::AnyPoolOptions;

const CREATE_USERS: &str = "
CREATE TABLE users (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
";

const ADD_EMAIL_SQLITE: &str = "ALTER TABLE users ADD COLUMN email TEXT;";

const ADD_EMAIL_POSTGRES: &str = "ALTER TABLE users ADD COLUMN email VARCHAR(255);";

const CREATE_POSTS: &str = "
CREATE TABLE posts (
    id INTEGER PRIMARY KEY,
    author_id INTEGER NOT NULL REFERENCES users (id),
    title TEXT NOT NULL,
    body TEXT NOT NULL DEFAULT ''
);
CREATE INDEX idx_posts_author ON posts (author_id);
";

fn migrations() -> MemoryFiles {
    MemoryFiles::new()
        .with_file("migrations/01_create_users_table.sql", CREATE_USERS)
        .with_file(
            "migrations/02_add_email_to_users_table.sqlite.sql",
            ADD_EMAIL_SQLITE,
        )
        .with_file(
            "migrations/02_add_email_to_users_table.postgres.sql",
            ADD_EMAIL_POSTGRES,
        )
        .with_file("migrations/03_create_posts_table.sql", CREATE_POSTS)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().without_time().init();

    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    let migrator = Migrator::new(migrations())
        .database(pool.clone())
        .driver(sqlite::new)
        .table_name("schema_version")
        .timeout(Duration::from_secs(10));

    let applied = migrator.run().await?;
    println!("First run applied {applied} migration(s)");

    // Nothing left to do on the second run.
    let applied = migrator.run().await?;
    println!("Second run applied {applied} migration(s)");

    let status = migrator.status().await?;
    for migration in &status.migrations {
        println!(
            "  {:>2} {:<28} {}",
            migration.version,
            migration.name,
            if migration.is_universal() {
                "any driver"
            } else {
                migration.driver.as_str()
            }
        );
    }

    sqlx::query("INSERT INTO users (username, email) VALUES ('alice', 'alice@example.com')")
        .execute(&pool)
        .await?;

    Ok(())
}
