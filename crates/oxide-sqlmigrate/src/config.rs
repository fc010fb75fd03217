//! Migrator configuration.

use std::time::Duration;

use tracing::Dispatch;

/// Directory migrations are loaded from when none is configured.
pub const DEFAULT_DIRECTORY: &str = "migrations";

/// Name of the version table when none is configured.
pub const DEFAULT_TABLE_NAME: &str = "gomigrate";

/// Settings for a migration run.
///
/// Built from [`Config::default`] and the builder methods; calling a method
/// twice keeps the last value.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory inside the file source holding the migration files.
    pub directory: String,
    /// Name of the table the applied versions are stored in.
    pub table_name: String,
    /// Sink for progress diagnostics. `None` uses the default subscriber.
    pub logger: Option<Dispatch>,
    /// Upper bound for the whole run.
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory: DEFAULT_DIRECTORY.to_string(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            logger: None,
            timeout: None,
        }
    }
}

impl Config {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the directory the migration files are loaded from.
    #[must_use]
    pub fn directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Sets the name of the table the schema version is stored in.
    #[must_use]
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Sends the diagnostics of a run to `logger` instead of the default subscriber.
    #[must_use]
    pub fn logger(mut self, logger: impl Into<Dispatch>) -> Self {
        self.logger = Some(logger.into());
        self
    }

    /// Aborts the run once `timeout` has elapsed.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.directory, "migrations");
        assert_eq!(config.table_name, "gomigrate");
        assert!(config.logger.is_none());
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_last_value_wins() {
        let config = Config::new()
            .directory("db/migrations")
            .table_name("first")
            .directory("sql")
            .table_name("schema_version")
            .timeout(Duration::from_secs(1))
            .timeout(Duration::from_secs(5));
        assert_eq!(config.directory, "sql");
        assert_eq!(config.table_name, "schema_version");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }
}
