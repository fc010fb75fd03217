//! Migration file descriptors.
//!
//! A migration file is named `<version>_<name>[.<driver>].sql`, for example
//! `01_create_users_table.sql` or `02_add_email_to_users_table.postgres.sql`.
//! Underscores in the name part become spaces in [`Migration::name`].

use crate::error::{MigrateError, Result};

/// Extension every migration file carries.
pub const MIGRATION_FILE_EXT: &str = ".sql";

/// Separates the version from the name.
pub const MIGRATION_SEPARATOR: char = '_';

/// Separates the name from the optional driver tag.
pub const MIGRATION_DRIVER_SEPARATOR: char = '.';

/// A migration discovered in the migrations directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Ordering key, unique per driver.
    pub version: i64,
    /// Human readable name derived from the file name.
    pub name: String,
    /// Driver the migration is restricted to, empty for every driver.
    pub driver: String,
    /// Location of the SQL body inside the file source.
    pub file_path: String,
}

impl Migration {
    /// Parses a migration file name found in `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::InvalidExtension`] when the file does not end
    /// in `.sql`, [`MigrateError::InvalidFileName`] when it lacks a
    /// `<version>_<name>` stem and [`MigrateError::InvalidVersion`] when the
    /// version is not a number.
    pub fn parse(dir: &str, file_name: &str) -> Result<Self> {
        let stem = file_name
            .strip_suffix(MIGRATION_FILE_EXT)
            .ok_or_else(|| MigrateError::InvalidExtension(file_name.to_string()))?;

        let (stem, driver) = stem
            .rsplit_once(MIGRATION_DRIVER_SEPARATOR)
            .unwrap_or((stem, ""));

        let (version, name) = stem
            .split_once(MIGRATION_SEPARATOR)
            .filter(|(version, name)| !version.is_empty() && !name.is_empty())
            .ok_or_else(|| MigrateError::InvalidFileName(file_name.to_string()))?;

        let version: i64 = version
            .parse()
            .map_err(|source| MigrateError::InvalidVersion {
                file_name: file_name.to_string(),
                source,
            })?;
        if version < 0 {
            return Err(MigrateError::InvalidFileName(file_name.to_string()));
        }

        Ok(Self {
            version,
            name: name.replace(MIGRATION_SEPARATOR, " "),
            driver: driver.to_string(),
            file_path: join_path(dir, file_name),
        })
    }

    /// Returns whether this migration runs on every driver.
    #[must_use]
    pub fn is_universal(&self) -> bool {
        self.driver.is_empty()
    }

    /// Returns whether this migration applies to the named driver.
    #[must_use]
    pub fn applies_to(&self, driver: &str) -> bool {
        self.is_universal() || self.driver == driver
    }
}

/// Joins a directory and a file name with `/`, the separator file sources use.
pub(crate) fn join_path(dir: &str, file_name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() || dir == "." {
        file_name.to_string()
    } else {
        format!("{dir}/{file_name}")
    }
}
