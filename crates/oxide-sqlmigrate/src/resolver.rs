//! Migration discovery.
//!
//! Turns a directory listing into the ordered set of migrations that apply
//! to one driver.

use tracing::debug;

use crate::error::{MigrateError, Result};
use crate::migration::{Migration, MIGRATION_FILE_EXT};
use crate::source::FileSource;

/// Loads the migrations in `dir` that apply to `driver`, sorted by version.
///
/// Files without the `.sql` extension and subdirectories are ignored. When a
/// universal migration and a migration tagged for `driver` share a version,
/// the tagged one is kept.
///
/// # Errors
///
/// Fails if the directory cannot be listed, if a file name cannot be parsed,
/// or if two files declare the same version for the same driver tag.
pub fn load_migrations<F>(files: &F, dir: &str, driver: &str) -> Result<Vec<Migration>>
where
    F: FileSource + ?Sized,
{
    let entries = files
        .read_dir(dir)
        .map_err(|source| MigrateError::ReadDirectory {
            directory: dir.to_string(),
            source,
        })?;

    let mut migrations: Vec<Migration> = Vec::new();
    for entry in entries {
        if entry.is_dir || !entry.name.ends_with(MIGRATION_FILE_EXT) {
            continue;
        }

        let migration = Migration::parse(dir, &entry.name)?;
        if !migration.applies_to(driver) {
            debug!(file = %entry.name, driver, "Skipping migration for another driver");
            continue;
        }

        match migrations
            .iter_mut()
            .find(|m| m.version == migration.version)
        {
            Some(existing) if existing.driver == migration.driver => {
                return Err(MigrateError::DuplicateVersion {
                    version: migration.version,
                    driver1: existing.driver.clone(),
                    driver2: migration.driver,
                });
            }
            Some(existing) => {
                if migration.driver == driver {
                    debug!(
                        version = migration.version,
                        file = %migration.file_path,
                        replaces = %existing.file_path,
                        "Using driver specific migration"
                    );
                    *existing = migration;
                }
            }
            None => migrations.push(migration),
        }
    }

    migrations.sort_by_key(|m| m.version);
    Ok(migrations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryFiles;

    fn testdata() -> MemoryFiles {
        MemoryFiles::new()
            .with_file("testdata/1_initial.sql", "CREATE TABLE a (id INTEGER);")
            .with_file(
                "testdata/2_some_changes.postgres.sql",
                "ALTER TABLE a ADD COLUMN b TEXT;",
            )
            .with_file(
                "testdata/2_some_changes.sqlite.sql",
                "ALTER TABLE a ADD COLUMN b TEXT;",
            )
    }

    #[test]
    fn test_load_migrations() {
        let migrations = load_migrations(&testdata(), "testdata", "postgres").unwrap();

        assert_eq!(
            migrations,
            vec![
                Migration {
                    version: 1,
                    name: "initial".to_string(),
                    driver: String::new(),
                    file_path: "testdata/1_initial.sql".to_string(),
                },
                Migration {
                    version: 2,
                    name: "some changes".to_string(),
                    driver: "postgres".to_string(),
                    file_path: "testdata/2_some_changes.postgres.sql".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_load_is_deterministic() {
        let files = testdata();
        let first = load_migrations(&files, "testdata", "sqlite").unwrap();
        let second = load_migrations(&files, "testdata", "sqlite").unwrap();
        assert_eq!(first, second);
        assert_eq!(first[1].driver, "sqlite");
    }

    #[test]
    fn test_sorted_by_version_not_name() {
        let files = MemoryFiles::new()
            .with_file("m/10_ten.sql", "")
            .with_file("m/2_two.sql", "")
            .with_file("m/1_one.sql", "");
        let versions: Vec<i64> = load_migrations(&files, "m", "sqlite")
            .unwrap()
            .iter()
            .map(|m| m.version)
            .collect();
        assert_eq!(versions, vec![1, 2, 10]);
    }

    #[test]
    fn test_driver_specific_replaces_universal() {
        let files = MemoryFiles::new()
            .with_file("m/1_initial.sql", "")
            .with_file("m/1_initial.sqlite.sql", "");
        let migrations = load_migrations(&files, "m", "sqlite").unwrap();
        assert_eq!(migrations.len(), 1);
        assert_eq!(migrations[0].driver, "sqlite");
        assert_eq!(migrations[0].file_path, "m/1_initial.sqlite.sql");
    }

    #[test]
    fn test_universal_does_not_replace_driver_specific() {
        // `1_a...` sorts before `1_b...`, so the tagged file is loaded first.
        let files = MemoryFiles::new()
            .with_file("m/1_a_tagged.sqlite.sql", "")
            .with_file("m/1_b_universal.sql", "");
        let migrations = load_migrations(&files, "m", "sqlite").unwrap();
        assert_eq!(migrations.len(), 1);
        assert_eq!(migrations[0].file_path, "m/1_a_tagged.sqlite.sql");
    }

    #[test]
    fn test_other_driver_is_ignored() {
        let files = MemoryFiles::new()
            .with_file("m/1_initial.sql", "")
            .with_file("m/2_pg_only.postgres.sql", "");
        let migrations = load_migrations(&files, "m", "sqlite").unwrap();
        assert_eq!(migrations.len(), 1);
        assert_eq!(migrations[0].version, 1);
    }

    #[test]
    fn test_duplicate_universal_versions() {
        let files = MemoryFiles::new()
            .with_file("m/1_first.sql", "")
            .with_file("m/1_second.sql", "");
        let err = load_migrations(&files, "m", "sqlite").unwrap_err();
        assert!(matches!(
            err,
            MigrateError::DuplicateVersion { version: 1, ref driver1, ref driver2 }
                if driver1.is_empty() && driver2.is_empty()
        ));
    }

    #[test]
    fn test_duplicate_driver_versions() {
        let files = MemoryFiles::new()
            .with_file("m/3_first.postgres.sql", "")
            .with_file("m/3_second.postgres.sql", "");
        let err = load_migrations(&files, "m", "postgres").unwrap_err();
        assert_eq!(
            err.to_string(),
            "duplicate migration version and driver: version=3, driver1=postgres, driver2=postgres"
        );
    }

    #[test]
    fn test_skips_directories_and_other_files() {
        let files = MemoryFiles::new()
            .with_file("m/1_initial.sql", "")
            .with_file("m/README.md", "")
            .with_file("m/archive.sql/0_old.sql", "");
        let migrations = load_migrations(&files, "m", "sqlite").unwrap();
        assert_eq!(migrations.len(), 1);
    }

    #[test]
    fn test_invalid_file_name_aborts() {
        let files = MemoryFiles::new()
            .with_file("m/1_initial.sql", "")
            .with_file("m/oops.sql", "");
        let err = load_migrations(&files, "m", "sqlite").unwrap_err();
        assert!(matches!(err, MigrateError::InvalidFileName(ref f) if f == "oops.sql"));
    }

    #[test]
    fn test_wrong_extension_is_not_loaded() {
        let files = MemoryFiles::new().with_file("m/5_bad_name.sqll", "");
        let migrations = load_migrations(&files, "m", "sqlite").unwrap();
        assert!(migrations.is_empty());
    }

    #[test]
    fn test_missing_directory() {
        let err = load_migrations(&MemoryFiles::new(), "migrations", "sqlite").unwrap_err();
        assert!(matches!(
            err,
            MigrateError::ReadDirectory { ref directory, .. } if directory == "migrations"
        ));
    }
}
