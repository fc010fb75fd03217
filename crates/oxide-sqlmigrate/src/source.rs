//! Read-only sources of migration files.
//!
//! The migrator never touches the filesystem directly. It lists a directory
//! and reads file bodies through a [`FileSource`], so migrations can live on
//! disk ([`Directory`]) or be compiled into the binary ([`MemoryFiles`]).

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

/// An entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File or directory name, without the parent path.
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

impl DirEntry {
    /// Creates an entry for a plain file.
    #[must_use]
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    /// Creates an entry for a directory.
    #[must_use]
    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// Read-only hierarchical file store.
///
/// Paths use `/` as separator and are relative to the root of the source.
pub trait FileSource: Send + Sync {
    /// Lists the direct children of `dir`, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` does not exist or cannot be read.
    fn read_dir(&self, dir: &str) -> io::Result<Vec<DirEntry>>;

    /// Reads the whole content of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be read.
    fn read_file(&self, path: &str) -> io::Result<Vec<u8>>;
}

impl<T: FileSource + ?Sized> FileSource for &T {
    fn read_dir(&self, dir: &str) -> io::Result<Vec<DirEntry>> {
        (**self).read_dir(dir)
    }

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        (**self).read_file(path)
    }
}

/// Files below a directory on disk.
#[derive(Debug, Clone)]
pub struct Directory {
    root: PathBuf,
}

impl Directory {
    /// Creates a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|part| !part.is_empty() && *part != ".")
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

impl FileSource for Directory {
    fn read_dir(&self, dir: &str) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(self.resolve(dir))? {
            let entry = entry?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: entry.file_type()?.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.resolve(path))
    }
}

/// Files kept in memory, keyed by their full path.
///
/// Useful for migrations embedded with `include_str!` and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryFiles {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryFiles {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file, replacing any previous content at `path`.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Adds a file, replacing any previous content at `path`.
    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) {
        let path: String = path.into();
        self.files
            .insert(path.trim_start_matches('/').to_string(), contents.into());
    }

    /// Returns the number of files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns whether the source holds no file.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileSource for MemoryFiles {
    fn read_dir(&self, dir: &str) -> io::Result<Vec<DirEntry>> {
        let dir = dir.trim_matches('/');
        let prefix = if dir.is_empty() || dir == "." {
            String::new()
        } else {
            format!("{dir}/")
        };

        let mut entries: Vec<DirEntry> = Vec::new();
        for path in self.files.keys() {
            let Some(rest) = path.strip_prefix(&prefix) else {
                continue;
            };
            let entry = match rest.split_once('/') {
                Some((child, _)) => DirEntry::dir(child),
                None => DirEntry::file(rest),
            };
            if entries.last() != Some(&entry) {
                entries.push(entry);
            }
        }

        if entries.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory '{dir}' not found"),
            ));
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries.dedup();
        Ok(entries)
    }

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        self.files
            .get(path.trim_start_matches('/'))
            .cloned()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("file '{path}' not found"))
            })
    }
}
