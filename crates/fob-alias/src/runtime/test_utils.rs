//! In-memory runtime for deterministic tests.
//!
//! `MemoryRuntime` holds a virtual file tree and counts how many times each
//! file was read, which makes config caching observable from tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

use super::{FileMetadata, Runtime, RuntimeError, RuntimeResult};

/// Virtual filesystem runtime.
///
/// Directories exist implicitly as ancestors of the files that were added.
///
/// ```rust,ignore
/// use fob_alias::runtime::{Runtime, test_utils::MemoryRuntime};
/// use std::path::Path;
///
/// let runtime = MemoryRuntime::new("/proj")
///     .with_file("/proj/src/index.ts", "export {}");
///
/// assert!(runtime.is_file(Path::new("/proj/src/index.ts")));
/// assert!(!runtime.is_file(Path::new("/proj/src")));
/// ```
#[derive(Debug)]
pub struct MemoryRuntime {
    cwd: PathBuf,
    files: DashMap<PathBuf, Vec<u8>>,
    env: DashMap<String, String>,
    reads: DashMap<PathBuf, AtomicUsize>,
}

impl MemoryRuntime {
    /// Create an empty runtime whose working directory is `cwd`.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            files: DashMap::default(),
            env: DashMap::default(),
            reads: DashMap::default(),
        }
    }

    /// Add a file (builder style).
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        self.add_file(path, content);
        self
    }

    /// Set an environment variable (builder style).
    pub fn with_env(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    /// Add or replace a file.
    pub fn add_file(&self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), content.into());
    }

    /// Number of `read_file` calls made for `path`.
    pub fn read_count(&self, path: impl AsRef<Path>) -> usize {
        self.reads
            .get(path.as_ref())
            .map(|count| count.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .iter()
            .any(|entry| entry.key() != path && entry.key().starts_with(path))
    }
}

impl Runtime for MemoryRuntime {
    fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        self.reads
            .entry(path.to_path_buf())
            .or_insert_with(|| AtomicUsize::new(0))
            .fetch_add(1, Ordering::SeqCst);

        self.files
            .get(path)
            .map(|content| content.value().clone())
            .ok_or_else(|| RuntimeError::FileNotFound(path.to_path_buf()))
    }

    fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata> {
        if self.files.contains_key(path) {
            return Ok(FileMetadata { is_file: true });
        }

        if self.is_dir(path) {
            return Ok(FileMetadata { is_file: false });
        }

        Err(RuntimeError::FileNotFound(path.to_path_buf()))
    }

    fn get_cwd(&self) -> RuntimeResult<PathBuf> {
        Ok(self.cwd.clone())
    }

    fn env_var(&self, name: &str) -> Option<String> {
        self.env.get(name).map(|value| value.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_reads_per_path() {
        let runtime = MemoryRuntime::new("/proj").with_file("/proj/a.json", "{}");

        runtime.read_file(Path::new("/proj/a.json")).unwrap();
        runtime.read_file(Path::new("/proj/a.json")).unwrap();
        let _ = runtime.read_file(Path::new("/proj/missing.json"));

        assert_eq!(runtime.read_count("/proj/a.json"), 2);
        assert_eq!(runtime.read_count("/proj/missing.json"), 1);
        assert_eq!(runtime.read_count("/proj/other.json"), 0);
    }

    #[test]
    fn directories_are_not_files() {
        let runtime = MemoryRuntime::new("/proj").with_file("/proj/src/a.ts", "");

        assert!(runtime.metadata(Path::new("/proj/src")).is_ok());
        assert!(!runtime.is_file(Path::new("/proj/src")));
        assert!(runtime.is_file(Path::new("/proj/src/a.ts")));
        assert!(runtime.metadata(Path::new("/proj/lib")).is_err());
    }
}
