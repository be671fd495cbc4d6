//! Platform runtime abstraction for alias resolution
//!
//! This module defines the `Runtime` trait that abstracts the few platform
//! operations the resolver depends on: reading config files, checking
//! whether probe candidates exist, and reading the working directory and
//! environment. Resolution logic never touches `std::fs` directly, so it can
//! be driven by an in-memory runtime in tests.

pub mod native;

// Test utilities (available in test builds)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use std::path::{Path, PathBuf};

pub use native::NativeRuntime;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),
}

/// File metadata
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// Whether this is a regular file
    pub is_file: bool,
}

/// Platform runtime trait
///
/// Every call is blocking and runs to completion. Implementations must report
/// a missing path through `is_file` returning `false` rather than by
/// panicking.
pub trait Runtime: Send + Sync + std::fmt::Debug {
    /// Read a file from the filesystem
    fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Get file metadata
    fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata>;

    /// Check if a path exists and is a regular file
    fn is_file(&self, path: &Path) -> bool {
        self.metadata(path).map(|meta| meta.is_file).unwrap_or(false)
    }

    /// Get the current working directory
    ///
    /// Fixed-mode config lookup and `process.cwd()` inside script configs
    /// both resolve against this directory.
    fn get_cwd(&self) -> RuntimeResult<PathBuf>;

    /// Look up an environment variable used by config path templates
    fn env_var(&self, name: &str) -> Option<String>;

    /// Read a file as UTF-8 text
    fn read_to_string(&self, path: &Path) -> RuntimeResult<String> {
        let bytes = self.read_file(path)?;
        String::from_utf8(bytes)
            .map_err(|e| RuntimeError::Io(format!("{} is not valid UTF-8: {}", path.display(), e)))
    }
}
