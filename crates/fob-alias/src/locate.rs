//! Config file lookup.
//!
//! Finds the config that governs a requesting file, either by resolving
//! candidates against the working directory (fixed mode) or by walking up
//! from the requesting file's directory (upward-search mode).

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::paths;
use crate::runtime::Runtime;
use crate::template;

/// Config lookup over a [`Runtime`].
///
/// # Example
///
/// ```
/// use fob_alias::{ConfigLocator, NativeRuntime};
/// use std::path::Path;
///
/// let runtime = NativeRuntime::new();
/// let locator = ConfigLocator::new(&runtime);
/// let found = locator
///     .locate(Path::new("src/index.js"), &["does-not-exist.config.js"], false)
///     .unwrap();
/// assert!(found.is_none());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ConfigLocator<'r> {
    runtime: &'r dyn Runtime,
}

impl<'r> ConfigLocator<'r> {
    pub fn new(runtime: &'r dyn Runtime) -> Self {
        Self { runtime }
    }

    /// Return the first candidate that exists as a regular file.
    ///
    /// Empty candidates are skipped. Each candidate is rendered with
    /// [`template::render`] before it is resolved. In upward-search mode
    /// every ancestor of `filename`'s directory is tried for one candidate
    /// before moving on to the next.
    ///
    /// # Errors
    ///
    /// Fails when a candidate references an unset environment variable or
    /// the working directory cannot be read.
    pub fn locate<S: AsRef<str>>(
        &self,
        filename: &Path,
        candidates: &[S],
        find_config: bool,
    ) -> Result<Option<PathBuf>> {
        let cwd = self.runtime.get_cwd()?;

        for candidate in candidates {
            let candidate = candidate.as_ref();
            if candidate.is_empty() {
                continue;
            }
            let rendered = template::render(candidate, self.runtime)?;

            let found = if find_config {
                let start = self.start_dir(&cwd, filename);
                self.find_up(&start, &rendered)
            } else {
                let path = paths::resolve_from(&cwd, &[rendered.as_str()]);
                self.runtime.is_file(&path).then_some(path)
            };

            if let Some(path) = found {
                tracing::debug!("Found alias config: {}", path.display());
                return Ok(Some(path));
            }
        }

        Ok(None)
    }

    fn start_dir(&self, cwd: &Path, filename: &Path) -> PathBuf {
        let file = paths::resolve_from(cwd, &[filename.to_string_lossy()]);
        file.parent().map(Path::to_path_buf).unwrap_or(file)
    }

    fn find_up(&self, start: &Path, name: &str) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| paths::resolve_from(dir, &[name]))
            .find(|path| self.runtime.is_file(path))
    }
}
