//! Canonical alias table shared by every config shape.

use std::path::{Path, PathBuf};

use path_clean::PathClean;

/// Which family of config file a descriptor points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    /// `tsconfig.json` / `jsconfig.json` with `compilerOptions.paths`.
    ProjectReference,
    /// Bundler or app config exposing `alias` / `resolve.alias`.
    Bundler,
}

/// A located config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDescriptor {
    pub path: PathBuf,
    /// Base directory for relative alias destinations.
    pub dir: PathBuf,
    pub kind: ConfigKind,
}

impl ConfigDescriptor {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().clean();
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let kind = if is_project_reference(&path) {
            ConfigKind::ProjectReference
        } else {
            ConfigKind::Bundler
        };

        Self { path, dir, kind }
    }

    pub fn is_project_reference(&self) -> bool {
        self.kind == ConfigKind::ProjectReference
    }
}

/// `tsconfig.json`, `jsconfig.json`, or any name ending in either.
fn is_project_reference(path: &Path) -> bool {
    path.to_str()
        .map(|p| p.ends_with("tsconfig.json") || p.ends_with("jsconfig.json"))
        .unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasRule {
    /// Never empty.
    pub prefix: String,
    /// Bare module name or filesystem path (possibly relative to the
    /// config directory).
    pub destination: String,
    /// Match only `specifier == prefix`, never a sub-path.
    pub exact_match_only: bool,
}

impl AliasRule {
    pub fn new(prefix: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            destination: destination.into(),
            exact_match_only: false,
        }
    }

    pub fn exact(prefix: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            exact_match_only: true,
            ..Self::new(prefix, destination)
        }
    }

    /// Boundary-aware prefix test.
    pub fn matches(&self, specifier: &str) -> bool {
        if self.exact_match_only {
            return specifier == self.prefix;
        }
        match specifier.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// Ordered alias rules plus optional probing extensions.
///
/// Rule order is the declaration order of the source config and decides
/// precedence: the first matching rule wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    rules: Vec<AliasRule>,
    extensions: Option<Vec<String>>,
}

impl AliasTable {
    /// Build a table. An empty extension list means "no probing".
    pub fn new(rules: Vec<AliasRule>, extensions: Option<Vec<String>>) -> Self {
        let extensions = extensions.filter(|exts| !exts.is_empty());
        Self { rules, extensions }
    }

    pub fn rules(&self) -> &[AliasRule] {
        &self.rules
    }

    pub fn extensions(&self) -> Option<&[String]> {
        self.extensions.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
