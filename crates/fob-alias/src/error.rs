//! Error types for config lookup, normalization and specifier rewriting.

use std::path::PathBuf;

use thiserror::Error;

use crate::runtime::RuntimeError;

pub type Result<T> = std::result::Result<T, AliasError>;

/// Errors surfaced by [`AliasResolver`](crate::AliasResolver) and
/// [`SourceRewriter`](crate::SourceRewriter).
///
/// "No alias applies" is never an error; it is `Ok(None)`.
#[derive(Debug, Clone, Error)]
pub enum AliasError {
    /// No candidate config exists and the caller asked for a hard failure.
    #[error("alias config not found (tried: {})", candidates.join(", "))]
    ConfigNotFound { candidates: Vec<String> },

    /// A config path template references an unset environment variable.
    #[error("config path template `{template}` references unset variable `{variable}`")]
    Template { template: String, variable: String },

    /// The located config could not be loaded or normalized.
    ///
    /// Cached per config path, so every request against the same file
    /// reports the same error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// A source file handed to the source rewriter failed to parse.
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Failures while loading a config file into an alias table.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("invalid JSON in {path}: {message}")]
    Json { path: PathBuf, message: String },

    #[error("failed to parse config script {path}: {message}")]
    Script { path: PathBuf, message: String },
}
