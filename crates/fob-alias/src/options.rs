//! Per-request resolution options.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AliasError, ConfigError};

/// Conventional config file names, tried in this order when no explicit
/// config path is given (and after it when one is).
pub const DEFAULT_CONFIG_NAMES: &[&str] = &[
    "alias.config.js",
    "app.config.js",
    "tsconfig.json",
    "jsconfig.json",
    "webpack.config.js",
    "webpack.config.babel.js",
];

/// Options controlling config lookup and output formatting.
///
/// Field names follow the camelCase keys plugin hosts pass through, so an
/// options object can be deserialized as-is:
///
/// ```
/// use fob_alias::ResolveOptions;
/// use serde_json::json;
///
/// let options = ResolveOptions::from_value(json!({
///     "config": "./config/alias.config.js",
///     "findConfig": true,
/// }))
/// .unwrap();
///
/// assert!(options.find_config);
/// assert!(!options.no_output_extension);
/// assert!(options.dynamic_import);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolveOptions {
    /// Explicit config path tried before the default names. May contain
    /// `${VAR}` or `<%= VAR %>` placeholders.
    #[serde(rename = "config", alias = "configPath")]
    pub config_path: String,

    /// Search ancestor directories of the requesting file instead of
    /// resolving candidates against the working directory.
    pub find_config: bool,

    /// Never probe for or append output extensions.
    pub no_output_extension: bool,

    /// Rewrite `import('...')` expressions like `require('...')` calls.
    pub dynamic_import: bool,

    /// Treat a missing config as an error instead of "no match".
    pub require_config: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            config_path: String::new(),
            find_config: false,
            no_output_extension: false,
            dynamic_import: true,
            require_config: false,
        }
    }
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build options from a plugin-style JSON options object.
    pub fn from_value(value: Value) -> Result<Self, AliasError> {
        serde_json::from_value(value).map_err(|e| {
            AliasError::Config(ConfigError::Json {
                path: "<options>".into(),
                message: e.to_string(),
            })
        })
    }

    pub fn config_path(mut self, path: impl Into<String>) -> Self {
        self.config_path = path.into();
        self
    }

    pub fn find_config(mut self, enabled: bool) -> Self {
        self.find_config = enabled;
        self
    }

    pub fn no_output_extension(mut self, enabled: bool) -> Self {
        self.no_output_extension = enabled;
        self
    }

    pub fn dynamic_import(mut self, enabled: bool) -> Self {
        self.dynamic_import = enabled;
        self
    }

    pub fn require_config(mut self, enabled: bool) -> Self {
        self.require_config = enabled;
        self
    }

    /// Ordered config candidates: the explicit path (if any) followed by
    /// [`DEFAULT_CONFIG_NAMES`].
    pub fn config_candidates(&self) -> Vec<&str> {
        let mut candidates = Vec::with_capacity(DEFAULT_CONFIG_NAMES.len() + 1);
        if !self.config_path.is_empty() {
            candidates.push(self.config_path.as_str());
        }
        candidates.extend_from_slice(DEFAULT_CONFIG_NAMES);
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_plugin_defaults() {
        let options = ResolveOptions::default();
        assert!(options.config_path.is_empty());
        assert!(!options.find_config);
        assert!(!options.no_output_extension);
        assert!(options.dynamic_import);
        assert!(!options.require_config);
    }

    #[test]
    fn explicit_config_is_tried_first() {
        let options = ResolveOptions::new().config_path("build/aliases.js");
        let candidates = options.config_candidates();
        assert_eq!(candidates[0], "build/aliases.js");
        assert_eq!(&candidates[1..], DEFAULT_CONFIG_NAMES);
    }

    #[test]
    fn no_explicit_config_uses_defaults_only() {
        let options = ResolveOptions::new();
        assert_eq!(options.config_candidates(), DEFAULT_CONFIG_NAMES.to_vec());
    }

    #[test]
    fn accepts_config_path_alias_key() {
        let options = ResolveOptions::from_value(json!({
            "configPath": "tsconfig.base.json",
            "noOutputExtension": true,
            "dynamicImport": false
        }))
        .unwrap();

        assert_eq!(options.config_path, "tsconfig.base.json");
        assert!(options.no_output_extension);
        assert!(!options.dynamic_import);
    }

    #[test]
    fn rejects_wrongly_typed_fields() {
        let result = ResolveOptions::from_value(json!({ "findConfig": "yes" }));
        assert!(result.is_err());
    }
}
