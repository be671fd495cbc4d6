//! Permissive JSON loading for tsconfig/jsconfig and `.json` alias files.
//!
//! Project configs routinely contain comments and trailing commas, so they
//! are parsed as JSON5.

use std::path::Path;

use serde_json::Value;

use crate::error::ConfigError;

pub fn parse(path: &Path, source: &str) -> Result<Value, ConfigError> {
    json5::from_str::<Value>(source).map_err(|e| ConfigError::Json {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
