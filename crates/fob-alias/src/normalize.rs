//! Config shape → canonical [`AliasTable`].

use std::path::Path;

use serde_json::{Map, Value};

use crate::config::{self, BundlerTarget, ConfigShape, LoadedConfig};
use crate::error::ConfigError;
use crate::paths;
use crate::runtime::Runtime;
use crate::table::{AliasRule, AliasTable, ConfigDescriptor};

/// Load the config behind `descriptor` and build its alias table.
///
/// `Ok(None)` means the config exported nothing.
pub fn build_table(
    descriptor: &ConfigDescriptor,
    runtime: &dyn Runtime,
) -> Result<Option<AliasTable>, ConfigError> {
    match config::load(descriptor, runtime)? {
        LoadedConfig::Empty => Ok(None),
        LoadedConfig::Shape(shape) => Ok(Some(normalize(shape, &descriptor.dir))),
    }
}

/// Build the alias table for a classified config.
///
/// `config_dir` anchors relative project-reference destinations. Entries
/// that cannot be interpreted are dropped.
pub fn normalize(shape: ConfigShape, config_dir: &Path) -> AliasTable {
    match shape {
        ConfigShape::ProjectReference { paths, base_url } => {
            let rules = paths
                .map(|paths| project_reference_rules(&paths, config_dir, &base_url))
                .unwrap_or_default();
            AliasTable::new(rules, None)
        }
        ConfigShape::MultiTarget(targets) => {
            // With `preserve_order`, re-inserting a key keeps its first position.
            let mut merged = Map::new();
            let mut extensions: Vec<String> = Vec::new();

            for target in targets {
                if let Some(alias) = target.alias {
                    for (key, value) in alias {
                        merged.insert(key, value);
                    }
                }
                for ext in extension_strings(target.extensions) {
                    if !extensions.contains(&ext) {
                        extensions.push(ext);
                    }
                }
            }

            let rules = bundler_rules(merged);
            AliasTable::new(rules, Some(extensions))
        }
        ConfigShape::Single(BundlerTarget { alias, extensions }) => {
            let rules = alias.map(bundler_rules).unwrap_or_default();
            AliasTable::new(rules, Some(extension_strings(extensions)))
        }
    }
}

fn extension_strings(extensions: Option<Vec<Value>>) -> Vec<String> {
    extensions
        .unwrap_or_default()
        .into_iter()
        .filter_map(|ext| match ext {
            Value::String(s) => Some(s),
            other => {
                tracing::trace!("dropping non-string extension: {}", other);
                None
            }
        })
        .collect()
}

/// Bundler alias maps: `key$` is an exact-match key, values are strings (or
/// an array whose first string element is used).
fn bundler_rules(entries: Map<String, Value>) -> Vec<AliasRule> {
    entries
        .into_iter()
        .filter_map(|(key, value)| {
            let (prefix, exact) = match key.strip_suffix('$') {
                Some(prefix) => (prefix, true),
                None => (key.as_str(), false),
            };
            if prefix.is_empty() {
                tracing::trace!("dropping alias with empty prefix: {:?}", key);
                return None;
            }

            let Some(destination) = first_string(&value) else {
                tracing::trace!(
                    "dropping alias {:?}: destination {} is not a string",
                    key,
                    value
                );
                return None;
            };

            let rule = if exact {
                AliasRule::exact(prefix, destination)
            } else {
                AliasRule::new(prefix, destination)
            };
            Some(rule)
        })
        .collect()
}

fn first_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.first().and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// A `paths` pattern split into its literal part and whether it ended in
/// the `/*` wildcard. `None` when the literal part is empty or itself ends
/// in `/` or `*`.
fn split_pattern(pattern: &str) -> Option<(&str, bool)> {
    let (literal, wildcard) = match pattern.strip_suffix("/*") {
        Some(literal) => (literal, true),
        None => (pattern, false),
    };
    match literal.chars().last() {
        Some('/') | Some('*') | None => None,
        Some(_) => Some((literal, wildcard)),
    }
}

/// `compilerOptions.paths` entries. A rule only matches sub-paths when both
/// the key and its value end in `/*`; every other combination is exact.
///
/// Keys that produce the same rule (`"@/*": ["src"]` and `"@": ["lib"]` are
/// both an exact `@`) collapse into one, at the first key's position with
/// the last key's destination.
fn project_reference_rules(
    mappings: &Map<String, Value>,
    config_dir: &Path,
    base_url: &str,
) -> Vec<AliasRule> {
    let mut rules: Vec<AliasRule> = Vec::with_capacity(mappings.len());

    for (key, value) in mappings {
        let Some((prefix, key_wildcard)) = split_pattern(key) else {
            tracing::trace!("dropping unparseable paths key: {:?}", key);
            continue;
        };

        let target = match value {
            Value::Array(items) => match items.first() {
                Some(Value::String(s)) => s.as_str(),
                None => "",
                Some(other) => {
                    tracing::trace!(
                        "dropping paths entry {:?}: target {} is not a string",
                        key,
                        other
                    );
                    continue;
                }
            },
            Value::String(s) => s.as_str(),
            other => {
                tracing::trace!(
                    "dropping paths entry {:?}: target {} is not a string",
                    key,
                    other
                );
                continue;
            }
        };

        let (literal, value_wildcard) = split_pattern(target).unwrap_or(("", false));
        let destination = paths::resolve_from(config_dir, &[base_url, literal]);
        let destination = destination.to_string_lossy().into_owned();

        let rule = if key_wildcard && value_wildcard {
            AliasRule::new(prefix, destination)
        } else {
            AliasRule::exact(prefix, destination)
        };

        let existing = rules.iter_mut().find(|seen| {
            seen.prefix == rule.prefix && seen.exact_match_only == rule.exact_match_only
        });
        match existing {
            Some(seen) => seen.destination = rule.destination,
            None => rules.push(rule),
        }
    }

    rules
}
