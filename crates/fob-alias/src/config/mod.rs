//! Config file loading.
//!
//! A located config is read through the runtime, turned into a JSON value
//! (JSON5 for project configs, static evaluation for scripts) and then
//! classified into one of the shapes the normalizer understands. The shape is
//! decided here, once, so everything downstream is shape-agnostic.

pub mod json;
pub mod script;

use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::runtime::Runtime;
use crate::table::{ConfigDescriptor, ConfigKind};

pub(crate) use script::is_truthy;

/// Result of loading a config file.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedConfig {
    /// The file exported nothing (no keys / no targets). This is usually a
    /// stray config of the same name belonging to a dependency.
    Empty,
    Shape(ConfigShape),
}

/// The alias-bearing shapes a config can take.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigShape {
    /// `compilerOptions.paths` + `compilerOptions.baseUrl`.
    ProjectReference {
        paths: Option<Map<String, Value>>,
        base_url: String,
    },
    /// An array of independent build targets.
    MultiTarget(Vec<BundlerTarget>),
    /// A single bundler config object.
    Single(BundlerTarget),
}

/// Alias data read from one bundler config object, either from its own
/// `alias`/`extensions` fields or from `resolve.alias`/`resolve.extensions`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BundlerTarget {
    pub alias: Option<Map<String, Value>>,
    pub extensions: Option<Vec<Value>>,
}

impl BundlerTarget {
    fn from_value(value: &Value) -> Self {
        let alias = pick_field(value, "alias").and_then(|alias| match alias {
            Value::Object(map) => Some(map.clone()),
            other => {
                tracing::trace!("ignoring non-object alias field: {}", other);
                None
            }
        });

        let extensions = pick_field(value, "extensions").and_then(|exts| match exts {
            Value::Array(items) => Some(items.clone()),
            other => {
                tracing::trace!("ignoring non-array extensions field: {}", other);
                None
            }
        });

        Self { alias, extensions }
    }
}

/// `value[field] || value.resolve[field]`, with JavaScript truthiness.
fn pick_field<'v>(value: &'v Value, field: &str) -> Option<&'v Value> {
    if let Some(direct) = value.get(field).filter(|v| is_truthy(v)) {
        return Some(direct);
    }
    value
        .get("resolve")
        .filter(|resolve| is_truthy(resolve))
        .and_then(|resolve| resolve.get(field))
        .filter(|v| is_truthy(v))
}

/// Read and classify the config behind `descriptor`.
///
/// Only read failures and syntax errors are errors. A file that parses but
/// carries no usable alias data loads as [`LoadedConfig::Empty`].
pub fn load(
    descriptor: &ConfigDescriptor,
    runtime: &dyn Runtime,
) -> Result<LoadedConfig, ConfigError> {
    let path = descriptor.path.as_path();
    tracing::debug!("Loading alias config from: {}", path.display());

    let source = runtime.read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let is_json = descriptor.is_project_reference()
        || path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                ext.eq_ignore_ascii_case("json") || ext.eq_ignore_ascii_case("json5")
            });

    let value = if is_json {
        json::parse(path, &source)?
    } else {
        script::evaluate(path, &source, runtime)?
    };

    Ok(classify(descriptor, value))
}

/// Decide which shape `value` has.
///
/// A value with no alias-bearing shape (a primitive, `null`, or an array
/// where a project config is expected) is reported as [`LoadedConfig::Empty`].
pub fn classify(descriptor: &ConfigDescriptor, value: Value) -> LoadedConfig {
    let value = unwrap_default_export(value);

    let shape = match (descriptor.kind, value) {
        (_, Value::Object(map)) if map.is_empty() => return LoadedConfig::Empty,
        (_, Value::Array(items)) if items.is_empty() => return LoadedConfig::Empty,
        (ConfigKind::ProjectReference, Value::Object(config)) => {
            let compiler = config.get("compilerOptions");
            let paths = compiler
                .and_then(|c| c.get("paths"))
                .and_then(Value::as_object)
                .cloned();
            let base_url = compiler
                .and_then(|c| c.get("baseUrl"))
                .and_then(Value::as_str)
                .filter(|base| !base.is_empty())
                .unwrap_or(".")
                .to_string();
            ConfigShape::ProjectReference { paths, base_url }
        }
        (ConfigKind::Bundler, Value::Array(targets)) => {
            ConfigShape::MultiTarget(targets.iter().map(BundlerTarget::from_value).collect())
        }
        (ConfigKind::Bundler, value @ Value::Object(_)) => {
            ConfigShape::Single(BundlerTarget::from_value(&value))
        }
        (_, other) => {
            tracing::debug!(
                "{} exports {}, which holds no alias data",
                descriptor.path.display(),
                type_name(&other)
            );
            return LoadedConfig::Empty;
        }
    };

    LoadedConfig::Shape(shape)
}

/// Unwrap `{ __esModule: true, default: config }`.
fn unwrap_default_export(value: Value) -> Value {
    let is_wrapper = value.get("__esModule").is_some_and(is_truthy)
        && value.get("default").is_some_and(is_truthy);
    if !is_wrapper {
        return value;
    }
    match value {
        Value::Object(mut map) => map.remove("default").unwrap_or(Value::Null),
        other => other,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bundler() -> ConfigDescriptor {
        ConfigDescriptor::new("/proj/webpack.config.js")
    }

    fn tsconfig() -> ConfigDescriptor {
        ConfigDescriptor::new("/proj/tsconfig.json")
    }

    #[test]
    fn empty_values_are_empty_configs() {
        assert_eq!(classify(&bundler(), json!({})), LoadedConfig::Empty);
        assert_eq!(classify(&bundler(), json!([])), LoadedConfig::Empty);
        assert_eq!(classify(&tsconfig(), json!({})), LoadedConfig::Empty);
    }

    #[test]
    fn primitives_carry_no_alias_data() {
        for value in [json!(null), json!("config"), json!(42), json!(true)] {
            assert_eq!(classify(&bundler(), value.clone()), LoadedConfig::Empty);
            assert_eq!(classify(&tsconfig(), value), LoadedConfig::Empty);
        }
    }

    #[test]
    fn interop_default_primitive_is_empty() {
        let value = json!({ "__esModule": true, "default": 42 });
        assert_eq!(classify(&bundler(), value), LoadedConfig::Empty);
    }

    #[test]
    fn unwraps_interop_default() {
        let loaded = classify(
            &bundler(),
            json!({ "__esModule": true, "default": { "alias": { "@": "./src" } } }),
        );

        let LoadedConfig::Shape(ConfigShape::Single(target)) = loaded else {
            panic!("expected single target");
        };
        assert_eq!(target.alias.unwrap()["@"], json!("./src"));
    }

    #[test]
    fn interop_marker_without_default_is_kept_as_is() {
        let loaded = classify(&bundler(), json!({ "__esModule": true, "alias": { "a": "b" } }));
        let LoadedConfig::Shape(ConfigShape::Single(target)) = loaded else {
            panic!("expected single target");
        };
        assert!(target.alias.is_some());
    }

    #[test]
    fn reads_nested_resolve_fields() {
        let loaded = classify(
            &bundler(),
            json!({ "resolve": { "alias": { "x": "y" }, "extensions": [".ts"] } }),
        );

        let LoadedConfig::Shape(ConfigShape::Single(target)) = loaded else {
            panic!("expected single target");
        };
        assert_eq!(target.alias.unwrap()["x"], json!("y"));
        assert_eq!(target.extensions.unwrap(), vec![json!(".ts")]);
    }

    #[test]
    fn direct_fields_take_precedence_over_resolve() {
        let target = BundlerTarget::from_value(&json!({
            "alias": { "direct": "./d" },
            "resolve": { "alias": { "nested": "./n" } }
        }));
        let alias = target.alias.unwrap();
        assert!(alias.contains_key("direct"));
        assert!(!alias.contains_key("nested"));
    }

    #[test]
    fn arrays_become_multi_target() {
        let loaded = classify(&bundler(), json!([{ "alias": { "a": "./a" } }, "bogus"]));
        let LoadedConfig::Shape(ConfigShape::MultiTarget(targets)) = loaded else {
            panic!("expected multi target");
        };
        assert_eq!(targets.len(), 2);
        assert!(targets[1].alias.is_none());
    }

    #[test]
    fn project_reference_defaults_base_url() {
        let loaded = classify(
            &tsconfig(),
            json!({ "compilerOptions": { "paths": { "@/*": ["src/*"] } } }),
        );

        let LoadedConfig::Shape(ConfigShape::ProjectReference { paths, base_url }) = loaded else {
            panic!("expected project reference");
        };
        assert_eq!(base_url, ".");
        assert!(paths.unwrap().contains_key("@/*"));
    }

    #[test]
    fn project_reference_array_is_empty() {
        let value = json!([{ "compilerOptions": { "paths": { "@/*": ["src/*"] } } }]);
        assert_eq!(classify(&tsconfig(), value), LoadedConfig::Empty);
    }
}
