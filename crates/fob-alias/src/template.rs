//! Environment placeholders in config path candidates.
//!
//! Both `${NAME}` and `<%= NAME %>` forms are substituted with the value of
//! the environment variable `NAME` as reported by the runtime.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::error::{AliasError, Result};
use crate::runtime::Runtime;

static PLACEHOLDER: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"\$\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}|<%=\s*([A-Za-z_][A-Za-z0-9_]*)\s*%>").ok()
});

/// Substitute every placeholder in `template`.
///
/// # Errors
///
/// Returns `AliasError::Template` when a placeholder names a variable the
/// runtime does not define.
pub fn render(template: &str, runtime: &dyn Runtime) -> Result<String> {
    let Some(pattern) = PLACEHOLDER.as_ref() else {
        return Ok(template.to_string());
    };

    if !pattern.is_match(template) {
        return Ok(template.to_string());
    }

    let mut missing = None;
    let rendered = pattern.replace_all(template, |caps: &Captures<'_>| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        match runtime.env_var(name) {
            Some(value) => value,
            None => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    if let Some(variable) = missing {
        return Err(AliasError::Template {
            template: template.to_string(),
            variable,
        });
    }

    Ok(rendered.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::test_utils::MemoryRuntime;

    #[test]
    fn plain_names_pass_through() {
        let runtime = MemoryRuntime::new("/proj");
        assert_eq!(render("webpack.config.js", &runtime).unwrap(), "webpack.config.js");
    }

    #[test]
    fn substitutes_both_placeholder_forms() {
        let runtime = MemoryRuntime::new("/proj")
            .with_env("CONFIG_DIR", "build")
            .with_env("TARGET", "web");

        assert_eq!(
            render("${CONFIG_DIR}/webpack.<%= TARGET %>.js", &runtime).unwrap(),
            "build/webpack.web.js"
        );
        assert_eq!(
            render("${ CONFIG_DIR }/alias.js", &runtime).unwrap(),
            "build/alias.js"
        );
    }

    #[test]
    fn unset_variable_is_an_error() {
        let runtime = MemoryRuntime::new("/proj");
        let err = render("${NOPE}/tsconfig.json", &runtime).unwrap_err();
        assert!(matches!(
            err,
            AliasError::Template { ref variable, .. } if variable == "NOPE"
        ));
    }
}
