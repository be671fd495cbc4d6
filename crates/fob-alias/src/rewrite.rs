//! Turning a matched alias rule into the output specifier.

use std::path::{Path, PathBuf};

use crate::paths;
use crate::runtime::Runtime;
use crate::table::AliasRule;

/// Everything about a request that the rewrite depends on besides the
/// specifier and the rule.
#[derive(Debug, Clone, Copy)]
pub struct RewriteContext<'a> {
    /// The file containing the import.
    pub filename: &'a Path,
    /// Directory of the config the rule came from.
    pub config_dir: &'a Path,
    /// Candidate extensions to probe, in priority order.
    pub extensions: Option<&'a [String]>,
    pub no_output_extension: bool,
}

/// Compute the replacement for `specifier`, which `rule` already matched.
///
/// Module-style destinations are substituted textually. Path-style
/// destinations become a `./`- or `../`-relative specifier from the
/// requesting file's directory, optionally with the first extension whose
/// candidate file exists appended.
pub fn rewrite_specifier(
    ctx: &RewriteContext<'_>,
    specifier: &str,
    rule: &AliasRule,
    runtime: &dyn Runtime,
) -> String {
    let rest = specifier.strip_prefix(rule.prefix.as_str()).unwrap_or("");

    if paths::is_module_destination(&rule.destination) {
        return format!("{}{}", rule.destination, rest);
    }

    let destination = absolute_destination(ctx.config_dir, &rule.destination);
    let from_dir = ctx.filename.parent().unwrap_or_else(|| Path::new(""));

    let mut relative = paths::relative_to(from_dir, &destination)
        .to_string_lossy()
        .into_owned();
    if relative.is_empty() {
        relative.push('.');
    }

    let mut rewritten = format!("{relative}{rest}");
    if rewritten == "." {
        rewritten = "./".to_string();
    }
    if !rewritten.starts_with('.') && !rewritten.starts_with('/') {
        rewritten.insert_str(0, "./");
    }

    if let Some(extensions) = ctx.extensions.filter(|_| !ctx.no_output_extension) {
        let candidate = destination.join(basename(specifier));
        if let Some(ext) = probe_extension(&candidate, extensions, runtime) {
            rewritten.push_str(ext);
        }
    }

    paths::to_slash(&rewritten)
}

fn absolute_destination(config_dir: &Path, destination: &str) -> PathBuf {
    if paths::is_absolute(destination) {
        paths::join_all(destination, &[] as &[&str])
    } else {
        paths::join_all(&config_dir.to_string_lossy(), &[destination])
    }
}

/// Final `/`-separated segment, ignoring trailing slashes.
fn basename(specifier: &str) -> &str {
    specifier
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}

fn probe_extension<'e>(
    candidate: &Path,
    extensions: &'e [String],
    runtime: &dyn Runtime,
) -> Option<&'e str> {
    let base = candidate.to_string_lossy();
    extensions
        .iter()
        .filter(|ext| !ext.is_empty())
        .find(|ext| runtime.is_file(Path::new(&format!("{base}{ext}"))))
        .map(String::as_str)
}
