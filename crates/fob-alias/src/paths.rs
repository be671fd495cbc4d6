//! Path arithmetic shared by the locator, the script evaluator and the
//! specifier rewriter.
//!
//! All functions here are purely lexical: nothing touches the filesystem and
//! symlinks are not followed.

use std::path::{Component, Path, PathBuf};

use path_clean::PathClean;

/// Resolve `segments` right to left against `base`, like Node's
/// `path.resolve`: the last absolute segment restarts the path and the
/// result is normalized.
pub fn resolve_from<S: AsRef<str>>(base: &Path, segments: &[S]) -> PathBuf {
    let mut resolved = base.to_path_buf();
    for segment in segments {
        let segment = segment.as_ref();
        if segment.is_empty() {
            continue;
        }
        if is_absolute(segment) {
            resolved = PathBuf::from(segment);
        } else {
            resolved.push(segment);
        }
    }
    resolved.clean()
}

/// Join `segments` onto `base` and normalize, like Node's `path.join`.
/// Absolute segments are appended, not restarted.
pub fn join_all<S: AsRef<str>>(base: &str, segments: &[S]) -> PathBuf {
    let mut joined = String::from(base);
    for segment in segments {
        let segment = segment.as_ref();
        if segment.is_empty() {
            continue;
        }
        if !joined.is_empty() && !joined.ends_with('/') {
            joined.push('/');
        }
        joined.push_str(segment.trim_start_matches('/').trim_start_matches('\\'));
    }
    if joined.is_empty() {
        return PathBuf::from(".");
    }
    PathBuf::from(joined).clean()
}

/// Lexical path from directory `from` to `to`. Both inputs are normalized
/// first; equal paths give an empty path.
pub fn relative_to(from: &Path, to: &Path) -> PathBuf {
    let from = from.clean();
    let to = to.clean();

    let from_parts: Vec<Component<'_>> = from.components().filter(not_cur_dir).collect();
    let to_parts: Vec<Component<'_>> = to.components().filter(not_cur_dir).collect();

    let shared = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in shared..from_parts.len() {
        relative.push("..");
    }
    for part in &to_parts[shared..] {
        relative.push(part.as_os_str());
    }
    relative
}

fn not_cur_dir(component: &Component<'_>) -> bool {
    !matches!(component, Component::CurDir)
}

/// Whether `value` is an absolute path on any supported platform.
pub fn is_absolute(value: &str) -> bool {
    value.starts_with('/') || value.starts_with('\\') || has_drive_prefix(value)
}

/// Whether an alias destination names a module rather than a path.
///
/// Paths are `.`, `..`, anything starting with `./`, `../` (either
/// separator), `/`, or a drive letter followed by a separator.
pub fn is_module_destination(destination: &str) -> bool {
    let is_path = matches!(destination, "." | "..")
        || ["./", ".\\", "../", "..\\", "/"]
            .iter()
            .any(|prefix| destination.starts_with(prefix))
        || has_drive_prefix(destination);
    !is_path
}

fn has_drive_prefix(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'/' || bytes[2] == b'\\')
}

/// Convert path separators to the forward slashes module specifiers use.
pub fn to_slash(value: &str) -> String {
    value.replace('\\', "/")
}
