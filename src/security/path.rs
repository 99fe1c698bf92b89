//! Lexical path containment.

use crate::{Error, Result};
use std::path::{Component, Path, PathBuf};

const MAX_SEGMENT_LEN: usize = 255;

/// Checks that `name` can be used as a single directory name.
///
/// Allows ASCII-alphanumeric characters, `-`, `_` and `.`, rejecting the
/// empty string and names made only of dots.
#[must_use]
pub fn is_safe_segment(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_SEGMENT_LEN
        && !name.chars().all(|c| c == '.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// Joins a caller-supplied relative path under `root`.
///
/// The check is purely lexical and does no I/O: absolute paths, drive
/// prefixes and `..` segments that climb above `root` are rejected; `.`
/// segments are dropped and inner `..` segments are folded.
///
/// # Errors
///
/// Returns [`Error::PathViolation`] when the path would leave `root`.
pub fn resolve_within_root(root: &Path, user_path: &str) -> Result<PathBuf> {
    let violation = |reason: &str| Error::PathViolation {
        path: user_path.to_string(),
        reason: reason.to_string(),
    };

    if user_path.trim().is_empty() {
        return Err(violation("path is empty"));
    }

    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
    for component in Path::new(user_path).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {},
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(violation("path escapes the storage root"));
                }
            },
            Component::RootDir | Component::Prefix(_) => {
                return Err(violation("absolute paths are not allowed"));
            },
        }
    }
    if parts.is_empty() {
        return Err(violation("path names the storage root itself"));
    }

    let mut resolved = root.to_path_buf();
    resolved.extend(parts);
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("snapshots/a.json", "snapshots/a.json"; "nested")]
    #[test_case("./a.json", "a.json"; "current dir")]
    #[test_case("x/../a.json", "a.json"; "folded parent")]
    fn test_resolves_inside_root(input: &str, expected: &str) {
        let root = Path::new("/data/ws");
        assert_eq!(resolve_within_root(root, input).unwrap(), root.join(expected));
    }

    #[test_case("/etc/passwd"; "absolute")]
    #[test_case("../outside.json"; "parent")]
    #[test_case("a/../../outside.json"; "climbs after descending")]
    #[test_case(""; "empty")]
    #[test_case("."; "root itself")]
    fn test_rejects_escapes(input: &str) {
        let err = resolve_within_root(Path::new("/data/ws"), input).unwrap_err();
        assert!(matches!(err, Error::PathViolation { .. }));
    }

    #[test_case("default", true; "plain")]
    #[test_case("team-a_1.v2", true; "punctuation")]
    #[test_case("", false; "empty")]
    #[test_case("..", false; "dots only")]
    #[test_case("a/b", false; "slash")]
    #[test_case("a\\b", false; "backslash")]
    fn test_safe_segment(name: &str, expected: bool) {
        assert_eq!(is_safe_segment(name), expected);
    }
}
