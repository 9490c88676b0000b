//! Path helpers.
//!
//! Tree keys are absolute, slash-separated, with no repeated or trailing
//! slashes except for the root itself.

use std::borrow::Cow;

/// Check whether a path is already in normal form.
fn is_normalized(path: &str) -> bool {
    if !path.starts_with('/') {
        return false;
    }
    if path.len() > 1 && path.ends_with('/') {
        return false;
    }
    !path.contains("//")
}

/// Normalize a path: ensure leading `/`, collapse `//`, strip trailing `/`
/// (except for root). Returns the input unchanged when already in normal form.
///
/// `.` and `..` are kept literally; use [`resolve_path`] to interpret them.
pub fn normalize(path: &str) -> Cow<'_, str> {
    if is_normalized(path) {
        return Cow::Borrowed(path);
    }
    let mut result = String::with_capacity(path.len() + 1);
    result.push('/');
    let mut prev_slash = true;
    for ch in path.chars() {
        if ch == '/' {
            if !prev_slash {
                result.push(ch);
            }
            prev_slash = true;
        } else {
            result.push(ch);
            prev_slash = false;
        }
    }
    if result.len() > 1 && result.ends_with('/') {
        result.pop();
    }
    Cow::Owned(result)
}

/// Return the parent of a normalized path. The root is its own parent.
pub fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &path[..i],
    }
}

/// Join a directory and a child name.
pub fn join(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Split a normalized path into its parent directory and final component.
/// The root splits into `("/", "")`.
pub fn split_parent(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(0) => ("/", &path[1..]),
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("/", path),
    }
}

/// Resolve `input` against `cwd`, interpreting `.`, `..` and absolute paths.
/// `..` at the root stays at the root.
pub fn resolve_path(cwd: &str, input: &str) -> String {
    let raw = if input.starts_with('/') {
        input.to_string()
    } else {
        join(cwd, input)
    };

    let mut parts: Vec<&str> = Vec::new();
    for component in raw.split('/') {
        match component {
            "" | "." => {},
            ".." => {
                parts.pop();
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_and_strips() {
        assert_eq!(normalize("//home//quest/"), "/home/quest");
        assert_eq!(normalize("home"), "/home");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize(""), "/");
    }

    #[test]
    fn normalize_borrows_when_clean() {
        assert!(matches!(normalize("/home/quest"), Cow::Borrowed(_)));
    }

    #[test]
    fn parent_of_paths() {
        assert_eq!(parent("/home/quest"), "/home");
        assert_eq!(parent("/home"), "/");
        assert_eq!(parent("/"), "/");
    }

    #[test]
    fn join_handles_root() {
        assert_eq!(join("/", "etc"), "/etc");
        assert_eq!(join("/home", "quest"), "/home/quest");
    }

    #[test]
    fn split_parent_of_paths() {
        assert_eq!(split_parent("/home/quest/a.txt"), ("/home/quest", "a.txt"));
        assert_eq!(split_parent("/etc"), ("/", "etc"));
        assert_eq!(split_parent("/"), ("/", ""));
    }

    #[test]
    fn resolve_relative_and_dots() {
        assert_eq!(resolve_path("/home/quest", "docs"), "/home/quest/docs");
        assert_eq!(resolve_path("/home/quest", "./docs/../a"), "/home/quest/a");
        assert_eq!(resolve_path("/home/quest", ".."), "/home");
        assert_eq!(resolve_path("/home/quest", "/etc"), "/etc");
        assert_eq!(resolve_path("/", "../.."), "/");
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn normalize_is_idempotent(path in "[/a-z0-9_.]{1,50}") {
                let once = normalize(&path).into_owned();
                let twice = normalize(&once).into_owned();
                prop_assert_eq!(&once, &twice, "normalize must be idempotent");
            }

            #[test]
            fn normalize_never_has_double_slashes(path in "[/a-z0-9_.]{1,50}") {
                let normed = normalize(&path);
                prop_assert!(
                    !normed.contains("//"),
                    "normalized path must not contain //: {normed}"
                );
            }

            #[test]
            fn normalize_starts_with_slash(path in "[a-z0-9_./]{0,50}") {
                let normed = normalize(&path);
                prop_assert!(
                    normed.starts_with('/'),
                    "normalized path must start with /: {normed}"
                );
            }

            #[test]
            fn normalize_no_trailing_slash_unless_root(path in "[/a-z0-9_.]{1,50}") {
                let normed = normalize(&path);
                if normed != "/" {
                    prop_assert!(
                        !normed.ends_with('/'),
                        "non-root normalized path must not end with /: {normed}"
                    );
                }
            }

            #[test]
            fn resolved_paths_are_normalized(
                cwd in "(/[a-z]{1,6}){0,4}",
                input in "[a-z./]{0,30}",
            ) {
                let cwd = if cwd.is_empty() { "/".to_string() } else { cwd };
                let resolved = resolve_path(&cwd, &input);
                prop_assert_eq!(normalize(&resolved).into_owned(), resolved.clone());
                prop_assert!(!resolved.split('/').any(|c| c == "." || c == ".."));
            }

            #[test]
            fn split_then_join_roundtrips(segments in proptest::collection::vec("[a-z]{1,6}", 1..5)) {
                let path = format!("/{}", segments.join("/"));
                let (dir, name) = split_parent(&path);
                prop_assert_eq!(join(dir, name), path.clone());
                prop_assert_eq!(dir, parent(&path));
            }
        }
    }
}
