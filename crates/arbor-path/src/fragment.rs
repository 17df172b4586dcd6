//! Separator normalization for fragments handed between slots

use crate::SEPARATOR;

/// Collapse runs of separators into one, keeping everything else as is
///
/// ```
/// assert_eq!(arbor_path::collapse_separators("//a///b/"), "/a/b/");
/// ```
pub fn collapse_separators(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut previous_was_separator = false;

    for c in fragment.chars() {
        let is_separator = c == SEPARATOR;
        if !(is_separator && previous_was_separator) {
            out.push(c);
        }
        previous_was_separator = is_separator;
    }

    out
}

/// Canonical root-relative form of a fragment
///
/// One leading separator, no duplicate separators, no trailing separator
/// unless the whole fragment is the root.
///
/// ```
/// assert_eq!(arbor_path::canonicalize(""), "/");
/// assert_eq!(arbor_path::canonicalize("a//b/"), "/a/b");
/// ```
pub fn canonicalize(fragment: &str) -> String {
    join([fragment])
}

/// Join fragments into one canonical absolute path
///
/// ```
/// assert_eq!(arbor_path::join(["/app/", "users", "/42"]), "/app/users/42");
/// assert_eq!(arbor_path::join(["", "/"]), "/");
/// ```
pub fn join<'a, I>(parts: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = String::new();

    for part in parts {
        for segment in part.split(SEPARATOR).filter(|s| !s.is_empty()) {
            out.push(SEPARATOR);
            out.push_str(segment);
        }
    }

    if out.is_empty() {
        out.push(SEPARATOR);
    }
    out
}
