//! Output normalization for command checks.

use std::borrow::Cow;

/// Remove one trailing `\n`, if present.
pub fn strip_trailing_newline(text: &str) -> &str {
    text.strip_suffix('\n').unwrap_or(text)
}

/// Strip trailing whitespace from every line. Idempotent.
pub fn rstrip_lines(text: &str) -> String {
    text.split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Normalize captured or expected output: drop one trailing newline, then
/// strip trailing whitespace per line.
pub fn normalize_output(text: &str) -> String {
    rstrip_lines(strip_trailing_newline(text))
}

/// Sort lines lexicographically.
pub fn sort_lines(text: &str) -> String {
    let mut lines: Vec<&str> = text.split('\n').collect();
    lines.sort_unstable();
    lines.join("\n")
}

/// Expected text that starts with `_` has that first underscore replaced by a
/// space. Problem files cannot carry a leading space on the first line.
pub fn restore_leading_space(text: &str) -> Cow<'_, str> {
    if text.starts_with('_') {
        Cow::Owned(text.replacen('_', " ", 1))
    } else {
        Cow::Borrowed(text)
    }
}
