//! API version selection.

/// Pick the latest version from a set of version strings.
///
/// Versions are compared as plain strings: the list is sorted ascending
/// and the last entry wins. Callers must supply versions that sort
/// lexicographically in release order (zero padded, or date based such as
/// `2015-06-15`). `["1.0", "2.0", "10.0"]` yields `"2.0"`.
///
/// Returns `None` for an empty set.
pub fn latest_version<S: AsRef<str>>(versions: &[S]) -> Option<String> {
    let mut sorted: Vec<&str> = versions.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();
    sorted.last().map(|v| v.to_string())
}
