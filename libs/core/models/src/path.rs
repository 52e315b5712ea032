// [libs/core/models/src/path.rs]

/// Validates a logical path against the restrictive character set the
/// pod HTTP handler requires (`[A-Za-z0-9._/-]+`) and rejects anything
/// that could escape the cache root: empty paths, absolute paths, and
/// any `.` or `..` path segment.
pub fn is_safe_logical_path(rel: &str) -> bool {
    if rel.is_empty() || rel.starts_with('/') {
        return false;
    }
    if !rel.chars().all(|c| {
        c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '/' | '-')
    }) {
        return false;
    }
    !rel.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..")
}
