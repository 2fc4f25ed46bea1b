//! Request path normalization and joining.
//!
//! Request paths are what providers receive. They use forward slashes, carry
//! no trailing slash (except a lone `/` or a bare `scheme://`), and segments
//! that already look absolute (`C:`, `/srv`, `smb://host`) replace the base
//! instead of being appended to it.

use std::sync::LazyLock;

use regex::Regex;

static DRIVE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]:").expect("drive prefix pattern is valid"));

/// Normalize a path: backslashes become slashes, trailing slashes go.
pub fn normalize(path: &str) -> String {
    let mut normalized = path.replace('\\', "/");
    while normalized.len() > 1 && normalized.ends_with('/') && !normalized.ends_with("://") {
        normalized.pop();
    }
    normalized
}

/// Whether a segment names a location on its own.
pub fn is_absolute(segment: &str) -> bool {
    let segment = segment.replace('\\', "/");
    DRIVE_PREFIX.is_match(&segment) || segment.starts_with('/') || segment.contains("://")
}

/// Join a segment onto a base request path.
///
/// Absolute segments ignore the base; a missing or empty base (the root)
/// contributes nothing, so no leading slash is injected.
pub fn join(base: Option<&str>, segment: &str) -> String {
    if is_absolute(segment) {
        return normalize(segment);
    }

    let base = base.map(normalize).unwrap_or_default();
    if base.is_empty() {
        return normalize(segment);
    }

    if base.ends_with('/') {
        normalize(&format!("{}{}", base, segment))
    } else {
        normalize(&format!("{}/{}", base, segment))
    }
}

/// Human-readable form of a request path; the root shows `root_label`.
pub fn display_path(request_path: Option<&str>, root_label: &str) -> String {
    match request_path.map(normalize) {
        Some(path) if !path.is_empty() => path,
        _ => root_label.to_string(),
    }
}
