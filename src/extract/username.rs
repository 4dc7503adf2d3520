/// Marker for links that carry no extractable profile handle.
pub const INVALID_URL: &str = "Invalid URL";

/// Canonical username/handle from a profile URL: the path segment after
/// `/in/`, trailing slash stripped. Pure and total — every input maps to
/// either a handle or the invalid marker, never an error.
pub fn extract_username(url: &str) -> String {
    let lower = url.to_ascii_lowercase();
    let Some(pos) = lower.find("/in/") else {
        return INVALID_URL.to_string();
    };
    let handle = url[pos + 4..].split('/').next().unwrap_or("");
    if handle.is_empty() {
        INVALID_URL.to_string()
    } else {
        handle.to_string()
    }
}

// ── Tests ──
