use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static PROFILE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://(?:www\.)?linkedin\.com/in/\S+").unwrap());

/// All profile URLs found in a text/HTML cell, deduplicated, first-match
/// order. Idempotent: the same input always yields the same set.
pub fn extract_profile_urls(cell: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for m in PROFILE_URL_RE.find_iter(cell) {
        let url = m.as_str().to_string();
        if seen.insert(url.clone()) {
            urls.push(url);
        }
    }
    urls
}

/// File id from a Google Drive share link. Handles both the `id=` query
/// form and the `/d/<id>/` path form.
pub fn drive_file_id(cell: &str) -> Option<String> {
    if !cell.contains("drive.google.com") {
        return None;
    }
    let id = if let Some((_, rest)) = cell.split_once("id=") {
        rest.split('&').next().unwrap_or("")
    } else if let Some((_, rest)) = cell.split_once("/d/") {
        rest.split('/').next().unwrap_or("")
    } else {
        return None;
    };
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_urls_in_text() {
        let cell = "see https://www.linkedin.com/in/jane-doe and http://linkedin.com/in/jdoe";
        assert_eq!(
            extract_profile_urls(cell),
            vec![
                "https://www.linkedin.com/in/jane-doe".to_string(),
                "http://linkedin.com/in/jdoe".to_string(),
            ]
        );
    }

    #[test]
    fn match_is_case_insensitive() {
        let cell = "HTTPS://WWW.LinkedIn.com/in/Jane";
        assert_eq!(extract_profile_urls(cell).len(), 1);
    }

    #[test]
    fn duplicates_collapse() {
        let url = "https://linkedin.com/in/jane";
        let cell = format!("{} {} {}", url, url, url);
        assert_eq!(extract_profile_urls(&cell), vec![url.to_string()]);
    }

    #[test]
    fn ignores_non_profile_urls() {
        let cell = "https://linkedin.com/company/acme https://example.com/in/nope";
        assert!(extract_profile_urls(cell).is_empty());
    }

    #[test]
    fn idempotent() {
        let cell = "x https://linkedin.com/in/a y https://linkedin.com/in/b";
        assert_eq!(extract_profile_urls(cell), extract_profile_urls(cell));
    }

    #[test]
    fn drive_id_query_form() {
        let cell = "https://drive.google.com/uc?export=download&id=FILE123&x=1";
        assert_eq!(drive_file_id(cell).as_deref(), Some("FILE123"));
        let cell = "https://drive.google.com/open?id=FILE123&usp=sharing";
        assert_eq!(drive_file_id(cell).as_deref(), Some("FILE123"));
    }

    #[test]
    fn drive_id_path_form() {
        let cell = "https://drive.google.com/file/d/FILE456/view?usp=sharing";
        assert_eq!(drive_file_id(cell).as_deref(), Some("FILE456"));
    }

    #[test]
    fn drive_id_absent() {
        assert_eq!(drive_file_id("https://example.com/file/d/XYZ/view"), None);
        assert_eq!(drive_file_id("plain text"), None);
        assert_eq!(drive_file_id("https://drive.google.com/about"), None);
    }
}
