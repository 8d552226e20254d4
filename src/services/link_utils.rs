//! Helpers for link records: URL validation and normalisation, domain
//! extraction, title fallback, timestamps and slugs.

use std::time::{SystemTime, UNIX_EPOCH};

use url::Url;

/// Schemes a link may use. Browser-internal pages are allowed so that
/// settings pages can be pinned to the board.
pub const ALLOWED_SCHEMES: &[&str] = &["http", "https", "file", "chrome", "edge", "about", "brave"];

/// Returns the current UNIX timestamp in milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Checks whether `url` is acceptable as a link target.
///
/// Accepts `scheme://…` for the allowed schemes, and bare `www.` hosts.
pub fn is_valid_url(url: &str) -> bool {
    let url = url.trim();
    if url.is_empty() {
        return false;
    }
    if url.starts_with("www.") {
        return !url.contains(char::is_whitespace);
    }
    match url.split_once("://") {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme.chars().all(|c| c.is_ascii_lowercase())
                && ALLOWED_SCHEMES.contains(&scheme)
        }
        None => false,
    }
}

/// Trims `url` and gives bare `www.` hosts an `https://` scheme.
///
/// Returns `None` when the url is not valid.
pub fn normalize_url(url: &str) -> Option<String> {
    if !is_valid_url(url) {
        return None;
    }
    let url = url.trim();
    if url.starts_with("www.") {
        Some(format!("https://{}", url))
    } else {
        Some(url.to_string())
    }
}

/// Extracts the host of `url` without a leading `www.`.
pub fn extract_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    if host.is_empty() {
        return None;
    }
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// Picks a display title: the given one if non-blank, else the domain, else the url.
pub fn resolve_title(title: &str, url: &str) -> String {
    let title = title.trim();
    if !title.is_empty() {
        return title.to_string();
    }
    extract_domain(url).unwrap_or_else(|| url.to_string())
}

/// Lowercase, dash-separated identifier derived from a category name.
///
/// `"Transport & Travel"` becomes `"transport-travel"`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}
