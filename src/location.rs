//! Recognizing the email-filter page

use url::Url;

/// True for `http(s)://host[/cpsessNNN]/frontend/<theme…>/mail/filters.html`.
pub fn is_filters_page(page_url: &str) -> bool {
    let Ok(url) = Url::parse(page_url) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.collect())
        .unwrap_or_default();
    let rest = match segments.split_first() {
        Some((first, rest)) if first.starts_with("cpsess") => rest,
        _ => &segments[..],
    };
    rest.len() >= 4
        && rest[0] == "frontend"
        && rest[rest.len() - 2] == "mail"
        && rest[rest.len() - 1] == "filters.html"
}
