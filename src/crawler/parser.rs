//! Link discovery
//!
//! This module finds outbound URLs on a fetched page:
//! - document links (`<a href>` and canonical links) from HTML
//! - API endpoints referenced from inline script text (`fetch(...)`,
//!   `axios.get(...)`, quoted `/api/...` and `/graphql` paths)

use crate::url::resolve_and_normalize;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// Patterns whose first capture group is an endpoint path or URL
const API_PATTERNS: &[&str] = &[
    r#"fetch\(\s*["'`]([^"'`\s]+)["'`]"#,
    r#"axios\.(?:get|post|put|patch|delete|head)\(\s*["'`]([^"'`\s]+)["'`]"#,
    r#"["'`](/api/[^"'`\s]*)["'`]"#,
    r#"["'`]((?:https?://[^"'`\s/]+)?/graphql[^"'`\s]*)["'`]"#,
];

static API_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    API_PATTERNS
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(regex) => Some(regex),
            Err(e) => {
                tracing::error!("Invalid API endpoint pattern {}: {}", pattern, e);
                None
            }
        })
        .collect()
});

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// All links found on the page (absolute URLs)
    pub links: Vec<String>,
}

/// Parses HTML content and extracts links and the title
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - fragment-only links
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The URL the page was served from, for resolving relative links
///
/// # Example
///
/// ```
/// use deep_harvest::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
pub(crate) fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute, normalized http(s) URL
///
/// Returns None for special schemes, fragment-only links and anything that
/// does not resolve to http or https.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    resolve_and_normalize(base_url, href).map(String::from)
}

/// Finds API endpoints referenced from page text
///
/// Scans for `fetch("...")`, `axios.<verb>("...")` calls and quoted
/// `/api/...` or `/graphql` paths, resolved against `base_url`. Results are
/// in first-seen order without duplicates.
pub fn detect_api_endpoints(text: &str, base_url: &Url) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut endpoints = Vec::new();

    for regex in API_REGEXES.iter() {
        for captures in regex.captures_iter(text) {
            let Some(candidate) = captures.get(1) else {
                continue;
            };
            if let Some(url) = resolve_link(candidate.as_str(), base_url) {
                if seen.insert(url.clone()) {
                    endpoints.push(url);
                }
            }
        }
    }

    endpoints
}

/// All outbound candidates for a page: document links then API endpoints
///
/// Non-HTML pages only contribute API endpoints found in their text.
pub fn discover_links(text: &str, is_html: bool, base_url: &Url) -> Vec<String> {
    let mut links = if is_html {
        parse_html(text, base_url).links
    } else {
        Vec::new()
    };
    links.extend(detect_api_endpoints(text, base_url));
    links
}
