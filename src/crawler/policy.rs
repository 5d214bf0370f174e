//! Per-link and per-page decisions made by the orchestrator

use crate::config::{CrawlSettings, RenderSettings};
use crate::url::{classify_link, LinkRelation};
use url::Url;

/// Path segments that mark a page as worth visiting sooner
const IMPORTANT_SEGMENTS: &[&str] = &["/about", "/contact", "/products", "/services"];

/// Markers of client-side rendered pages, matched in lowercase
const FRAMEWORK_SIGNATURES: &[&str] = &[
    "react",
    "vue",
    "angular",
    "next.js",
    "nuxt",
    "__next_data__",
];

/// How much of the page is scanned for framework signatures
const SIGNATURE_SCAN_BYTES: usize = 10 * 1024;

const BASE_PRIORITY: f64 = 0.5;
const IMPORTANT_PATH_BOOST: f64 = 0.2;

/// Decides whether a link found on `source_host` should be followed
///
/// Same site is always followed. A subdomain in either direction is followed
/// when `follow-subdomains` is set. Anything else needs `follow-external`.
pub fn should_follow(settings: &CrawlSettings, source_host: &str, target_host: &str) -> bool {
    match classify_link(source_host, target_host) {
        LinkRelation::SameSite => true,
        LinkRelation::Subdomain if settings.follow_subdomains => true,
        _ => settings.follow_external,
    }
}

/// Heuristic priority for a discovered URL
pub fn heuristic_priority(url: &Url) -> f64 {
    let path = url.path().to_lowercase();
    if IMPORTANT_SEGMENTS.iter().any(|segment| path.contains(segment)) {
        BASE_PRIORITY + IMPORTANT_PATH_BOOST
    } else {
        BASE_PRIORITY
    }
}

/// Final priority: the heuristic, averaged with a model score when one exists
pub fn compute_priority(url: &Url, model_score: Option<f64>) -> f64 {
    let heuristic = heuristic_priority(url);
    let priority = match model_score {
        Some(score) if score.is_finite() => (heuristic + score) / 2.0,
        _ => heuristic,
    };
    priority.clamp(0.0, 1.0)
}

/// Whether a fetched page should go through the renderer
///
/// Requires `enable-js`, then either a client framework signature near the
/// start of the page or so little text that the page is probably an empty
/// shell.
pub fn needs_render(settings: &RenderSettings, text: &str) -> bool {
    if !settings.enable_js {
        return false;
    }

    let mut end = text.len().min(SIGNATURE_SCAN_BYTES);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let head = text[..end].to_lowercase();

    FRAMEWORK_SIGNATURES.iter().any(|sig| head.contains(sig))
        || text.trim().len() < settings.min_text_length
}
