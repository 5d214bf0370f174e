//! URL handling module for Deep-Harvest
//!
//! This module provides URL normalization, host extraction, subdomain
//! matching, and classification of a link target relative to its source page.

mod domain;
mod matcher;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, host_of, site_key};
pub use matcher::is_subdomain_of;
pub use normalize::{normalize_url, resolve_and_normalize};

/// How a link target relates to the page it was found on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkRelation {
    /// Same site (hosts equal once a leading `www.` is ignored)
    SameSite,
    /// One host is a subdomain of the other
    Subdomain,
    /// Unrelated host
    External,
}

/// Classifies `target_host` against `source_host`
///
/// Hosts are compared case-insensitively; a leading `www.` is ignored, and
/// the subdomain relationship is checked in both directions so that links
/// from `blog.example.com` back to `example.com` also count.
///
/// # Examples
///
/// ```
/// use deep_harvest::url::{classify_link, LinkRelation};
///
/// assert_eq!(classify_link("example.com", "www.example.com"), LinkRelation::SameSite);
/// assert_eq!(classify_link("example.com", "docs.example.com"), LinkRelation::Subdomain);
/// assert_eq!(classify_link("example.com", "other.org"), LinkRelation::External);
/// ```
pub fn classify_link(source_host: &str, target_host: &str) -> LinkRelation {
    let source = source_host.to_lowercase();
    let target = target_host.to_lowercase();
    let source = site_key(&source);
    let target = site_key(&target);

    if source == target {
        LinkRelation::SameSite
    } else if is_subdomain_of(target, source) || is_subdomain_of(source, target) {
        LinkRelation::Subdomain
    } else {
        LinkRelation::External
    }
}
