/// Checks whether `candidate` is a strict subdomain of `base`
///
/// Both hosts should already be lowercase.
///
/// # Examples
///
/// ```
/// use deep_harvest::url::is_subdomain_of;
///
/// assert!(is_subdomain_of("blog.example.com", "example.com"));
/// assert!(is_subdomain_of("api.v2.example.com", "example.com"));
/// assert!(!is_subdomain_of("example.com", "example.com"));
/// assert!(!is_subdomain_of("myexample.com", "example.com"));
/// ```
pub fn is_subdomain_of(candidate: &str, base: &str) -> bool {
    if base.is_empty() || candidate.len() <= base.len() {
        return false;
    }
    candidate.ends_with(base) && candidate[..candidate.len() - base.len()].ends_with('.')
}
