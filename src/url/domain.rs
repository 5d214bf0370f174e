use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use deep_harvest::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Host with a leading `www.` removed, used when comparing sites
///
/// `www.example.com` and `example.com` are the same site for follow decisions.
pub fn site_key(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Extracts a host from a URL string, tolerating unparsable input
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok().as_ref().and_then(extract_domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_subdomain() {
        let url = Url::parse("https://blog.example.com/post").unwrap();
        assert_eq!(extract_domain(&url), Some("blog.example.com".to_string()));
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("http://127.0.0.1:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("127.0.0.1".to_string()));
    }

    #[test]
    fn test_site_key_strips_www() {
        assert_eq!(site_key("www.example.com"), "example.com");
        assert_eq!(site_key("example.com"), "example.com");
        assert_eq!(site_key("wwwexample.com"), "wwwexample.com");
    }

    #[test]
    fn test_host_of_invalid() {
        assert_eq!(host_of("::not-a-url"), None);
        assert_eq!(host_of("https://a.b.c/x"), Some("a.b.c".to_string()));
    }
}
