// URL canonicalization shared by the crawler and the probe engine

use crate::error::{Result, ScanError};
use url::{Position, Url};

/// Normalize the scan target: ensure a scheme, drop query and fragment, and
/// drop the path when it is only `/`.
///
/// `example.com/?a=1#top` becomes `http://example.com`.
pub fn normalize_base(target: &str) -> Result<String> {
    let target = target.trim();
    let lowered = target.to_ascii_lowercase();
    let with_scheme = if lowered.starts_with("http://") || lowered.starts_with("https://") {
        target.to_string()
    } else {
        format!("http://{}", target)
    };

    let parsed = Url::parse(&with_scheme)
        .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", target, e)))?;

    if parsed.host_str().is_none() {
        return Err(ScanError::InvalidUrl(format!("{}: missing host", target)));
    }

    let origin = &parsed[..Position::BeforePath];
    let path = parsed.path();
    if path == "/" || path.is_empty() {
        Ok(origin.to_string())
    } else {
        Ok(format!("{}{}", origin, path))
    }
}

/// Canonical form used as the page key during the crawl. Fragments are
/// removed; the query string is kept because it selects a different page.
pub fn canonicalize(url: &str) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    parsed.set_fragment(None);
    Some(parsed.to_string())
}

/// Remove the fragment from `url`. Unparsable input is cut at the first `#`.
pub fn strip_fragment(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.split('#').next().unwrap_or(url).to_string(),
    }
}

/// True when both URLs share scheme, host and port. `http` and `https` are
/// different origins.
pub fn same_origin(base: &str, url: &str) -> bool {
    match (Url::parse(base), Url::parse(url)) {
        (Ok(a), Ok(b)) => {
            a.scheme() == b.scheme() && a.host_str() == b.host_str() && a.port() == b.port()
        }
        _ => false,
    }
}

/// `scheme://host[:port]` of the given URL.
pub fn origin_root(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.host_str()?;
    Some(parsed[..Position::BeforePath].to_string())
}

/// Resolve an href found on `page_url` into an absolute, fragment-free URL.
pub fn resolve_link(page_url: &str, href: &str) -> Option<String> {
    let href = href.trim();
    // Skip empty, javascript:, mailto:, tel:, etc.
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let base = Url::parse(page_url).ok()?;
    let mut resolved = base.join(href).ok()?;
    resolved.set_fragment(None);

    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// Path component used for robots matching; `/` when the URL cannot be parsed.
pub fn url_path(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| "/".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_adds_scheme() {
        assert_eq!(normalize_base("example.com").unwrap(), "http://example.com");
    }

    #[test]
    fn test_normalize_base_drops_root_path_query_and_fragment() {
        assert_eq!(
            normalize_base("https://Example.COM/?a=1#top").unwrap(),
            "https://example.com"
        );
        assert_eq!(
            normalize_base("http://example.com:8080/app/?x=y").unwrap(),
            "http://example.com:8080/app/"
        );
    }

    #[test]
    fn test_normalize_base_rejects_garbage() {
        assert!(normalize_base("http://").is_err());
        assert!(normalize_base("not a host at all").is_err());
    }

    #[test]
    fn test_normalize_base_is_idempotent() {
        for input in [
            "example.com",
            "https://example.com/",
            "http://example.com:8080/a/b?q=1#f",
            "HTTP://EXAMPLE.com/path",
        ] {
            let once = normalize_base(input).unwrap();
            assert_eq!(normalize_base(&once).unwrap(), once, "input: {}", input);
        }
    }

    #[test]
    fn test_canonicalize_keeps_query_strips_fragment() {
        assert_eq!(
            canonicalize("http://example.com/a?id=1#frag").unwrap(),
            "http://example.com/a?id=1"
        );
        assert_eq!(canonicalize("http://Example.com").unwrap(), "http://example.com/");
        assert!(canonicalize("::nope::").is_none());
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        for input in [
            "http://example.com",
            "http://example.com/a/../b?x=1&y=2#z",
            "https://EXAMPLE.com:443/p",
        ] {
            let once = canonicalize(input).unwrap();
            assert_eq!(canonicalize(&once).unwrap(), once);
        }
    }

    #[test]
    fn test_strip_fragment() {
        assert_eq!(strip_fragment("http://example.com/p#x"), "http://example.com/p");
        assert_eq!(strip_fragment("relative#x"), "relative");
    }

    #[test]
    fn test_same_origin_scheme_matters() {
        assert!(same_origin("http://example.com", "http://example.com/a"));
        assert!(!same_origin("http://example.com", "https://example.com/a"));
        assert!(!same_origin("http://example.com", "http://example.com:8080/"));
        assert!(!same_origin("http://example.com", "http://sub.example.com/"));
        assert!(!same_origin("http://example.com", "garbage"));
    }

    #[test]
    fn test_same_origin_is_symmetric() {
        let urls = [
            "http://example.com",
            "https://example.com/x",
            "http://example.com:8080/",
            "http://other.test/",
            "not a url",
        ];
        for a in urls {
            for b in urls {
                assert_eq!(same_origin(a, b), same_origin(b, a), "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn test_origin_root() {
        assert_eq!(
            origin_root("https://example.com:8443/a/b?c=d").unwrap(),
            "https://example.com:8443"
        );
        assert!(origin_root("mailto:someone@example.com").is_none());
    }

    #[test]
    fn test_resolve_link() {
        let page = "http://example.com/dir/page";
        assert_eq!(
            resolve_link(page, "/a?id=1#top").unwrap(),
            "http://example.com/a?id=1"
        );
        assert_eq!(resolve_link(page, "other").unwrap(), "http://example.com/dir/other");
        assert!(resolve_link(page, "#section").is_none());
        assert!(resolve_link(page, "javascript:void(0)").is_none());
        assert!(resolve_link(page, "mailto:x@example.com").is_none());
        assert!(resolve_link(page, "ftp://example.com/file").is_none());
    }
}
