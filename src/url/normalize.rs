use crate::url::domain::same_site;
use crate::UrlError;
use url::Url;

/// Normalizes a configured site root URL
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an http or https scheme and a host
/// 3. Lowercase the host (done by the parser)
/// 4. Drop query and fragment
/// 5. Reject roots with a path; page paths are always host-absolute
/// 6. Remove the trailing slash so `site_url + page_path` is a valid URL
///
/// # Examples
///
/// ```
/// use lexicrawl::url::normalize_site_url;
///
/// let url = normalize_site_url("https://EXAMPLE.com/").unwrap();
/// assert_eq!(url, "https://example.com");
/// ```
pub fn normalize_site_url(url_str: &str) -> Result<String, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    if normalize_path(url.path()) != "/" {
        return Err(UrlError::Malformed(format!(
            "site URL must be a host root, got path {}",
            url.path()
        )));
    }

    url.set_query(None);
    url.set_fragment(None);

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Converts a discovered link into a path relative to the site root
///
/// Returns `None` when the link is malformed, uses a non-HTTP scheme, or
/// points to a different host than the site. Query strings and fragments are
/// dropped; the path is normalized so one logical page maps to one key.
///
/// # Examples
///
/// ```
/// use lexicrawl::url::site_path;
/// use url::Url;
///
/// let site = Url::parse("https://example.com").unwrap();
/// assert_eq!(site_path("https://example.com/a/../b/?x=1", &site), Some("/b".to_string()));
/// assert_eq!(site_path("https://other.com/b", &site), None);
/// ```
pub fn site_path(link: &str, site: &Url) -> Option<String> {
    let url = match Url::parse(link) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Rejecting malformed link {}: {}", link, e);
            return None;
        }
    };

    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    if !same_site(&url, site) {
        return None;
    }

    Some(normalize_path(url.path()))
}

/// Normalizes a URL path by removing dot segments and trailing slashes
pub(crate) fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            // Skip empty segments (from multiple slashes) and current directory markers
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}
