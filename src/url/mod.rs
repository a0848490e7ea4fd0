//! URL handling module for Lexicrawl
//!
//! This module keeps a crawl inside its site: configured roots are
//! normalized once, and every discovered link is reduced to a site-relative
//! path or rejected.

mod domain;
mod normalize;

pub use domain::{extract_domain, same_site};
pub use normalize::{normalize_site_url, site_path};

use url::Url;

/// Splits an absolute page URL into the configured site root it belongs to
/// and its site-relative path.
///
/// `sites` holds normalized site roots. Returns `None` when the URL does not
/// parse or belongs to none of them.
pub fn locate_page<'a>(page_url: &str, sites: &'a [String]) -> Option<(&'a str, String)> {
    let url = Url::parse(page_url).ok()?;

    sites.iter().find_map(|root| {
        let root_url = Url::parse(root).ok()?;
        if !same_site(&url, &root_url) {
            return None;
        }
        site_path(url.as_str(), &root_url).map(|path| (root.as_str(), path))
    })
}
