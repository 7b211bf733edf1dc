use std::collections::HashSet;

use tracing::debug;
use url::Url;

use super::markup::MarkupQuery;
use crate::error::ListingError;

/// Base for resolving relative links: the listing URL without query or fragment.
pub fn base_url(listing_url: &str) -> Result<Url, ListingError> {
    let mut url = Url::parse(listing_url).map_err(|source| ListingError::BaseUrl {
        url: listing_url.to_string(),
        source,
    })?;
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Detail page URLs under `selector`, resolved against `base`, first-seen order, no duplicates.
pub fn detail_urls(
    page: &impl MarkupQuery,
    selector: &str,
    base: &Url,
) -> Result<Vec<String>, ListingError> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for href in page.hrefs(selector)? {
        let resolved = match base.join(&href) {
            Ok(u) => u,
            Err(e) => {
                debug!(href = %href, error = %e, "Skipping unresolvable link");
                continue;
            }
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            debug!(href = %href, "Skipping non-HTTP link");
            continue;
        }
        if is_same_page(&resolved, base) {
            debug!(href = %href, "Skipping in-page link");
            continue;
        }
        let resolved = resolved.to_string();
        if seen.insert(resolved.clone()) {
            urls.push(resolved);
        }
    }

    Ok(urls)
}

/// `#`, `#top` and the like point back at the listing itself.
fn is_same_page(resolved: &Url, base: &Url) -> bool {
    let mut page = resolved.clone();
    page.set_fragment(None);
    page == *base
}
