pub mod dates;
pub mod detail;
pub mod listing;
pub mod markup;

use url::Url;

use crate::error::ListingError;
use detail::DetailFields;
use markup::HtmlPage;

/// Listing markup → ordered, deduplicated detail URLs.
pub fn parse_listing(markup: &str, selector: &str, base: &Url) -> Result<Vec<String>, ListingError> {
    let page = HtmlPage::parse(markup);
    listing::detail_urls(&page, selector, base)
}

/// Detail markup → raw labeled fields.
pub fn parse_detail(markup: &str) -> DetailFields {
    detail::extract(&HtmlPage::parse(markup))
}
