use crate::{Error, Result};
use url::Url;

/// Path fragment identifying a geocache listing page
pub const LISTING_PAGE_FRAGMENT: &str = "geocaching.com/geocache";

/// Path fragment identifying a project-gc challenge checker page
pub const CHECKER_PAGE_FRAGMENT: &str = "project-gc.com/challenges";

/// Page opened when no start URL is given
pub const DEFAULT_START_URL: &str = "https://www.geocaching.com/";

pub fn is_listing_page(url: &str) -> bool {
    url.to_lowercase().contains(LISTING_PAGE_FRAGMENT)
}

pub fn is_checker_page(url: &str) -> bool {
    url.to_lowercase().contains(CHECKER_PAGE_FRAGMENT)
}

/// Turn user input into a URL, adding `https://` when no http(s) scheme is
/// given.
pub fn normalize(input: &str) -> Result<Url> {
    let input = input.trim();
    let candidate = if input.to_lowercase().starts_with("http") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };

    Url::parse(&candidate).map_err(|_| Error::InvalidUrl(candidate))
}
