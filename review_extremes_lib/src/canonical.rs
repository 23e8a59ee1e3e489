//! Product-page URL to "all reviews" URL normalization.

use std::sync::LazyLock;

use regex::Regex;

/// Host used when the input carries no recognizable scheme and host.
pub const DEFAULT_HOST: &str = "https://www.amazon.com";

const REVIEWS_PATH_SUFFIX: &str = "ref=cm_cr_dp_d_show_all_btm?ie=UTF8&reviewerType=all_reviews";

static PRODUCT_ID_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"/(?:dp|gp/product)/([A-Z0-9]{10})").ok());

static HOST_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"https?://[^/]+").ok());

/// Returns the 10-character product identifier following `/dp/` or
/// `/gp/product/`, if the URL has one.
pub fn product_id(url: &str) -> Option<&str> {
    let re = PRODUCT_ID_RE.as_ref()?;
    re.captures(url)?.get(1).map(|m| m.as_str())
}

/// Rewrites a product-page URL into the URL of its full review listing.
///
/// Inputs without a product identifier come back unchanged, so the caller
/// still loads whatever page it was given.
pub fn canonicalize(url: &str) -> String {
    let Some(id) = product_id(url) else {
        return url.to_string();
    };
    let host = HOST_RE
        .as_ref()
        .and_then(|re| re.find(url))
        .map(|m| m.as_str())
        .unwrap_or(DEFAULT_HOST);
    format!("{}/product-reviews/{}/{}", host, id, REVIEWS_PATH_SUFFIX)
}
