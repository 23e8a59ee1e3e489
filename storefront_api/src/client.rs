//! HTTP client for storefront review pages.

use std::time::Duration;

use url::Url;

use crate::{page::Page, user_agent::get_user_agent, Error};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for loading storefront pages.
///
/// Sends requests with browser-like headers and a user agent picked once at
/// construction, so every page of a run looks like the same visitor. Cookies
/// set by the storefront are kept for the lifetime of the client.
pub struct Client {
    http: reqwest::Client,
    user_agent: &'static str,
}

impl Client {
    /// Creates a client with the default 30-second timeout.
    pub fn new() -> Result<Self, Error> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, Error> {
        let user_agent = get_user_agent();
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        Ok(Self { http, user_agent })
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent
    }

    /// Loads `url` and returns its markup.
    ///
    /// Non-success statuses are returned as [`Error::HttpStatus`] carrying a
    /// truncated copy of the body. Challenge pages are served with a 200 and
    /// come back as a normal [`Page`]; callers check [`Page::is_challenge`].
    pub async fn fetch_page(&self, url: &str) -> Result<Page, Error> {
        let url = Url::parse(url).map_err(|e| {
            tracing::error!("Invalid URL {}: {}", url, e);
            Error::InvalidUrl(url.to_string())
        })?;

        let resp = self
            .http
            .get(url.clone())
            .header(
                "accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("accept-language", "en-US,en;q=0.9")
            .header("upgrade-insecure-requests", "1")
            .header("sec-fetch-dest", "document")
            .header("sec-fetch-mode", "navigate")
            .header("sec-fetch-site", "none")
            .header("cache-control", "no-cache")
            .header("pragma", "no-cache")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to load page: {}", e);
                Error::RequestFailed
            })?;

        let status = resp.status();
        let final_url = resp.url().to_string();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read page body: {}", e);
            Error::RequestFailed
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Page load failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        Ok(Page::from_html(final_url, status.as_u16(), body))
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
