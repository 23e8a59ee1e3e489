//! A fetched storefront page and the checks that run on it before parsing.

use scraper::{Html, Selector};

/// Title fragments served on bot-challenge pages.
pub const CHALLENGE_TITLE_MARKERS: &[&str] = &["Robot Check", "CAPTCHA"];

/// A loaded page: final URL, HTTP status, document title and raw markup.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: String,
    pub status: u16,
    pub title: String,
    pub html: String,
}

impl Page {
    /// Builds a page from raw markup, reading the `<title>` element.
    pub fn from_html(url: impl Into<String>, status: u16, html: String) -> Self {
        let title = parse_title(&html);
        Self {
            url: url.into(),
            status,
            title,
            html,
        }
    }

    /// True when the title marks a human-verification page.
    pub fn is_challenge(&self) -> bool {
        CHALLENGE_TITLE_MARKERS
            .iter()
            .any(|marker| self.title.contains(marker))
    }
}

fn parse_title(html: &str) -> String {
    let Ok(selector) = Selector::parse("title") else {
        return String::new();
    };
    Html::parse_document(html)
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}
