//! Review extraction from a reviews-page document.
//!
//! Review containers are located with an ordered chain of strategies. The
//! first strategy that matches anything decides the block set; the rest are
//! never consulted, so markup that happens to satisfy two strategies is not
//! double counted.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::rating::parse_rating;
use crate::types::ReviewRecord;

/// Longest body, in characters, kept in a review's display text.
pub const MAX_BODY_CHARS: usize = 500;

const ELLIPSIS: &str = "...";
const UNKNOWN_RATING_LABEL: &str = "N/A";

/// One way of finding review containers in a document.
pub struct BlockStrategy {
    pub name: &'static str,
    pub find: fn(&Html) -> Vec<ElementRef<'_>>,
}

/// Block discovery strategies, tried in order.
pub static BLOCK_STRATEGIES: &[BlockStrategy] = &[
    BlockStrategy {
        name: "data-hook",
        find: by_review_hook,
    },
    BlockStrategy {
        name: "id-prefix",
        find: by_customer_review_id,
    },
    BlockStrategy {
        name: "class-set",
        find: by_review_classes,
    },
];

static REVIEW_HOOK: LazyLock<Option<Selector>> =
    LazyLock::new(|| Selector::parse(r#"div[data-hook="review"]"#).ok());
static CUSTOMER_REVIEW_ID: LazyLock<Option<Selector>> =
    LazyLock::new(|| Selector::parse(r#"div[id^="customer_review"]"#).ok());
static REVIEW_CLASSES: LazyLock<Option<Selector>> =
    LazyLock::new(|| Selector::parse("div.a-section.review.aok-relative").ok());

static RATING_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        r#"i[data-hook="review-star-rating"]"#,
        "i.a-icon-star",
        "span.a-icon-alt",
    ]
    .iter()
    .filter_map(|css| Selector::parse(css).ok())
    .collect()
});
static BODY: LazyLock<Option<Selector>> =
    LazyLock::new(|| Selector::parse(r#"span[data-hook="review-body"]"#).ok());

fn select_all<'a>(document: &'a Html, selector: &Option<Selector>) -> Vec<ElementRef<'a>> {
    match selector {
        Some(selector) => document.select(selector).collect(),
        None => Vec::new(),
    }
}

fn by_review_hook(document: &Html) -> Vec<ElementRef<'_>> {
    select_all(document, &REVIEW_HOOK)
}

fn by_customer_review_id(document: &Html) -> Vec<ElementRef<'_>> {
    select_all(document, &CUSTOMER_REVIEW_ID)
}

fn by_review_classes(document: &Html) -> Vec<ElementRef<'_>> {
    select_all(document, &REVIEW_CLASSES)
}

/// Runs the strategy chain and returns the name of the first strategy that
/// matched together with its blocks, or `None` when nothing matched.
pub fn discover_blocks(document: &Html) -> Option<(&'static str, Vec<ElementRef<'_>>)> {
    BLOCK_STRATEGIES.iter().find_map(|strategy| {
        let blocks = (strategy.find)(document);
        if blocks.is_empty() {
            None
        } else {
            Some((strategy.name, blocks))
        }
    })
}

/// What became of a single review block.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockOutcome {
    Review(ReviewRecord),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The block has a rating but no review text.
    EmptyBody,
}

/// Reads the rating label and body out of one review block.
pub fn parse_block(block: ElementRef<'_>) -> BlockOutcome {
    let rating_label = RATING_SELECTORS
        .iter()
        .find_map(|selector| block.select(selector).next())
        .map(element_text)
        .unwrap_or_else(|| UNKNOWN_RATING_LABEL.to_string());

    let body = BODY
        .as_ref()
        .and_then(|selector| block.select(selector).next())
        .map(element_text)
        .unwrap_or_default();

    if body.is_empty() {
        return BlockOutcome::Skipped(SkipReason::EmptyBody);
    }

    BlockOutcome::Review(ReviewRecord {
        numeric_rating: parse_rating(Some(&rating_label)),
        display_text: format!("[{}] {}", rating_label, truncate_body(&body)),
    })
}

/// Extracts every usable review from a reviews-page document, in document
/// order. An empty result means no review blocks (or none with text) were
/// found.
pub fn extract_reviews(markup: &str) -> Vec<ReviewRecord> {
    let document = Html::parse_document(markup);
    let Some((strategy, blocks)) = discover_blocks(&document) else {
        tracing::debug!("No review blocks matched any strategy");
        return Vec::new();
    };
    tracing::debug!("Strategy {} matched {} review blocks", strategy, blocks.len());

    blocks
        .into_iter()
        .enumerate()
        .filter_map(|(idx, block)| match parse_block(block) {
            BlockOutcome::Review(record) => Some(record),
            BlockOutcome::Skipped(reason) => {
                tracing::trace!("Skipping review block {}: {:?}", idx, reason);
                None
            }
        })
        .collect()
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_BODY_CHARS) {
        Some((cut, _)) => format!("{}{}", &body[..cut], ELLIPSIS),
        None => body.to_string(),
    }
}
