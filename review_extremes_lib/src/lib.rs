//! Library layer for review-extremes: finds the best and worst customer
//! review for each product URL in a sheet and writes them back.
//!
//! Wraps the `storefront_api` page client with a paced page session, review
//! extraction and ranking, and the sheet read/write contract.

pub mod agent;
pub mod canonical;
pub mod config;
pub mod error;
pub mod extract;
pub mod rank;
pub mod rating;
pub mod session;
pub mod sheet;
pub mod types;

pub use storefront_api;

pub use agent::{fetch_reviews, review_url, ReviewAgent, RowOutcome, RowProgress, RunSummary};
pub use canonical::canonicalize;
pub use config::{AgentConfig, PacingConfig};
pub use error::{AgentError, ConfigError};
pub use extract::extract_reviews;
pub use rank::rank;
pub use rating::parse_rating;
pub use session::{BrowserSession, PageSource};
pub use sheet::{CellUpdate, CsvSheet, MemorySheet, Sheet, SheetLayout};
pub use types::{ExtractionResult, Extremes, ProductReference, ReviewRecord};
