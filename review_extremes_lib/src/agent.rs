//! Row-by-row processing of a product sheet.

use serde::Serialize;
use tokio::sync::watch;

use crate::canonical::canonicalize;
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::extract::extract_reviews;
use crate::rank::rank;
use crate::session::PageSource;
use crate::sheet::{Sheet, SheetLayout};
use crate::types::{ExtractionResult, Extremes, ProductReference, ReviewRecord};

/// What happened to one product row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Reviewed(Extremes),
    NoReviews,
    /// The page could not be loaded; written back like [`RowOutcome::NoReviews`].
    FetchFailed(String),
}

/// Totals for a finished (or interrupted) run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Data rows below the header.
    pub rows_total: usize,
    /// Rows that were skipped for a missing/invalid URL or prior results.
    pub rows_skipped: usize,
    pub rows_processed: usize,
    pub reviews_written: usize,
    pub no_reviews: usize,
    pub fetch_failures: usize,
    pub interrupted: bool,
}

/// Progress report handed to the callback of [`ReviewAgent::run_with_progress`].
#[derive(Debug)]
pub struct RowProgress<'a> {
    /// 1-based position among the rows being processed.
    pub position: usize,
    /// Rows this run will process.
    pub total: usize,
    pub product: &'a ProductReference,
    pub outcome: &'a RowOutcome,
}

/// Loads a product's reviews page and returns every usable review, in page
/// order.
pub async fn fetch_reviews<P: PageSource>(
    pages: &mut P,
    url: &str,
) -> Result<Vec<ReviewRecord>, storefront_api::Error> {
    let target = canonicalize(url);
    tracing::info!("Navigating to: {}", target);
    let page = pages.load(&target).await?;
    Ok(extract_reviews(&page.html))
}

/// Loads a product's reviews page and picks its best and worst review.
pub async fn review_url<P: PageSource>(
    pages: &mut P,
    url: &str,
) -> Result<ExtractionResult, storefront_api::Error> {
    Ok(rank(fetch_reviews(pages, url).await?))
}

/// Resolves once `shutdown` carries `true`. Never resolves if the sender
/// goes away without signalling.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Drives a run over one sheet with one page source.
pub struct ReviewAgent<S, P> {
    sheet: S,
    pages: P,
    config: AgentConfig,
}

impl<S: Sheet, P: PageSource> ReviewAgent<S, P> {
    pub fn new(sheet: S, pages: P, config: AgentConfig) -> Self {
        Self {
            sheet,
            pages,
            config,
        }
    }

    pub fn sheet(&self) -> &S {
        &self.sheet
    }

    pub fn into_sheet(self) -> S {
        self.sheet
    }

    /// Processes every product row, then releases the page source.
    ///
    /// Configuration problems (missing header row or columns) fail before
    /// any row is touched. A `true` on `shutdown` abandons the row in
    /// flight without writing it and ends the run. The page source is
    /// released on every exit path.
    pub async fn run(
        &mut self,
        shutdown: watch::Receiver<bool>,
    ) -> Result<RunSummary, AgentError> {
        self.run_with_progress(shutdown, |_| {}).await
    }

    /// Like [`ReviewAgent::run`], calling `on_row` after each processed row.
    pub async fn run_with_progress<F>(
        &mut self,
        mut shutdown: watch::Receiver<bool>,
        on_row: F,
    ) -> Result<RunSummary, AgentError>
    where
        F: FnMut(RowProgress<'_>),
    {
        let result = self.process_rows(&mut shutdown, on_row).await;
        self.pages.release();
        result
    }

    async fn process_rows<F>(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
        mut on_row: F,
    ) -> Result<RunSummary, AgentError>
    where
        F: FnMut(RowProgress<'_>),
    {
        self.config.validate()?;
        let layout = SheetLayout::prepare(&mut self.sheet, self.config.header_row_index)?;
        let values = self.sheet.all_values()?;
        let products = layout.products(&values, self.config.skip_processed);

        let rows_total = layout.data_row_count(&values);
        let mut summary = RunSummary {
            rows_total,
            rows_skipped: rows_total - products.len(),
            ..RunSummary::default()
        };
        tracing::info!(
            "Columns ready. Processing {} of {} rows",
            products.len(),
            rows_total
        );

        let total = products.len();
        for (idx, product) in products.iter().enumerate() {
            tracing::info!(
                "Processing row {}: {}",
                product.row_number,
                product.display_name
            );

            let outcome = tokio::select! {
                biased;
                _ = shutdown_requested(shutdown) => {
                    tracing::warn!("Interrupted, stopping before row {} is written", product.row_number);
                    summary.interrupted = true;
                    break;
                }
                outcome = review_product(&mut self.pages, product) => outcome,
            };

            self.write_outcome(&layout, product, &outcome)?;
            summary.rows_processed += 1;
            match &outcome {
                RowOutcome::Reviewed(_) => summary.reviews_written += 1,
                RowOutcome::NoReviews => summary.no_reviews += 1,
                RowOutcome::FetchFailed(_) => summary.fetch_failures += 1,
            }
            on_row(RowProgress {
                position: idx + 1,
                total,
                product,
                outcome: &outcome,
            });
        }

        tracing::info!(
            "Run finished: {} processed, {} with reviews, {} without",
            summary.rows_processed,
            summary.reviews_written,
            summary.no_reviews + summary.fetch_failures
        );
        Ok(summary)
    }

    fn write_outcome(
        &mut self,
        layout: &SheetLayout,
        product: &ProductReference,
        outcome: &RowOutcome,
    ) -> Result<(), AgentError> {
        let updates = match outcome {
            RowOutcome::Reviewed(extremes) => {
                tracing::info!("Updating row {}", product.row_number);
                layout.review_updates(
                    product.row_number,
                    &extremes.best.display_text,
                    &extremes.worst.display_text,
                )
            }
            RowOutcome::NoReviews | RowOutcome::FetchFailed(_) => {
                tracing::info!("No reviews extracted for row {}", product.row_number);
                layout.no_reviews_update(product.row_number)
            }
        };
        self.sheet.update_cells(&updates)
    }
}

async fn review_product<P: PageSource>(pages: &mut P, product: &ProductReference) -> RowOutcome {
    match review_url(pages, &product.source_url).await {
        Ok(result) => match result.into_extremes() {
            Some(extremes) => RowOutcome::Reviewed(extremes),
            None => {
                tracing::info!("No reviews found for {}", product.display_name);
                RowOutcome::NoReviews
            }
        },
        Err(e) => {
            tracing::warn!("Error accessing {}: {}", product.source_url, e);
            RowOutcome::FetchFailed(e.to_string())
        }
    }
}
