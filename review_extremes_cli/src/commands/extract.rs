//! `extract`: run the review pipeline for one product URL.

use std::future::Future;

use anyhow::Result;
use clap::Args;
use review_extremes_lib::rank::sort_by_rating;
use review_extremes_lib::storefront_api::Error as FetchError;
use review_extremes_lib::{
    fetch_reviews, rank, AgentConfig, BrowserSession, PageSource, ReviewRecord,
};

use crate::output::{print_extremes, print_ranked, OutputFormat};

#[derive(Args)]
pub struct ExtractArgs {
    /// Product page URL (any URL works; product URLs are rewritten to the reviews page)
    pub url: String,

    /// Print every extracted review, best first, instead of just the extremes
    #[arg(long)]
    pub all: bool,
}

/// Fetches the reviews unless `interrupt` resolves first. The page source is
/// released either way; `None` means the load was abandoned.
async fn fetch_until<P, I>(
    pages: &mut P,
    url: &str,
    interrupt: I,
) -> Option<Result<Vec<ReviewRecord>, FetchError>>
where
    P: PageSource,
    I: Future<Output = ()>,
{
    let fetched = tokio::select! {
        biased;
        _ = interrupt => None,
        fetched = fetch_reviews(pages, url) => Some(fetched),
    };
    pages.release();
    fetched
}

pub async fn run(args: &ExtractArgs, format: &OutputFormat) -> Result<()> {
    let mut config = AgentConfig::default();
    config.apply_env();
    config.validate()?;

    let mut session = BrowserSession::launch(config.pacing)?;
    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let Some(fetched) = fetch_until(&mut session, &args.url, interrupt).await else {
        eprintln!("Interrupted, nothing extracted.");
        return Ok(());
    };
    let records = fetched?;

    if args.all {
        print_ranked(&sort_by_rating(records), format)
    } else {
        print_extremes(&rank(records), format)
    }
}
