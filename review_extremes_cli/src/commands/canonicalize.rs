use anyhow::Result;
use clap::Args;
use review_extremes_lib::canonical::{canonicalize, product_id};

use crate::output::{print_canonical, CanonicalEntry, OutputFormat};

#[derive(Args)]
pub struct CanonicalizeArgs {
    /// One or more product URLs
    #[arg(required = true)]
    pub urls: Vec<String>,
}

fn entries(urls: &[String]) -> Vec<CanonicalEntry> {
    urls.iter()
        .map(|url| CanonicalEntry {
            input: url.clone(),
            product_id: product_id(url).map(str::to_string),
            reviews_url: canonicalize(url),
        })
        .collect()
}

pub fn run(args: &CanonicalizeArgs, format: &OutputFormat) -> Result<()> {
    print_canonical(&entries(&args.urls), format)
}
