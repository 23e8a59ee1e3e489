//! `run`: process a CSV product sheet in place.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use review_extremes_lib::{
    AgentConfig, BrowserSession, CsvSheet, PacingConfig, ReviewAgent, RowOutcome,
};
use tokio::sync::watch;

use crate::output::{print_summary, OutputFormat};

#[derive(Args)]
pub struct RunArgs {
    /// CSV sheet holding PRODUCT NAME and URL columns (updated in place)
    #[arg(long)]
    pub sheet: PathBuf,

    /// TOML config file with pacing and header settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// 0-based index of the header row (default 5, i.e. sheet row 6)
    #[arg(long)]
    pub header_row: Option<usize>,

    /// Skip rows that already have a positive review written
    #[arg(long)]
    pub skip_processed: bool,

    /// Disable all pauses between and after page loads
    #[arg(long)]
    pub no_delay: bool,
}

/// Defaults, then the config file, then `REVIEW_EXTREMES_*` variables,
/// then flags.
fn resolve_config(args: &RunArgs) -> Result<AgentConfig> {
    let mut config = match &args.config {
        Some(path) => AgentConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AgentConfig::default(),
    };
    config.apply_env();

    if let Some(row) = args.header_row {
        config.header_row_index = row;
    }
    if args.skip_processed {
        config.skip_processed = true;
    }
    if args.no_delay {
        config.pacing = PacingConfig {
            request_timeout_secs: config.pacing.request_timeout_secs,
            ..PacingConfig::immediate()
        };
    }
    config.validate()?;
    tracing::debug!("Resolved config: {:?}", config);
    Ok(config)
}

/// Flips the shutdown flag on the first Ctrl-C.
fn spawn_interrupt_listener() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupt received, finishing up...");
            let _ = tx.send(true);
        }
    });
    rx
}

pub async fn run(args: &RunArgs, format: &OutputFormat) -> Result<()> {
    let config = resolve_config(args)?;
    let sheet = CsvSheet::open(&args.sheet)
        .with_context(|| format!("opening sheet {}", args.sheet.display()))?;
    tracing::info!("Opened sheet {}", sheet.path().display());
    let session = BrowserSession::launch(config.pacing.clone())?;

    let shutdown = spawn_interrupt_listener();
    let mut agent = ReviewAgent::new(sheet, session, config);

    let pb = ProgressBar::hidden();
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?,
    );
    let summary = agent
        .run_with_progress(shutdown, |progress| {
            if pb.is_hidden() {
                pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
                pb.set_length(progress.total as u64);
            }
            let status = match progress.outcome {
                RowOutcome::Reviewed(_) => "reviews written",
                RowOutcome::NoReviews => "no reviews",
                RowOutcome::FetchFailed(_) => "load failed",
            };
            pb.set_position(progress.position as u64);
            pb.set_message(format!("{} ({})", progress.product.display_name, status));
        })
        .await?;
    pb.finish_and_clear();

    if summary.interrupted {
        eprintln!("Run interrupted; rows already written were saved.");
    }
    print_summary(&summary, format)?;
    Ok(())
}
