mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "review-extremes")]
#[command(about = "Find the best and worst customer review for each product in a sheet")]
struct Cli {
    /// Output format: table, json, csv, or markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every product row of a CSV sheet and write reviews back
    Run(commands::run::RunArgs),
    /// Extract reviews for a single product URL
    Extract(commands::extract::ExtractArgs),
    /// Show the reviews URL each product URL is rewritten to
    Canonicalize(commands::canonicalize::CanonicalizeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("review_extremes=info".parse()?)
                .add_directive("review_extremes_lib=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.output);

    match &cli.command {
        Commands::Run(args) => commands::run::run(args, &format).await?,
        Commands::Extract(args) => commands::extract::run(args, &format).await?,
        Commands::Canonicalize(args) => commands::canonicalize::run(args, &format)?,
    }

    Ok(())
}
