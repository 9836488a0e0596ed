use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use listing_crawler::config::{DEFAULT_BASE_URL, DEFAULT_OUTPUT_DIR};
use listing_crawler::{CrawlConfig, Crawler};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "listing-crawler", version, about = "Save every item of a paginated listing as JSON")]
struct Cli {
    /// Item condition filter added as `LH_ItemCondition` (e.g. 3, 4 or 10)
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    condition: Option<i64>,

    #[arg(long, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Stop after this many pages
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "crawl failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CrawlConfig::new(&cli.base_url, cli.condition)?
        .with_output_dir(cli.output_dir)
        .with_max_pages(cli.max_pages);

    tracing::info!(url = %config.start_url, output_dir = %config.output_dir.display(), "starting crawl");

    Crawler::new(config).run().await?;
    Ok(())
}
