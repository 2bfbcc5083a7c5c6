use anyhow::Context;
use clap::Parser;
use gdp_etl::fetch::HttpFetcher;
use gdp_etl::{logging, EtlConfig, Pipeline};
use std::path::PathBuf;
use tracing::error;

#[derive(Parser)]
#[command(name = "gdp_etl")]
#[command(about = "Scrape country GDP figures into a CSV file and a SQLite table")]
#[command(version)]
struct Cli {
    /// TOML file overriding the default paths, URL and query threshold
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = EtlConfig::load(cli.config.as_deref()).context("loading configuration")?;
    logging::init_logging(&config.log_path);

    let fetcher = HttpFetcher::new(&config).context("building HTTP client")?;
    match Pipeline::run(&config, &fetcher) {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("Pipeline failed: {}", e);
            Err(e).context("ETL run aborted")
        }
    }
}
