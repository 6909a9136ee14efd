use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use fb2disqus::config::Config;
use fb2disqus::facebook::CommentsClient;
use fb2disqus::migration::{self, MigrationSettings};

#[derive(Parser, Debug)]
#[command(
    name = "fb2disqus",
    about = "Migrate Facebook comment threads to Disqus import files"
)]
struct Args {
    /// Configuration file
    #[arg(long, value_name = "FILE", default_value = "fb2disqus.toml")]
    config: PathBuf,

    /// Tab-separated page descriptor file (overrides input_file_path)
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Folder for the generated XML files (overrides output_path)
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Reply pages fetched at once (overrides max_concurrent_requests)
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    if let Some(input) = args.input {
        config.input_file_path = input;
    }
    if let Some(output) = args.output {
        config.output_path = output;
    }
    if let Some(concurrency) = args.concurrency {
        config.max_concurrent_requests = concurrency;
    }
    tracing::debug!(config = ?config, "Effective configuration");

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .user_agent(concat!("fb2disqus/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let client = CommentsClient::new(http, &config.graph_api_base_url)
        .context("Invalid Graph API base URL")?
        .with_max_concurrent_requests(config.max_concurrent_requests);

    let settings = MigrationSettings::from_config(&config);
    let code = migration::run(&settings, &client).await;

    std::process::exit(code.code());
}
