//! citesync - paper citation maintenance tool entry point
//!
//! Reconciles the markdown catalog with the citation store, fetches
//! stale citation counts from Semantic Scholar, and patches the README
//! badges. Runs once and exits; schedule it externally (cron, CI).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use citesync::config::{self, Overrides, TomlConfig, DEFAULT_CONFIG_FILE};
use citesync::services::semantic_scholar::SemanticScholarClient;
use citesync::workflow::CitationWorkflow;

/// Command-line arguments for citesync
#[derive(Parser, Debug)]
#[command(name = "citesync")]
#[command(about = "Keeps a markdown paper catalog's citation badges in sync with Semantic Scholar")]
#[command(version)]
struct Args {
    /// Path to the markdown catalog document
    #[arg(short, long, env = "CITESYNC_README")]
    readme: Option<PathBuf>,

    /// Path to the persisted citation store
    #[arg(short, long, env = "CITESYNC_STORE")]
    store: Option<PathBuf>,

    /// Path to the TOML config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, env = "CITESYNC_CONFIG")]
    config: PathBuf,

    /// Semantic Scholar Graph API base URL
    #[arg(long, env = "CITESYNC_API_BASE_URL")]
    api_base_url: Option<String>,

    /// Hours a record stays fresh after a successful update
    #[arg(long, env = "CITESYNC_FRESHNESS_HOURS")]
    freshness_hours: Option<u64>,

    /// Delay between API requests in milliseconds (also the retry delay)
    #[arg(long, env = "CITESYNC_REQUEST_DELAY_MS")]
    request_delay_ms: Option<u64>,

    /// Search attempts per record
    #[arg(long, env = "CITESYNC_RETRY_LIMIT")]
    retry_limit: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "citesync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let file = TomlConfig::load(&args.config).context("Failed to load configuration")?;
    let config = config::resolve(
        file,
        Overrides {
            readme: args.readme,
            store: args.store,
            api_base_url: args.api_base_url,
            freshness_hours: args.freshness_hours,
            request_delay_ms: args.request_delay_ms,
            retry_limit: args.retry_limit,
        },
    )
    .context("Invalid configuration")?;

    info!(
        readme = %config.readme.display(),
        store = %config.store.display(),
        "Starting citesync"
    );

    let source = SemanticScholarClient::new(config.api_base_url.as_str())
        .context("Failed to create API client")?;
    let workflow = CitationWorkflow::new(config, Box::new(source));

    tokio::select! {
        result = workflow.run() => {
            let summary = result.context("Citation workflow failed")?;
            if !summary.document_written {
                info!("Store updated; document patch deferred to a later run");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted; store reflects the last completed update, document untouched");
        }
    }

    Ok(())
}
