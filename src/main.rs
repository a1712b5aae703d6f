use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use discourse_mention_notifier::checkpoint::FileCheckpoint;
use discourse_mention_notifier::config::Config;
use discourse_mention_notifier::discourse::FeedClient;
use discourse_mention_notifier::keywords::KeywordFilter;
use discourse_mention_notifier::runner;
use discourse_mention_notifier::telegram::Notifier;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    info!("Starting discourse-mention-notifier");

    // Load and validate configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        discourse_url = %config.discourse_url,
        keywords = config.keywords.len(),
        post_limit = config.post_limit,
        "Configuration loaded"
    );

    // Ensure the checkpoint directory exists
    if let Some(parent) = config.checkpoint_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!(
                    "Failed to create checkpoint directory: {}",
                    parent.display()
                )
            })?;
        }
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;

    let feed = FeedClient::new(client.clone(), &config);
    let filter = KeywordFilter::new(&config.keywords);
    let notifier = Notifier::new(client, &config);
    let store = FileCheckpoint::new(&config.checkpoint_path);

    let summary = runner::run(&config, &feed, &filter, &notifier, &store).await?;

    info!(
        processed = summary.processed,
        matched = summary.matched,
        delivered = summary.delivered,
        failed = summary.failed,
        "Finished"
    );

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,discourse_mention_notifier=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        // Structured JSON logging for production
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        // Pretty-printed logging for development
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
