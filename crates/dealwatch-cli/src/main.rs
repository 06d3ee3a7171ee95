mod daemon;
mod listener;
mod pipeline;
mod status;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use dealwatch_core::AppConfig;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::listener::ListenerSettings;
use crate::pipeline::{ScanPipeline, ScanTiming};

const DB_FILE_NAME: &str = "dealwatch_seen.db";

#[derive(Debug, Parser)]
#[command(name = "dealwatch-cli")]
#[command(about = "Watches Mercari for fresh listings and alerts via Telegram")]
struct Cli {
    /// Watchlist YAML file.
    #[arg(long, default_value = "config/watchlist.yaml")]
    config: PathBuf,

    /// Run a single scan cycle and exit.
    #[arg(long)]
    once: bool,

    /// Send a test message to the configured chat and exit.
    #[arg(long)]
    test_telegram: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let app = dealwatch_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(app.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let telegram = Arc::new(
        dealwatch_telegram::TelegramClient::new(
            &app.telegram_bot_token,
            &app.telegram_chat_id,
            app.request_timeout_secs,
        )
        .map_err(|e| anyhow::anyhow!("failed to build Telegram client: {e}"))?,
    );

    if cli.test_telegram {
        telegram
            .test_connection()
            .await
            .map_err(|e| anyhow::anyhow!("Telegram test failed: {e}"))?;
        println!("Telegram connection OK");
        return Ok(());
    }

    let watch = dealwatch_core::load_watchlist(&cli.config)?;
    tracing::info!(
        config = %cli.config.display(),
        brands = watch.brands.len(),
        interval_minutes = watch.scan_interval_minutes,
        ai_filter = watch.enable_ai_filter,
        "watchlist loaded"
    );

    let db_path = resolve_db_path(&app, &cli.config);
    let store = dealwatch_db::SeenStore::open(&db_path).await?;
    tracing::info!(path = %db_path.display(), tracked = store.count().await?, "dedup store ready");

    let search = dealwatch_scraper::MercariClient::new(app.request_timeout_secs)
        .map_err(|e| anyhow::anyhow!("failed to build search client: {e}"))?;
    let gate = dealwatch_vision::ClassificationGate::from_settings(
        app.hf_api_key.as_deref(),
        watch.enable_ai_filter,
        &watch.hf_model,
        app.request_timeout_secs,
    )
    .map_err(|e| anyhow::anyhow!("failed to build image classifier: {e}"))?;
    if watch.enable_ai_filter && !gate.is_enabled() {
        tracing::warn!("AI filter requested but no usable API key is set, running without it");
    }

    let brand_count = watch.brands.len();
    let interval_minutes = watch.scan_interval_minutes;
    let pipeline = ScanPipeline::new(
        search,
        gate,
        Arc::clone(&telegram),
        store,
        watch,
        ScanTiming::with_retries(app.search_max_retries),
    );

    if cli.once {
        let stats = pipeline.run_cycle(&CancellationToken::new()).await;
        println!(
            "found={} fresh={} new={} kept={} sent={}",
            stats.found, stats.fresh, stats.unseen, stats.kept, stats.sent
        );
        return Ok(());
    }

    if let Err(e) = telegram.send_startup(brand_count, interval_minutes).await {
        tracing::warn!(error = %e, "failed to send startup notification");
    }
    daemon::run(pipeline, ListenerSettings::default()).await;

    Ok(())
}

/// `DEALWATCH_DB_PATH` when set, otherwise next to the watchlist file.
fn resolve_db_path(app: &AppConfig, config_path: &Path) -> PathBuf {
    if let Some(path) = &app.db_path {
        return path.clone();
    }
    config_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(DB_FILE_NAME)
}
