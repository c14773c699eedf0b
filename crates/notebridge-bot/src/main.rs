//! notebridge: files Telegram messages from the bot owner as encrypted notes.

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use notebridge_bot::config::ENV_OWNER_ID;
use notebridge_bot::{AppConfig, ChatGateway, MessageOrchestrator, TelegramClient};
use notebridge_extract::ArticleExtractor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "notebridge_bot=info,notebridge_sync=info,notebridge_extract=info".into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("notebridge.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console-only output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = Arc::new(AppConfig::from_env()?);
    if config.owner_ids.is_empty() {
        warn!(
            "{} is not set; messages from every sender will be filed",
            ENV_OWNER_ID
        );
    }
    info!(
        notes_endpoint = %config.notes_endpoint,
        reply_format = ?config.reply_format,
        "Configuration loaded"
    );

    let extractor = Arc::new(ArticleExtractor::new(config.extractor_config())?);
    let orchestrator = Arc::new(MessageOrchestrator::new(config.clone(), extractor));
    let telegram = TelegramClient::from_config(&config)?;

    let handle = ChatGateway::new(telegram, orchestrator, config).start();

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested, draining queued messages");
    if let Err(e) = handle.shutdown().await {
        warn!(error = %e, "Gateway already stopped");
    }
    handle.join().await;
    info!("Shutdown complete");

    Ok(())
}
