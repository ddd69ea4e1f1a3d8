//! `orgmaps`: collect organizations from a map search into JSON lines.

mod control;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use orgmaps_browser::BrowserEngine;
use orgmaps_core::{AppConfig, ControlSignals, LoggingConfig};
use orgmaps_scraper::MapsScraper;
use output::JsonLinesSink;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "orgmaps",
    version,
    about = "Collect organizations from a map search",
    after_help = "While running, type pause, resume, stop or captcha and press Enter."
)]
struct Cli {
    /// Search query, e.g. "кофейня в Казани"
    #[arg(long)]
    query: String,

    /// Stop after this many organizations (0 = no limit)
    #[arg(long)]
    limit: Option<usize>,

    /// Write JSON lines to this file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,

    /// Run the browser without a window
    #[arg(long)]
    headless: bool,

    /// Path to config TOML file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also append logs to this file
    #[arg(long)]
    log: Option<PathBuf>,
}

/// Non-blocking writer appending to `path`. Dropping the guard flushes it.
fn log_file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let file_name = path
        .file_name()
        .with_context(|| format!("Log path has no file name: {}", path.display()))?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(dir)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Install the global subscriber: stderr always, plus the log file when configured.
fn init_tracing(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (file_layer, guard) = match &config.file {
        Some(path) => {
            let (writer, guard) = log_file_writer(path)?;
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // stdout may carry the records, so logs go to stderr
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(file_layer)
        .with(filter)
        .init();
    Ok(guard)
}

/// Stderr subscriber active while the configuration itself is being read.
fn bootstrap_subscriber() -> impl Subscriber + Send + Sync {
    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish()
}

/// Run [`load_config`] with `subscriber` as the default for its duration.
fn load_config_logged<S>(cli: &Cli, subscriber: S) -> Result<AppConfig>
where
    S: Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::with_default(subscriber, || load_config(cli))
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = AppConfig::load_from(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            config.apply_env_overrides();
            config
        }
        None => AppConfig::load_with_env().context("Failed to load config")?,
    };

    if cli.headless {
        config.browser.headless = true;
    }
    if let Some(limit) = cli.limit {
        config.scraper.limit = (limit > 0).then_some(limit);
    }
    if let Some(path) = &cli.log {
        config.logging.file = Some(path.clone());
    }
    config.validate()?;
    Ok(config)
}

async fn scrape(
    cli: &Cli,
    config: &AppConfig,
    engine: Arc<BrowserEngine>,
    signals: ControlSignals,
) -> Result<usize> {
    let mut sink = JsonLinesSink::open(cli.out.as_deref()).await?;
    let scraper = MapsScraper::new(engine, config.scraper.clone(), signals);
    let mut records = scraper
        .run(&cli.query)
        .await
        .context("Failed to open search results")?;

    while let Some(record) = records.next().await {
        sink.write(&record).await?;
        info!("Saved #{}: {}", sink.written(), record.name);
    }
    Ok(sink.written())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config_logged(&cli, bootstrap_subscriber())?;
    let _log_guard = init_tracing(&config.logging)?;

    info!("Starting orgmaps v{}", env!("CARGO_PKG_VERSION"));
    info!(
        query = %cli.query,
        limit = ?config.scraper.limit,
        headless = config.browser.headless,
        log_file = ?config.logging.file,
        "Scraper settings"
    );

    let signals = ControlSignals::new();
    control::spawn_ctrl_c(signals.clone());
    control::spawn_stdin_commands(signals.clone());

    let engine = Arc::new(
        BrowserEngine::launch(&config)
            .await
            .context("Failed to launch browser")?,
    );
    let result = scrape(&cli, &config, engine.clone(), signals).await;

    if let Err(e) = engine.close().await {
        warn!("Failed to close browser: {}", e);
    }

    let count = result?;
    info!("Done: {} organizations collected", count);
    eprintln!("Collected {count} organizations");
    Ok(())
}
