mod action;
mod app;
mod app_state;
mod audio;
mod component;
mod components;
mod focus;
mod mpv;
mod theme;
mod widgets;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use podcast_core::catalog::{CatalogService, Category};
use podcast_core::config::Config;
use podcast_core::firestore::FirestoreCatalog;
use podcast_core::platform;
use podcast_core::view::CatalogView;

#[derive(Parser)]
#[command(name = "p0dcast")]
#[command(about = "Terminal browser and player for the p0dcast catalog", long_about = None)]
struct Cli {
    /// Category to open (podcasts, two-objects, funny)
    #[arg(short = 'c', long)]
    category: Option<Category>,

    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("tui.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress noisy
    // connection-level DEBUG from HTTP client internals (hyper_util, reqwest).
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("p0dcast log: {}", log_path.display());
    tracing::info!("p0dcast starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            tracing::warn!("config unreadable, using defaults: {}", e);
            Config::default()
        }),
    };
    let category = cli.category.unwrap_or(config.ui.default_category);

    // ── Catalog + audio backend ──────────────────────────────────────────────
    let catalog: Arc<dyn CatalogService> = Arc::new(FirestoreCatalog::new(&config.catalog)?);
    let (audio, audio_rx) = audio::spawn_backend(config.mpv.volume);

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let view = CatalogView::new(category, audio);
    let state = app_state::AppState::new(view, config.player.skip_seconds);
    app::App::new(state, catalog).run(audio_rx).await?;

    tracing::info!("p0dcast exiting");
    Ok(())
}
