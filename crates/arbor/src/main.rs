//! Arbor server binary.
//!
//! Loads layered settings, applies CLI overrides, wires the store, model
//! client, and engine together, and serves the REST API until ctrl-c.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use arbor_engine::{ChatEngine, SummaryLimits};
use arbor_llm::{OllamaClient, TextGenerator, UsageLedger};
use arbor_server::{metrics, AppState};
use arbor_settings::loader::{load_settings, load_settings_from_path};
use arbor_store::{ConnectionPool, TreeStore};

/// Branching-conversation chat backend.
#[derive(Debug, Parser)]
#[command(name = "arbor", version, about)]
struct Cli {
    /// Settings file (defaults to ~/.arbor/settings.json when present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen port (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// SQLite database path (overrides settings).
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Ollama-compatible endpoint base URL (overrides settings).
    #[arg(long)]
    ollama_url: Option<String>,

    /// Model name (overrides settings).
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => load_settings_from_path(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => load_settings().context("loading settings")?,
    };
    if let Some(port) = cli.port {
        settings.server.port = port;
    }
    if let Some(db_path) = &cli.db_path {
        settings.store.db_path = db_path.display().to_string();
    }
    if let Some(url) = &cli.ollama_url {
        settings.llm.base_url = url.clone();
    }
    if let Some(model) = &cli.model {
        settings.llm.model = model.clone();
    }
    arbor_settings::init_settings(settings.clone());

    let recorder = metrics::install_recorder().map_err(anyhow::Error::msg)?;

    let pool = ConnectionPool::open(&settings.store.db_path)
        .with_context(|| format!("opening database at {}", settings.store.db_path))?;
    let store = Arc::new(TreeStore::new(pool));
    info!(db_path = %settings.store.db_path, "store ready");

    let ledger = Arc::new(UsageLedger::new());
    let generator: Arc<dyn TextGenerator> = Arc::new(OllamaClient::new(
        Some(&settings.llm.base_url),
        settings.llm.model.clone(),
        Arc::clone(&ledger),
    ));
    let engine = Arc::new(ChatEngine::with_limits(
        Arc::clone(&store),
        generator,
        SummaryLimits {
            summary_max_words: settings.summarizer.summary_max_words,
            name_max_words: settings.summarizer.name_max_words,
        },
    ));

    let app = arbor_server::router(AppState {
        store,
        engine,
        ledger,
        metrics: Some(recorder),
    });

    let addr = format!("{}:{}", settings.server.bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, model = %settings.llm.model, "arbor server ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for ctrl-c");
    }
}
