use anyhow::{Context, Result};
use bookmark_core::{Config, logging};
use bookmark_fetch::HttpFetcher;
use bookmark_server::{AppState, serve};
use bookmark_store::SqliteStore;
use clap::Parser;
use owo_colors::OwoColorize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Bookmark server - personal bookmark manager backend
#[derive(Parser, Debug)]
#[command(name = "bookmark-server")]
#[command(about = "Stores, ranks and searches bookmarks behind a small HTTP API", long_about = None)]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the config file (default: ./bookmark.toml when present)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// SQLite database file
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Directory with the built frontend
    #[arg(long, value_name = "DIR")]
    frontend: Option<PathBuf>,
}

impl Cli {
    /// Command-line flags take precedence over the file and the environment
    fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(db) = &self.db {
            config.database.path = db.clone();
        }
        if let Some(frontend) = &self.frontend {
            config.server.frontend_path = frontend.clone();
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let _guard = logging::init_logging(&config.logging).context("Failed to initialize logging")?;

    let store = SqliteStore::open(&config.database)
        .await
        .with_context(|| format!("Failed to open database {}", config.database.path.display()))?;
    let fetcher = HttpFetcher::new(&config.fetcher).context("Failed to build page fetcher")?;
    let state = Arc::new(AppState::new(Arc::new(store), Arc::new(fetcher)));

    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown requested, draining requests");
                shutdown.cancel();
            }
            Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to listen on {addr}"))?;
    tracing::info!("Server listening on port {}", config.server.port);

    serve(listener, state, &config.server.frontend_path).await.context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}
