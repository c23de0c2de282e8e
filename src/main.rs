use anyhow::Context;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use speakingdoc::extraction::{DocumentFormat, ExtractedDocument};
use speakingdoc::{config::Config, create_router, AppState};

#[derive(Parser)]
#[command(name = "speakingdoc", version, about = "Chat with any document")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server (default)
    Serve,
    /// Extract the text of a local document and print it
    Extract {
        path: PathBuf,
        /// Document format; defaults to the file-name suffix
        #[arg(long)]
        format: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "speakingdoc=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match Cli::parse().command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Extract { path, format } => extract_file(path, format).await,
    }
}

async fn serve() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config.server);

    let state = AppState::from_config(config.clone()).context("Failed to initialize application state")?;
    info!(storage = state.storage.name(), "Application state initialized");

    let app = create_router(state);

    let ip = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid HOST: {}", config.server.host))?;
    let addr = SocketAddr::new(ip, config.server.port);
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Server stopped");
    Ok(())
}

async fn extract_file(path: PathBuf, format: Option<String>) -> anyhow::Result<()> {
    let format = match format {
        Some(tag) => tag.parse::<DocumentFormat>()?,
        None => DocumentFormat::from_path(&path)?,
    };

    let source = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let text = tokio::task::spawn_blocking(move || {
        let document = ExtractedDocument::extract(&source, format)?;
        info!(
            format = %document.format(),
            source_len = document.source().len(),
            text_len = document.text().len(),
            "Extracted document"
        );
        Ok::<_, anyhow::Error>(document.into_text())
    })
    .await??;
    println!("{}", text);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
