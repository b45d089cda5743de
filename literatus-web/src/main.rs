//! Literatus web service - Main entry point
//!
//! Book shelf with three preference tiers, ranked by pairwise comparison
//! interviews instead of direct numeric ratings.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use literatus_core::db::init::initialize_database;
use literatus_web::config::Config;
use literatus_web::lookup::{self, BookLookup};
use literatus_web::{api, AppContext};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for literatus-web
#[derive(Parser, Debug)]
#[command(name = "literatus-web")]
#[command(about = "Book tier-ranking web service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5750", env = "LITERATUS_PORT")]
    port: u16,

    /// SQLite database file (created if missing)
    #[arg(short, long, default_value = "literatus.db", env = "LITERATUS_DATABASE")]
    database: PathBuf,

    /// Base URL of the book metadata API
    #[arg(long, default_value = lookup::GOOGLE_BOOKS_BASE_URL, env = "LITERATUS_LOOKUP_URL")]
    lookup_base_url: String,
}

impl Args {
    fn into_config(self) -> Config {
        Config {
            db_path: self.database,
            port: self.port,
            lookup_base_url: self.lookup_base_url,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "literatus_web=debug,literatus_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Args::parse().into_config();

    info!("Starting Literatus on port {}", config.port);
    info!("Database: {}", config.db_path.display());

    let pool = SqlitePoolOptions::new()
        .connect_with(
            SqliteConnectOptions::new()
                .filename(&config.db_path)
                .create_if_missing(true),
        )
        .await
        .context("Failed to open database")?;

    initialize_database(&pool)
        .await
        .context("Failed to initialize database")?;

    let lookup = BookLookup::with_base_url(config.lookup_base_url.clone());
    let ctx = AppContext::new(pool, lookup);
    let app = api::create_router(ctx);

    let addr = config.bind_addr();
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
