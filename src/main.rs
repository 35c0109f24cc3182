//! Main entry point for the team-elo rating service
//!
//! Loads configuration, initializes logging, opens the configured store and
//! serves the HTTP API until a shutdown signal arrives.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use team_elo::config::{validate_config, AppConfig, StorageBackend};
use team_elo::service;
use team_elo::storage::{InMemoryRatingStore, SqliteRatingStore};
use tokio::signal;
use tracing::{error, info, warn};

/// Team Elo - ratings and match history for team-based pickup games
#[derive(Parser)]
#[command(
    name = "team-elo",
    version,
    about = "Elo ratings and match history for team-based pickup games",
    long_about = "team-elo records matches between two teams of players, updates every \
                 participant's Elo rating from the average strength of both teams, and keeps \
                 a per-player rating history. It serves a small JSON API over HTTP."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// HTTP port override
    #[arg(long, value_name = "PORT", help = "Override HTTP server port")]
    http_port: Option<u16>,

    /// SQLite path override
    #[arg(long, value_name = "FILE", help = "Override SQLite database path")]
    sqlite_path: Option<PathBuf>,

    /// Use the in-memory store
    #[arg(long, help = "Keep all data in memory (lost on exit)")]
    in_memory: bool,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("Team Elo rating service");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   HTTP: {}", config.bind_address());
    match config.storage.backend {
        StorageBackend::Memory => info!("   Storage: in-memory"),
        StorageBackend::Sqlite => info!(
            "   Storage: sqlite ({})",
            config.storage.sqlite_path.display()
        ),
    }
    info!(
        "   Recent history per player: {}",
        config.league.recent_history_limit
    );
}

/// Load and merge configuration from file/environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(http_port) = args.http_port {
        config.service.http_port = http_port;
    }

    if let Some(sqlite_path) = &args.sqlite_path {
        config.storage.backend = StorageBackend::Sqlite;
        config.storage.sqlite_path = sqlite_path.clone();
    }

    if args.in_memory {
        config.storage.backend = StorageBackend::Memory;
    }

    validate_config(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_startup_banner(&config);

    if args.dry_run {
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    let result = match config.storage.backend {
        StorageBackend::Memory => {
            let store = Arc::new(InMemoryRatingStore::new());
            service::serve(&config, store, wait_for_shutdown_signal()).await
        }
        StorageBackend::Sqlite => {
            let store = match SqliteRatingStore::open(&config.storage.sqlite_path) {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    error!("Failed to open rating store: {}", e);
                    std::process::exit(1);
                }
            };
            service::serve(&config, store, wait_for_shutdown_signal()).await
        }
    };

    if let Err(e) = result {
        error!("Service failed: {:#}", e);
        std::process::exit(1);
    }

    info!("Team Elo rating service stopped");
    Ok(())
}
