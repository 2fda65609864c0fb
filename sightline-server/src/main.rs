//! sightline-server - wildlife sighting ingestion and notification service
//!
//! Accepts sighting reports over HTTP, validates them against the animal's
//! last known position, persists accepted ones and notifies everyone who
//! has previously reported the same animal.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sightline_common::config::{resolve_config_path, TomlConfig};
use sightline_common::{time, NotificationBroker};
use sightline_server::mailer::{EmailSender, LogEmailSender, MailTemplates, SmtpEmailSender};
use sightline_server::repository::{MemoryStore, Repositories, SqliteStore};
use sightline_server::services::{NotificationConsumer, SighterResolver, ValidationPolicy};
use sightline_server::{build_router, AppState};

/// Upper bound on waiting for buffered notifications after the server stops
const SHUTDOWN_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser, Debug)]
#[command(name = "sightline-server")]
#[command(about = "Wildlife sighting ingestion and notification service")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "SIGHTLINE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, overrides [server] bind
    #[arg(short, long, env = "SIGHTLINE_BIND")]
    bind: Option<SocketAddr>,

    /// SQLite database file, overrides [database] path
    #[arg(short, long, env = "SIGHTLINE_DATABASE")]
    database: Option<PathBuf>,

    /// Keep everything in memory (nothing survives a restart)
    #[arg(long, conflicts_with = "database")]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let loaded = match &config_path {
        Some(path) => TomlConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => None,
    };
    let config_found = loaded.is_some();
    let config = loaded.unwrap_or_default();

    let level = config.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("sightline_server={level},sightline_common={level},tower_http={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting sightline-server v{}", env!("CARGO_PKG_VERSION"));
    match (&config_path, config_found) {
        (Some(path), true) => info!("Loaded config from {}", path.display()),
        (Some(path), false) => warn!("Config file {} not found, using defaults", path.display()),
        (None, _) => info!("No config file, using defaults"),
    }

    let repos = if args.in_memory {
        warn!("Running with in-memory storage");
        Repositories::from_store(Arc::new(MemoryStore::new()))
    } else {
        let db_path = args.database.clone().unwrap_or_else(|| config.database_path());
        info!("Database path: {}", db_path.display());
        let store = SqliteStore::connect(&db_path)
            .await
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;
        Repositories::from_store(Arc::new(store))
    };

    let templates = Arc::new(MailTemplates::builtin().context("Failed to compile mail templates")?);
    let template = config.notifications.template.clone();
    if !templates.has_template(&template) {
        bail!("Unknown notification template '{}'", template);
    }

    let sender: Arc<dyn EmailSender> = match &config.smtp {
        Some(smtp) => {
            info!("Delivering notifications via SMTP relay {}:{}", smtp.host, smtp.port);
            Arc::new(SmtpEmailSender::new(smtp, templates.clone()).context("Invalid SMTP configuration")?)
        }
        None => {
            warn!("No [smtp] section, notifications will only be logged");
            Arc::new(LogEmailSender::new(templates.clone()))
        }
    };

    let (broker, subscription) = NotificationBroker::new();
    let cancel = CancellationToken::new();

    let resolver = Arc::new(SighterResolver::new(repos.sightings.clone(), repos.users.clone()));
    let consumer = NotificationConsumer::new(
        resolver,
        sender,
        template,
        time::millis_to_duration(config.notifications.dispatch_timeout_ms),
    );
    let mut consumer = consumer.spawn(subscription, cancel.clone());

    let policy = ValidationPolicy::from(&config.validation);
    info!(
        min_distance_meters = policy.min_distance_meters,
        reject_future = policy.temporal.reject_future,
        require_after_reference = policy.temporal.require_after_reference,
        "Sighting validation policy"
    );

    let state = AppState::new(repos, broker.clone(), policy);
    let app = build_router(state);

    let addr: SocketAddr = match args.bind {
        Some(addr) => addr,
        None => config
            .server
            .bind
            .parse()
            .with_context(|| format!("Invalid [server] bind address '{}'", config.server.bind))?,
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("sightline-server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // No request can publish any more; let the consumer drain what is queued
    broker.close();
    match tokio::time::timeout(SHUTDOWN_DRAIN_TIMEOUT, consumer.wait()).await {
        Ok(Ok(stats)) => info!(?stats, "Notification consumer drained"),
        Ok(Err(e)) => error!("Notification consumer task failed: {}", e),
        Err(_) => {
            warn!("Notification drain timed out, abandoning remaining events");
            cancel.cancel();
            if let Err(e) = consumer.wait().await {
                error!("Notification consumer task failed: {}", e);
            }
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
