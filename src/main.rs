//! PulseHub notification daemon.
//!
//! Entry point that wires the notification engine, real-time hub, and
//! background worker together and runs until interrupted. Storage binds
//! to the in-memory store; production deployments swap the store ports
//! for their persistence layer when embedding the engine.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use pulsehub_cache::CacheManager;
use pulsehub_core::config::AppConfig;
use pulsehub_core::error::AppError;
use pulsehub_notify::channel::{
    ChannelRegistry, EmailChannelAdapter, LogEmailTransport, PushChannelAdapter,
    RealtimeChannelAdapter,
};
use pulsehub_notify::engine::{NotificationEngine, NotificationStores};
use pulsehub_notify::store::MemoryStore;
use pulsehub_realtime::NotificationHub;
use pulsehub_worker::CronScheduler;

#[tokio::main]
async fn main() {
    let env = std::env::var("PULSEHUB_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Daemon error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main daemon run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting PulseHub notifyd v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Initialize cache ─────────────────────────────────
    tracing::info!("Initializing cache (provider: {})...", config.cache.provider);
    let cache = CacheManager::new(&config.cache)?;

    // ── Step 2: Initialize stores ────────────────────────────────
    let store = Arc::new(MemoryStore::new());
    let stores = NotificationStores::in_memory(store);
    tracing::info!("In-memory store initialized");

    // ── Step 3: Real-time hub and delivery channels ──────────────
    let hub = Arc::new(NotificationHub::new(config.realtime.clone()));

    let mut registry = ChannelRegistry::new();
    if config.notifications.enable_realtime {
        registry.register(Arc::new(RealtimeChannelAdapter::new(hub.clone())));
    }
    if config.notifications.enable_email {
        registry.register(Arc::new(EmailChannelAdapter::new(Arc::new(
            LogEmailTransport,
        ))));
    }
    if config.notifications.enable_push {
        registry.register(Arc::new(PushChannelAdapter));
    }

    // ── Step 4: Notification engine ──────────────────────────────
    let engine = NotificationEngine::start(
        stores,
        registry,
        cache,
        config.notifications.clone(),
        &config.cache,
    );

    // ── Step 5: Background worker ────────────────────────────────
    let mut scheduler = if config.worker.enabled {
        let scheduler = CronScheduler::new(engine.dispatcher(), engine.service()).await?;
        scheduler.register_default_tasks().await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Background worker disabled by configuration");
        None
    };

    tracing::info!("PulseHub notifyd is running, press Ctrl+C to stop");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::internal(format!("Failed to listen for shutdown signal: {e}")))?;
    tracing::info!("Shutdown signal received");

    // ── Graceful shutdown ────────────────────────────────────────
    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }
    engine.shutdown().await;

    tracing::info!("PulseHub notifyd stopped");
    Ok(())
}
