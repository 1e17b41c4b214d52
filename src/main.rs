//! BoxOffice server: seat booking with a priority waitlist.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use boxoffice_api::{AppState, build_app};
use boxoffice_cache::provider::{CacheManager, connect_coordination};
use boxoffice_core::config::AppConfig;
use boxoffice_core::error::AppError;
use boxoffice_core::traits::CacheProvider;
use boxoffice_database::DatabasePool;
use boxoffice_database::repositories::{
    NotificationRepository, PgInventoryStore, WaitlistRepository,
};
use boxoffice_database::store::InventoryStore;
use boxoffice_service::{BookingService, CacheInvalidator, EventCatalog, Outbox, WaitlistService};
use boxoffice_worker::jobs::PromotionExpiryJob;
use boxoffice_worker::{CronScheduler, DatabaseNotificationSender, NotificationDispatcher};

#[tokio::main]
async fn main() {
    let env = std::env::var("BOXOFFICE_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config, &env).await {
        tracing::error!(error = %e, "Server error");
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
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig, env: &str) -> Result<(), AppError> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        env,
        "Starting BoxOffice"
    );

    // ── Step 1: Database connection + migrations ─────────────────
    let database = DatabasePool::connect(&config.database).await?;
    tracing::info!("Database ready");

    // ── Step 2: Cache and coordination store ─────────────────────
    tracing::info!(provider = %config.cache.provider, "Initializing cache");
    let cache: Arc<dyn CacheProvider> = Arc::new(CacheManager::new(&config.cache).await?);

    tracing::info!(
        provider = %config.coordination.provider,
        "Initializing coordination store"
    );
    let coordination = connect_coordination(&config.coordination).await?;

    // ── Step 3: Stores ───────────────────────────────────────────
    let pool = database.pool().clone();
    let inventory: Arc<dyn InventoryStore> = Arc::new(PgInventoryStore::new(pool.clone()));
    let waitlist_store = Arc::new(WaitlistRepository::new(pool.clone()));

    // ── Step 4: Services ─────────────────────────────────────────
    let (outbox, outbox_rx) = Outbox::channel(&config.notifications);

    let waitlist = Arc::new(WaitlistService::new(
        waitlist_store,
        Arc::clone(&inventory),
        Arc::clone(&coordination),
        outbox.clone(),
        config.waitlist.clone(),
    ));
    let booking = Arc::new(BookingService::new(
        Arc::clone(&inventory),
        Arc::clone(&coordination),
        Arc::clone(&waitlist),
        CacheInvalidator::new(Arc::clone(&cache)),
        outbox,
        config.booking.clone(),
    ));
    let catalog = Arc::new(EventCatalog::new(
        Arc::clone(&inventory),
        Arc::clone(&cache),
    ));

    // ── Step 5: Shutdown channel & worker ────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sender = Arc::new(DatabaseNotificationSender::new(NotificationRepository::new(
        pool,
    )));
    let dispatcher = NotificationDispatcher::new(outbox_rx, sender);

    let scheduler = if config.worker.enabled {
        let scheduler = CronScheduler::new().await?;
        scheduler
            .register(
                &config.waitlist.expiry_cron,
                Arc::new(PromotionExpiryJob::new(Arc::clone(&waitlist))),
            )
            .await?;
        scheduler.start().await?;
        tracing::info!(cron = %config.waitlist.expiry_cron, "Promotion expiry sweep scheduled");
        Some(scheduler)
    } else {
        tracing::info!("Worker disabled; promotion expiry sweep will not run in this process");
        None
    };

    // the dispatcher drains the outbox even when the worker is disabled
    let worker_handle = tokio::spawn(async move {
        let delivered = dispatcher.run(shutdown_rx).await;
        if let Some(mut scheduler) = scheduler {
            if let Err(e) = scheduler.shutdown().await {
                tracing::warn!(error = %e, "Scheduler shutdown failed");
            }
        }
        tracing::info!(delivered, "Worker stopped");
    });

    // ── Step 6: Build and start HTTP server ──────────────────────
    let app_state = AppState {
        config: Arc::new(config.clone()),
        database: Some(database.clone()),
        cache,
        coordination,
        booking,
        waitlist,
        catalog,
    };
    let app = build_app(app_state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(address = %addr, "BoxOffice server listening");

    // ── Step 7: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 8: Wait for background tasks ────────────────────────
    tracing::info!("Waiting for background tasks to complete...");
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    if tokio::time::timeout(grace, worker_handle).await.is_err() {
        tracing::warn!("Worker did not stop within the grace period");
    }

    database.close().await;
    tracing::info!("BoxOffice server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
