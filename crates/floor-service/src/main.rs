//! Floor Service
//!
//! Entry point for the parliamentary floor session coordinator.

use anyhow::Context;
use common::config::ObservabilityConfig;
use floor_service::actors::{FloorActorConfig, FloorActorHandle};
use floor_service::broadcast::BroadcastCoordinator;
use floor_service::config::Config;
use floor_service::floor::Snapshot;
use floor_service::observability::{init_metrics_recorder, HealthState};
use floor_service::routes::{self, AppState};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Time allowed for the actor to stop after shutdown is requested.
const ACTOR_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = EnvFilter::try_new(&observability.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(common::config::DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(filter);
    if observability.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let vars: HashMap<String, String> = std::env::vars().collect();
    let observability = ObservabilityConfig::from_vars(&vars);
    init_tracing(&observability);

    info!("Starting Floor Service");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        floor_id = %config.floor_id,
        bind_address = %config.bind_address,
        president = %config.president_id,
        max_active_items = config.max_active_items,
        pending_timeout_seconds = config.pending_timeout.map(|t| t.as_secs()),
        "Configuration loaded successfully"
    );

    let metrics_handle = init_metrics_recorder()
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to initialize metrics")?;

    let health = Arc::new(HealthState::new());
    let cancel_token = CancellationToken::new();
    let broadcast = Arc::new(BroadcastCoordinator::new(
        config.event_buffer,
        Snapshot::default(),
    ));

    let (floor, actor_task) = FloorActorHandle::spawn(
        FloorActorConfig {
            floor_id: config.floor_id.clone(),
            settings: config.floor_settings(),
            pending_timeout: config.pending_timeout,
        },
        Arc::clone(&broadcast),
        cancel_token.child_token(),
    )
    .context("Failed to start floor actor")?;

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    let state = Arc::new(AppState {
        floor,
        broadcast,
        config,
    });
    let app = routes::build_routes(state, metrics_handle, Arc::clone(&health))
        .context("Failed to build routes")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    health.set_ready();
    info!("Floor Service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&health), cancel_token.clone()))
        .await
        .context("HTTP server error")?;

    cancel_token.cancel();
    match tokio::time::timeout(ACTOR_SHUTDOWN_TIMEOUT, actor_task).await {
        Ok(Ok(())) => info!("Floor actor stopped"),
        Ok(Err(e)) => warn!("Floor actor task failed: {}", e),
        Err(_) => warn!("Floor actor did not stop within the shutdown timeout"),
    }

    info!("Floor Service shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
///
/// Readiness drops first; the floor actor is cancelled so open event
/// streams end and the server can finish draining.
async fn shutdown_signal(health: Arc<HealthState>, cancel_token: CancellationToken) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    health.set_not_ready();
    cancel_token.cancel();
}
