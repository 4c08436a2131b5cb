//! Test server harness for E2E testing
//!
//! Provides `TestFloorServer` for spawning real floor server instances in tests.

use crate::client::FloorClient;
use floor_service::actors::{FloorActorConfig, FloorActorHandle};
use floor_service::broadcast::BroadcastCoordinator;
use floor_service::config::Config;
use floor_service::floor::Snapshot;
use floor_service::observability::HealthState;
use floor_service::routes::{self, AppState};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Identity bootstrapped as president on every test server.
pub const TEST_PRESIDENT: &str = "speaker";

/// Test harness for spawning the floor service in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health_flow_e2e() -> Result<()> {
///     let server = TestFloorServer::spawn().await?;
///
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestFloorServer {
    addr: SocketAddr,
    config: Config,
    broadcast: Arc<BroadcastCoordinator>,
    cancel_token: CancellationToken,
    _actor_handle: JoinHandle<()>,
    _handle: JoinHandle<()>,
}

impl TestFloorServer {
    /// Spawn a server with default settings and `speaker` as president.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(&[]).await
    }

    /// Spawn a server with extra `FLOOR_*` configuration variables.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Start the floor actor and HTTP server in the background
    /// - Report ready on `/ready`
    pub async fn spawn_with_vars(extra: &[(&str, &str)]) -> Result<Self, anyhow::Error> {
        let mut vars = HashMap::from([
            ("FLOOR_PRESIDENT_ID".to_string(), TEST_PRESIDENT.to_string()),
            ("FLOOR_BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("FLOOR_ID".to_string(), "floor-test".to_string()),
        ]);
        for (key, value) in extra {
            vars.insert((*key).to_string(), (*value).to_string());
        }

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let cancel_token = CancellationToken::new();
        let broadcast = Arc::new(BroadcastCoordinator::new(
            config.event_buffer,
            Snapshot::default(),
        ));
        let (floor, actor_handle) = FloorActorHandle::spawn(
            FloorActorConfig {
                floor_id: config.floor_id.clone(),
                settings: config.floor_settings(),
                pending_timeout: config.pending_timeout,
            },
            Arc::clone(&broadcast),
            cancel_token.child_token(),
        )
        .map_err(|e| anyhow::anyhow!("Failed to start floor actor: {}", e))?;

        let state = Arc::new(AppState {
            floor,
            broadcast: Arc::clone(&broadcast),
            config: config.clone(),
        });

        // A recorder that is never installed, so parallel tests do not
        // fight over the global one.
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();
        let health = Arc::new(HealthState::new());
        health.set_ready();

        let app = routes::build_routes(state, metrics_handle, health)
            .map_err(|e| anyhow::anyhow!("Failed to build routes: {}", e))?;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            broadcast,
            cancel_token,
            _actor_handle: actor_handle,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Direct access to the broadcast coordinator, for subscribing
    /// in-process without going through SSE.
    pub fn broadcast(&self) -> &Arc<BroadcastCoordinator> {
        &self.broadcast
    }

    /// HTTP client acting as `identity`.
    pub fn client(&self, identity: &str) -> FloorClient {
        FloorClient::new(self.url(), &self.config.identity_header, Some(identity))
    }

    /// HTTP client that sends no identity header.
    pub fn anonymous_client(&self) -> FloorClient {
        FloorClient::new(self.url(), &self.config.identity_header, None)
    }

    /// Client acting as the bootstrap president.
    pub fn president(&self) -> FloorClient {
        self.client(TEST_PRESIDENT)
    }

    /// Stop the floor actor, ending every open event stream.
    pub fn stop_actor(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for TestFloorServer {
    fn drop(&mut self) {
        self.cancel_token.cancel();
        self._handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_spawns_successfully() -> Result<(), anyhow::Error> {
        let server = TestFloorServer::spawn().await?;

        assert!(server.url().starts_with("http://127.0.0.1:"));

        let response = reqwest::get(format!("{}/health", server.url())).await?;
        assert_eq!(response.status(), 200);

        let response = reqwest::get(format!("{}/ready", server.url())).await?;
        assert_eq!(response.status(), 200);

        Ok(())
    }

    #[tokio::test]
    async fn test_server_provides_addr() -> Result<(), anyhow::Error> {
        let server = TestFloorServer::spawn().await?;

        let addr = server.addr();
        assert!(addr.ip().is_loopback());
        assert!(addr.port() > 0);
        assert_eq!(server.url(), format!("http://{}", addr));

        Ok(())
    }

    #[tokio::test]
    async fn test_extra_vars_reach_config() -> Result<(), anyhow::Error> {
        let server = TestFloorServer::spawn_with_vars(&[("FLOOR_MAX_ACTIVE_ITEMS", "2")]).await?;
        assert_eq!(server.config().max_active_items, 2);
        Ok(())
    }
}
