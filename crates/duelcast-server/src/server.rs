//! `DuelcastServer`: Axum HTTP + WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::{Json, Response};
use axum::routing::get;
use duelcast_core::{ConnectionId, Repository, RoundEngine};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::hub::{self, Hub, HubHandle};
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::session::{SessionContext, run_connection};

/// Shared state for Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// What each upgraded connection is handed.
    pub session: SessionContext,
    /// When the server started.
    pub start_time: Instant,
}

/// Query string accepted on `/ws`.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    /// Claimed identity; empty when absent, which is never a participant.
    #[serde(default)]
    pub wallet_address: String,
}

/// Build the router for `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /ws
///
/// Any origin is accepted. Admission happens on the hub after upgrade.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> Response {
    let id = ConnectionId::new();
    let limit = state.session.config.max_message_size;
    debug!(conn_id = %id, "websocket upgrade");
    ws.max_message_size(limit)
        .max_frame_size(limit)
        .on_failed_upgrade(|error| warn!(%error, "websocket upgrade failed"))
        .on_upgrade(move |socket| run_connection(socket, id, params.wallet_address, state.session))
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connections = state.session.hub.connection_count().await;
    Json(health::health_check(state.start_time, connections))
}

/// The duelcast server, not yet listening.
pub struct DuelcastServer {
    config: ServerConfig,
    repo: Arc<dyn Repository>,
}

impl DuelcastServer {
    /// Create a server over `repo`.
    pub fn new(config: ServerConfig, repo: Arc<dyn Repository>) -> Self {
        Self { config, repo }
    }

    /// Bind, start the hub, and start serving.
    pub async fn start(self) -> std::io::Result<ServerHandle> {
        let listener =
            tokio::net::TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;
        let addr = listener.local_addr()?;

        let shutdown = Arc::new(ShutdownCoordinator::new());
        let (hub, handle) = Hub::new(Arc::clone(&self.repo), self.config.hub_capacity);
        shutdown.track(hub::spawn(hub, shutdown.token()));

        let engine = RoundEngine::new(self.repo).with_policy(self.config.announce);
        let state = AppState {
            session: SessionContext {
                hub: handle.clone(),
                engine,
                config: Arc::new(self.config.connection.clone()),
            },
            start_time: Instant::now(),
        };

        let app = router(state);
        let token = shutdown.token();
        shutdown.track(tokio::spawn(async move {
            let serve = axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await });
            if let Err(error) = serve.await {
                warn!(%error, "http server stopped with error");
            }
        }));

        info!(%addr, "duelcast server listening");
        Ok(ServerHandle {
            addr,
            hub: handle,
            shutdown,
            config: self.config,
        })
    }
}

/// A running server.
pub struct ServerHandle {
    addr: SocketAddr,
    hub: HubHandle,
    shutdown: Arc<ShutdownCoordinator>,
    config: ServerConfig,
}

impl ServerHandle {
    /// Address actually bound.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Bound port.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Handle to the running hub.
    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    /// Stop accepting, close every connection, and wait for tasks.
    pub async fn shutdown(self) {
        self.shutdown
            .graceful_shutdown(self.config.shutdown_timeout)
            .await;
        info!(addr = %self.addr, "duelcast server stopped");
    }
}
