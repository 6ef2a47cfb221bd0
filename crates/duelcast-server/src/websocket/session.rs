//! Connection lifecycle from upgrade to disconnect.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::ws::WebSocket;
use duelcast_core::{ConnectionId, RoundEngine};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::inbound::run_inbound;
use super::outbound::run_outbound;
use crate::config::ConnectionConfig;
use crate::hub::{Admission, HubHandle, outbound_queue};

/// Everything a connection needs from the server.
#[derive(Clone)]
pub struct SessionContext {
    /// Registry handle.
    pub hub: HubHandle,
    /// Round engine shared by every connection.
    pub engine: RoundEngine,
    /// Per-connection limits.
    pub config: Arc<ConnectionConfig>,
}

/// Drive one upgraded socket until either side gives up.
///
/// No frame is read until the hub has admitted the connection. A denied
/// peer only ever sees a close frame: its queue is already closed, so the
/// outbound pump sends the close and exits without touching the reader.
#[instrument(skip_all, fields(conn_id = %id))]
pub async fn run_connection(socket: WebSocket, id: ConnectionId, identity: String, ctx: SessionContext) {
    let started = Instant::now();
    let (outbox, queue) = outbound_queue(ctx.config.outbound_capacity);

    let admission = Admission {
        id: id.clone(),
        identity: identity.clone(),
        outbox,
    };
    if !ctx.hub.admit(admission).await {
        let exit = run_outbound(id, socket, queue, ctx.config, CancellationToken::new()).await;
        debug!(identity = %identity, exit = %exit, "connection refused");
        return;
    }
    info!(identity = %identity, "connection opened");

    let (sink, stream) = socket.split();
    let closed = CancellationToken::new();
    let writer = tokio::spawn(run_outbound(
        id.clone(),
        sink,
        queue,
        Arc::clone(&ctx.config),
        closed.clone(),
    ));

    let inbound = run_inbound(&id, stream, &ctx.hub, &ctx.engine, &ctx.config, &closed).await;
    let outbound = match writer.await {
        Ok(exit) => exit.to_string(),
        Err(e) => {
            warn!(error = %e, "outbound pump panicked");
            "panicked".to_owned()
        }
    };

    info!(
        identity = %identity,
        inbound = %inbound,
        outbound = %outbound,
        duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "connection closed"
    );
}
