//! Outbound pump: queued broadcasts and keepalive pings out to the peer.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use duelcast_core::{ConnectionId, TransportError};
use futures::{Sink, SinkExt};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::PumpExit;
use crate::config::ConnectionConfig;

/// Write to `sink` until the queue closes, a write fails, or `closed` fires.
///
/// Messages already waiting in the queue when one arrives are coalesced into
/// a single text frame, newline-separated. A ping goes out every
/// `ping_period`. Every write is bounded by `write_wait`. On return a close
/// frame has been attempted and `closed` is cancelled.
pub async fn run_outbound<K>(
    id: ConnectionId,
    mut sink: K,
    mut queue: mpsc::Receiver<Arc<str>>,
    config: Arc<ConnectionConfig>,
    closed: CancellationToken,
) -> PumpExit
where
    K: Sink<Message> + Unpin,
    K::Error: Display,
{
    let wait = config.write_wait;
    let mut ping = tokio::time::interval(config.ping_period);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately.
    let _ = ping.tick().await;

    let exit = loop {
        tokio::select! {
            message = queue.recv() => {
                let Some(first) = message else {
                    break PumpExit::QueueClosed;
                };
                let batch = coalesce(&first, &mut queue);
                if let Err(e) = send_within(&mut sink, Message::Text(batch.into()), wait).await {
                    break PumpExit::Transport(e);
                }
            }
            _ = ping.tick() => {
                if let Err(e) = send_within(&mut sink, Message::Ping(Vec::new().into()), wait).await {
                    break PumpExit::Transport(e);
                }
            }
            () = closed.cancelled() => break PumpExit::Cancelled,
        }
    };

    if !matches!(exit, PumpExit::Transport(_)) {
        let _ = send_within(&mut sink, Message::Close(None), wait).await;
    }
    let _ = tokio::time::timeout(wait, sink.close()).await;

    match &exit {
        PumpExit::Transport(_) => warn!(conn_id = %id, reason = %exit, "outbound pump stopped"),
        _ => debug!(conn_id = %id, reason = %exit, "outbound pump stopped"),
    }
    closed.cancel();
    exit
}

/// Join `first` with every message queued at this instant.
fn coalesce(first: &str, queue: &mut mpsc::Receiver<Arc<str>>) -> String {
    let mut batch = String::from(first);
    for _ in 0..queue.len() {
        match queue.try_recv() {
            Ok(next) => {
                batch.push('\n');
                batch.push_str(&next);
            }
            Err(_) => break,
        }
    }
    batch
}

async fn send_within<K>(sink: &mut K, message: Message, wait: Duration) -> Result<(), TransportError>
where
    K: Sink<Message> + Unpin,
    K::Error: Display,
{
    match tokio::time::timeout(wait, sink.send(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(TransportError::Socket(e.to_string())),
        Err(_) => Err(TransportError::Timeout(wait)),
    }
}
