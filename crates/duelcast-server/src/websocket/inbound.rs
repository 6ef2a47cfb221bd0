//! Inbound pump: peer frames in, moves recorded, announcements out.

use std::fmt::Display;

use axum::extract::ws::Message;
use duelcast_core::{
    ConnectionId, MoveRequest, RoundEngine, StorageError, TransportError, move_announcement,
};
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::PumpExit;
use crate::blocking::run_blocking;
use crate::config::ConnectionConfig;
use crate::hub::HubHandle;

/// Read frames from `stream` until the connection ends.
///
/// Any frame (pings and pongs included) resets the `pong_wait` deadline.
/// On return the connection has been unregistered and `closed` cancelled,
/// whatever the reason.
pub async fn run_inbound<S, E>(
    id: &ConnectionId,
    mut stream: S,
    hub: &HubHandle,
    engine: &RoundEngine,
    config: &ConnectionConfig,
    closed: &CancellationToken,
) -> PumpExit
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let exit = loop {
        let next = tokio::select! {
            () = closed.cancelled() => None,
            next = tokio::time::timeout(config.pong_wait, stream.next()) => Some(next),
        };
        let Some(next) = next else {
            break PumpExit::Cancelled;
        };

        let frame = match next {
            Err(_) => break PumpExit::Transport(TransportError::Timeout(config.pong_wait)),
            Ok(None) => break PumpExit::StreamEnded,
            Ok(Some(Err(e))) => break PumpExit::Transport(TransportError::Socket(e.to_string())),
            Ok(Some(Ok(frame))) => frame,
        };

        let decoded = match frame {
            Message::Text(text) => MoveRequest::decode(text.as_str(), config.max_message_size),
            Message::Binary(data) => MoveRequest::decode_bytes(&data, config.max_message_size),
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(_) => break PumpExit::PeerClosed,
        };
        let request = match decoded {
            Ok(request) => request,
            Err(e) => break PumpExit::Decode(e),
        };

        if let Err(e) = handle_move(&request, hub, engine).await {
            break PumpExit::Storage(e);
        }
    };

    match &exit {
        PumpExit::Transport(_) | PumpExit::Decode(_) | PumpExit::Storage(_) => {
            warn!(conn_id = %id, reason = %exit, "inbound pump stopped");
        }
        _ => debug!(conn_id = %id, reason = %exit, "inbound pump stopped"),
    }
    hub.unregister(id.clone()).await;
    closed.cancel();
    exit
}

/// Record one move, announce it, and announce the winner if it completed
/// the round.
async fn handle_move(
    request: &MoveRequest,
    hub: &HubHandle,
    engine: &RoundEngine,
) -> Result<(), StorageError> {
    let game_id = request.game_id.clone();
    let slot = request.slot();
    let mv = request.mv;

    let recorder = engine.clone();
    let game = game_id.clone();
    run_blocking(move || recorder.record_move(&game, slot, mv)).await?;
    debug!(game_id = %game_id, %slot, mv, "move recorded");

    hub.broadcast(move_announcement(request)).await;

    let settler = engine.clone();
    let game = game_id.clone();
    let outcome = run_blocking(move || match settler.check_round_complete(&game)? {
        Some(round) => settler.settle(&round),
        None => Ok(None),
    })
    .await?;

    if let Some(outcome) = outcome {
        info!(game_id = %game_id, winner = %outcome.slot(), "round decided");
        hub.broadcast(outcome.announcement()).await;
    }
    Ok(())
}
