//! Per-connection WebSocket handling.
//!
//! Every admitted socket is split in two: the inbound pump reads move frames
//! on the session task, the outbound pump writes queued broadcasts and
//! keepalive pings on its own task. A shared `CancellationToken` ties their
//! lifetimes together.

pub mod inbound;
pub mod outbound;
pub mod session;

use std::fmt;

use duelcast_core::{DecodeError, StorageError, TransportError};

/// Why a pump stopped.
#[derive(Debug)]
pub enum PumpExit {
    /// Peer sent a close frame.
    PeerClosed,
    /// The read stream ended without a close frame.
    StreamEnded,
    /// The other pump or the server stopped this one.
    Cancelled,
    /// The hub closed the outbound queue.
    QueueClosed,
    /// An inbound frame was not a valid move request.
    Decode(DecodeError),
    /// Recording the move or checking the round failed.
    Storage(StorageError),
    /// Read or write failed or timed out.
    Transport(TransportError),
}

impl PumpExit {
    /// Whether this exit is part of a normal close handshake.
    pub fn is_clean(&self) -> bool {
        matches!(
            self,
            Self::PeerClosed | Self::StreamEnded | Self::Cancelled | Self::QueueClosed
        )
    }
}

impl fmt::Display for PumpExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeerClosed => f.write_str("peer closed"),
            Self::StreamEnded => f.write_str("stream ended"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::QueueClosed => f.write_str("outbound queue closed"),
            Self::Decode(e) => write!(f, "{e}"),
            Self::Storage(e) => write!(f, "{e}"),
            Self::Transport(e) => write!(f, "{e}"),
        }
    }
}
