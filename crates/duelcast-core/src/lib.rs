//! # duelcast-core
//!
//! Domain layer shared by the store and the server:
//!
//! - [`wire`]: the inbound move frame and its size-limited decoder
//! - [`round`]: rounds, player slots, the winner rule, announcement text
//! - [`repository`]: the move-store contract the engine runs against
//! - [`engine`]: the stateless round engine
//! - [`errors`]: storage, decode, and transport error taxonomy

#![deny(unsafe_code)]

pub mod engine;
pub mod errors;
pub mod ids;
pub mod repository;
pub mod round;
pub mod wire;

pub use engine::{AnnouncePolicy, RoundEngine};
pub use errors::{DecodeError, StorageError, TransportError};
pub use ids::ConnectionId;
pub use repository::Repository;
pub use round::{Outcome, PlayerSlot, Round, decide_winner, move_announcement};
pub use wire::{MAX_MESSAGE_SIZE, MoveRequest};
