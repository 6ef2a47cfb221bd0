//! Inbound wire format.

use serde::{Deserialize, Serialize};

use crate::errors::DecodeError;
use crate::round::PlayerSlot;

/// Maximum inbound frame size accepted from a peer, in bytes.
pub const MAX_MESSAGE_SIZE: usize = 512;

/// One move submitted by a player.
///
/// Absent fields decode to their zero value, so a frame carrying only
/// `game_id` and `move` is still accepted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveRequest {
    /// Submitting player's wallet address.
    pub wallet_address: String,
    /// Game the move belongs to.
    pub game_id: String,
    /// On-chain transaction that paid for the move. Carried, not checked.
    pub transaction_hash: String,
    /// Player slot on the wire (`1` or `2`).
    pub player_number: i64,
    /// Move value; `1`, `2`, or `3` in a well-formed game.
    #[serde(rename = "move")]
    pub mv: i64,
}

impl MoveRequest {
    /// Decode a text payload, enforcing `limit` bytes.
    pub fn decode(text: &str, limit: usize) -> Result<Self, DecodeError> {
        if text.len() > limit {
            return Err(DecodeError::TooLarge {
                size: text.len(),
                limit,
            });
        }
        Ok(serde_json::from_str(text)?)
    }

    /// Decode a binary payload, which must hold UTF-8 JSON.
    pub fn decode_bytes(data: &[u8], limit: usize) -> Result<Self, DecodeError> {
        if data.len() > limit {
            return Err(DecodeError::TooLarge {
                size: data.len(),
                limit,
            });
        }
        let text = std::str::from_utf8(data).map_err(|_| DecodeError::InvalidUtf8)?;
        Self::decode(text, limit)
    }

    /// Slot this move is recorded against.
    pub fn slot(&self) -> PlayerSlot {
        PlayerSlot::from_wire(self.player_number)
    }
}
