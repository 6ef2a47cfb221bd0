//! Move-store contract.

use crate::errors::StorageError;
use crate::round::{PlayerSlot, Round};

/// Durable per-game move state.
///
/// Implementations must be safe for concurrent independent calls: several
/// connections' inbound pumps and the hub's admission check all call in
/// at once. Consistency per `game_id` is the implementation's job.
///
/// Calls are blocking; async callers run them on the blocking pool.
pub trait Repository: Send + Sync {
    /// Store `mv` in `slot` of `game_id`. Unknown games are `NotFound`.
    fn update_move(&self, game_id: &str, slot: PlayerSlot, mv: i64) -> Result<(), StorageError>;

    /// The round for `game_id` if both moves are present.
    fn find_completed_round(&self, game_id: &str) -> Result<Option<Round>, StorageError>;

    /// Whether `identity` is seated in any round.
    fn is_participant(&self, identity: &str) -> Result<bool, StorageError>;

    /// Mark `game_id` announced and record `winner`.
    ///
    /// Returns `true` only for the single caller that flipped the flag.
    fn claim_announcement(&self, game_id: &str, winner: Option<&str>) -> Result<bool, StorageError>;
}
