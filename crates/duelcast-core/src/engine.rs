//! Round engine: move recording, completion detection, and outcome.

use std::sync::Arc;

use crate::errors::StorageError;
use crate::repository::Repository;
use crate::round::{Outcome, PlayerSlot, Round};

/// Whether a completed round's outcome may be broadcast more than once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnnouncePolicy {
    /// Broadcast the outcome once per round (claimed via the repository).
    #[default]
    Once,
    /// Re-broadcast on every move that finds the round complete.
    EveryMove,
}

/// Stateless operations over a [`Repository`].
#[derive(Clone)]
pub struct RoundEngine {
    repo: Arc<dyn Repository>,
    policy: AnnouncePolicy,
}

impl RoundEngine {
    /// Create an engine announcing once per round.
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self {
            repo,
            policy: AnnouncePolicy::Once,
        }
    }

    /// Override the announce policy.
    #[must_use]
    pub fn with_policy(mut self, policy: AnnouncePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Active announce policy.
    pub fn policy(&self) -> AnnouncePolicy {
        self.policy
    }

    /// Store a player's move. No range check is made on `mv`.
    pub fn record_move(&self, game_id: &str, slot: PlayerSlot, mv: i64) -> Result<(), StorageError> {
        self.repo.update_move(game_id, slot, mv)
    }

    /// The round for `game_id` once both moves are in.
    pub fn check_round_complete(&self, game_id: &str) -> Result<Option<Round>, StorageError> {
        self.repo.find_completed_round(game_id)
    }

    /// Decide whether a completed round should be announced now.
    ///
    /// Under [`AnnouncePolicy::Once`] the repository's announced flag is
    /// claimed and the winner's address stored; only the claiming caller
    /// gets `Some`.
    pub fn settle(&self, round: &Round) -> Result<Option<Outcome>, StorageError> {
        let Some(outcome) = round.outcome() else {
            return Ok(None);
        };
        match self.policy {
            AnnouncePolicy::EveryMove => Ok(Some(outcome)),
            AnnouncePolicy::Once => {
                let winner = round.address(outcome.slot());
                let claimed = self.repo.claim_announcement(&round.game_id, winner)?;
                Ok(claimed.then_some(outcome))
            }
        }
    }
}
