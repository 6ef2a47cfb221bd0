//! Rounds, player slots, and the winner rule.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::wire::MoveRequest;

/// Which of the two seats in a round a move belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerSlot {
    /// First player.
    One,
    /// Second player.
    Two,
}

impl PlayerSlot {
    /// Map the wire `player_number`: `1` is slot one, anything else slot two.
    pub fn from_wire(player_number: i64) -> Self {
        if player_number == 1 { Self::One } else { Self::Two }
    }

    /// One-based seat number.
    pub fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.number())
    }
}

/// Persistent per-game move state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// Game key.
    pub game_id: String,
    /// Wallet address seated as player 1.
    pub player1_address: Option<String>,
    /// Wallet address seated as player 2.
    pub player2_address: Option<String>,
    /// Player 1's move, once made.
    pub player1_move: Option<i64>,
    /// Player 2's move, once made.
    pub player2_move: Option<i64>,
    /// Winning wallet address, once announced.
    pub winner: Option<String>,
    /// Whether the outcome has already been broadcast.
    #[serde(default)]
    pub announced: bool,
}

impl Round {
    /// Both moves are in.
    pub fn is_complete(&self) -> bool {
        self.player1_move.is_some() && self.player2_move.is_some()
    }

    /// Winner of a complete round; `None` while a move is missing.
    pub fn outcome(&self) -> Option<Outcome> {
        match (self.player1_move, self.player2_move) {
            (Some(m1), Some(m2)) => Some(decide_winner(m1, m2)),
            _ => None,
        }
    }

    /// Wallet address seated in `slot`.
    pub fn address(&self, slot: PlayerSlot) -> Option<&str> {
        match slot {
            PlayerSlot::One => self.player1_address.as_deref(),
            PlayerSlot::Two => self.player2_address.as_deref(),
        }
    }
}

/// Result of a complete round. There is no draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Player 1 takes the round.
    Player1,
    /// Player 2 takes the round.
    Player2,
}

impl Outcome {
    /// Seat of the winner.
    pub fn slot(self) -> PlayerSlot {
        match self {
            Self::Player1 => PlayerSlot::One,
            Self::Player2 => PlayerSlot::Two,
        }
    }

    /// Text broadcast to every connection.
    pub fn announcement(self) -> &'static str {
        match self {
            Self::Player1 => "player 1 wins",
            Self::Player2 => "player 2 wins",
        }
    }
}

/// Decide a round from player 1's move `m1` and player 2's move `m2`.
///
/// Values live in the cyclic domain `{1, 2, 3}` where 1 beats 3, 2 beats 1,
/// and 3 beats 2. The rule special-cases `m1 == 3` and otherwise compares
/// numerically. Equal moves and out-of-domain values are not special-cased:
/// they fall through to the comparison, so `(2, 2)` goes to player 2.
pub fn decide_winner(m1: i64, m2: i64) -> Outcome {
    if m1 == 3 {
        if m2 == 1 { Outcome::Player2 } else { Outcome::Player1 }
    } else if m1 > m2 {
        Outcome::Player1
    } else {
        Outcome::Player2
    }
}

/// Human-readable line announcing a move to the room.
pub fn move_announcement(req: &MoveRequest) -> String {
    format!("{}[{}] : MOVE: {}", req.wallet_address, req.game_id, req.mv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_from_wire() {
        assert_eq!(PlayerSlot::from_wire(1), PlayerSlot::One);
        assert_eq!(PlayerSlot::from_wire(2), PlayerSlot::Two);
        // Anything that is not 1 lands in slot two.
        assert_eq!(PlayerSlot::from_wire(0), PlayerSlot::Two);
        assert_eq!(PlayerSlot::from_wire(7), PlayerSlot::Two);
    }

    #[test]
    fn rock_vs_scissors_goes_to_player_2() {
        // m1 == 3 is false, 1 > 3 is false.
        assert_eq!(decide_winner(1, 3), Outcome::Player2);
        assert_eq!(decide_winner(1, 3).announcement(), "player 2 wins");
    }

    #[test]
    fn three_against_one_goes_to_player_2() {
        assert_eq!(decide_winner(3, 1).announcement(), "player 2 wins");
    }

    #[test]
    fn three_against_two_goes_to_player_1() {
        assert_eq!(decide_winner(3, 2).announcement(), "player 1 wins");
    }

    #[test]
    fn equal_moves_go_to_player_2() {
        assert_eq!(decide_winner(2, 2).announcement(), "player 2 wins");
        assert_eq!(decide_winner(1, 1), Outcome::Player2);
    }

    #[test]
    fn three_against_three_goes_to_player_1() {
        assert_eq!(decide_winner(3, 3), Outcome::Player1);
    }

    #[test]
    fn cyclic_relation_for_distinct_moves() {
        assert_eq!(decide_winner(2, 1), Outcome::Player1);
        assert_eq!(decide_winner(1, 2), Outcome::Player2);
        assert_eq!(decide_winner(2, 3), Outcome::Player2);
    }

    #[test]
    fn out_of_domain_values_are_compared_numerically() {
        assert_eq!(decide_winner(9, 2), Outcome::Player1);
        assert_eq!(decide_winner(-1, 0), Outcome::Player2);
    }

    #[test]
    fn incomplete_round_has_no_outcome() {
        let round = Round {
            game_id: "g1".into(),
            player1_move: Some(1),
            ..Round::default()
        };
        assert!(!round.is_complete());
        assert!(round.outcome().is_none());
    }

    #[test]
    fn complete_round_outcome_and_address() {
        let round = Round {
            game_id: "g1".into(),
            player1_address: Some("0xa".into()),
            player2_address: Some("0xb".into()),
            player1_move: Some(3),
            player2_move: Some(2),
            ..Round::default()
        };
        let outcome = round.outcome().unwrap();
        assert_eq!(outcome, Outcome::Player1);
        assert_eq!(round.address(outcome.slot()), Some("0xa"));
    }

    #[test]
    fn move_announcement_format() {
        let req = MoveRequest {
            wallet_address: "0xabc".into(),
            game_id: "g1".into(),
            mv: 2,
            ..MoveRequest::default()
        };
        assert_eq!(move_announcement(&req), "0xabc[g1] : MOVE: 2");
    }

    #[test]
    fn slot_display() {
        assert_eq!(PlayerSlot::Two.to_string(), "player 2");
    }
}
