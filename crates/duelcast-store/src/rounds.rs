use chrono::Utc;
use rusqlite::{OptionalExtension, Row, params};
use tracing::{debug, instrument};

use duelcast_core::{PlayerSlot, Repository, Round, StorageError};

use crate::database::Database;
use crate::error::StoreError;

const ROUND_COLUMNS: &str =
    "game_id, player1_address, player2_address, player1_move, player2_move, winner, announced";

/// Round table access.
#[derive(Clone)]
pub struct RoundRepo {
    db: Database,
}

impl RoundRepo {
    /// Wrap an open database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Seat two players in a new round.
    #[instrument(skip(self))]
    pub fn create_round(
        &self,
        game_id: &str,
        player1_address: &str,
        player2_address: &str,
    ) -> Result<Round, StoreError> {
        self.db.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO rounds (game_id, player1_address, player2_address, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![game_id, player1_address, player2_address, Utc::now().to_rfc3339()],
            )?;
            if inserted == 0 {
                return Err(StoreError::Conflict(format!("round {game_id} already exists")));
            }
            Ok(Round {
                game_id: game_id.to_string(),
                player1_address: Some(player1_address.to_string()),
                player2_address: Some(player2_address.to_string()),
                ..Round::default()
            })
        })
    }

    /// Fetch a round by game id.
    #[instrument(skip(self))]
    pub fn get(&self, game_id: &str) -> Result<Round, StoreError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {ROUND_COLUMNS} FROM rounds WHERE game_id = ?1"),
                [game_id],
                row_to_round,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("round {game_id}")))
        })
    }

    /// All rounds, newest first.
    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<Round>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {ROUND_COLUMNS} FROM rounds ORDER BY id DESC"))?;
            let rows = stmt
                .query_map([], row_to_round)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn set_move(&self, game_id: &str, slot: PlayerSlot, mv: i64) -> Result<(), StoreError> {
        let sql = match slot {
            PlayerSlot::One => "UPDATE rounds SET player1_move = ?2 WHERE game_id = ?1",
            PlayerSlot::Two => "UPDATE rounds SET player2_move = ?2 WHERE game_id = ?1",
        };
        self.db.with_conn(|conn| {
            let changed = conn.execute(sql, params![game_id, mv])?;
            if changed == 0 {
                return Err(StoreError::NotFound(format!("round {game_id}")));
            }
            debug!(game_id, slot = slot.number(), mv, "move recorded");
            Ok(())
        })
    }

    fn completed(&self, game_id: &str) -> Result<Option<Round>, StoreError> {
        self.db.with_conn(|conn| {
            Ok(conn
                .query_row(
                    &format!(
                        "SELECT {ROUND_COLUMNS} FROM rounds
                         WHERE game_id = ?1
                           AND player1_move IS NOT NULL
                           AND player2_move IS NOT NULL"
                    ),
                    [game_id],
                    row_to_round,
                )
                .optional()?)
        })
    }

    fn seated(&self, identity: &str) -> Result<bool, StoreError> {
        self.db.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM rounds WHERE player1_address = ?1 OR player2_address = ?1
                 )",
                [identity],
                |row| row.get(0),
            )?)
        })
    }

    fn claim(&self, game_id: &str, winner: Option<&str>) -> Result<bool, StoreError> {
        self.db.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE rounds SET announced = 1, winner = ?2
                 WHERE game_id = ?1 AND announced = 0",
                params![game_id, winner],
            )?;
            Ok(changed == 1)
        })
    }
}

impl Repository for RoundRepo {
    fn update_move(&self, game_id: &str, slot: PlayerSlot, mv: i64) -> Result<(), StorageError> {
        Ok(self.set_move(game_id, slot, mv)?)
    }

    fn find_completed_round(&self, game_id: &str) -> Result<Option<Round>, StorageError> {
        Ok(self.completed(game_id)?)
    }

    fn is_participant(&self, identity: &str) -> Result<bool, StorageError> {
        Ok(self.seated(identity)?)
    }

    fn claim_announcement(&self, game_id: &str, winner: Option<&str>) -> Result<bool, StorageError> {
        Ok(self.claim(game_id, winner)?)
    }
}

fn row_to_round(row: &Row<'_>) -> rusqlite::Result<Round> {
    Ok(Round {
        game_id: row.get(0)?,
        player1_address: row.get(1)?,
        player2_address: row.get(2)?,
        player1_move: row.get(3)?,
        player2_move: row.get(4)?,
        winner: row.get(5)?,
        announced: row.get(6)?,
    })
}
