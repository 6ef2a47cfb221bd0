//! SQL DDL for the round store.
//! WAL mode + busy timeout applied at connection time.

/// Current schema version written to `schema_version`.
pub const SCHEMA_VERSION: u32 = 1;

/// Tables and indexes.
pub const CREATE_TABLES: &str = r"
CREATE TABLE IF NOT EXISTS rounds (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    game_id TEXT NOT NULL UNIQUE,
    player1_address TEXT,
    player2_address TEXT,
    player1_move INTEGER,
    player2_move INTEGER,
    winner TEXT,
    announced INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_rounds_player1 ON rounds(player1_address);
CREATE INDEX IF NOT EXISTS idx_rounds_player2 ON rounds(player2_address);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);
";

/// Connection pragmas.
pub const PRAGMAS: &str = r"
PRAGMA journal_mode = WAL;
PRAGMA busy_timeout = 5000;
PRAGMA synchronous = NORMAL;
";
