//! # duelcast
//!
//! Server binary: loads settings, opens the round store, and serves the
//! realtime move relay. Also seeds and lists rounds for local play.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use duelcast_core::Repository;
use duelcast_server::{DuelcastServer, ServerConfig};
use duelcast_settings::DuelcastSettings;
use duelcast_store::{Database, RoundRepo};
use duelcast_telemetry::{TelemetryConfig, init_telemetry};

/// Realtime move relay for two-player duels.
#[derive(Parser, Debug)]
#[command(name = "duelcast", version, about = "Realtime move relay for two-player duels")]
struct Cli {
    /// Settings file (defaults to `~/.duelcast/settings.json`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Host to bind (overrides settings).
    #[arg(long, global = true)]
    host: Option<String>,

    /// Port to bind, `0` for auto-assign (overrides settings).
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Path to the `SQLite` round store (overrides settings).
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve WebSocket connections (default).
    Serve,
    /// Seat two players in a new round.
    CreateRound {
        /// Round identifier.
        #[arg(long)]
        game_id: String,
        /// Wallet address of player 1.
        #[arg(long)]
        player1: String,
        /// Wallet address of player 2.
        #[arg(long)]
        player2: String,
    },
    /// Print every round as JSON.
    Rounds,
}

impl Cli {
    fn settings(&self) -> Result<DuelcastSettings> {
        let path = self
            .config
            .clone()
            .unwrap_or_else(duelcast_settings::settings_path);
        let mut settings = duelcast_settings::load_settings_from_path(&path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?;
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(db_path) = &self.db_path {
            settings.store.db_path.clone_from(db_path);
        }
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings()?;
    init_telemetry(&TelemetryConfig::from(&settings.logging));

    let db = Database::open(&settings.store.db_path).with_context(|| {
        format!(
            "failed to open round store at {}",
            settings.store.db_path.display()
        )
    })?;
    tracing::info!(path = %db.path().display(), "round store opened");
    let rounds = RoundRepo::new(db);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&settings, rounds).await,
        Command::CreateRound {
            game_id,
            player1,
            player2,
        } => {
            let round = rounds
                .create_round(&game_id, &player1, &player2)
                .with_context(|| format!("failed to create round {game_id}"))?;
            println!("{}", serde_json::to_string_pretty(&round)?);
            Ok(())
        }
        Command::Rounds => {
            println!("{}", serde_json::to_string_pretty(&rounds.list()?)?);
            Ok(())
        }
    }
}

async fn serve(settings: &DuelcastSettings, rounds: RoundRepo) -> Result<()> {
    let config = ServerConfig::from(settings);
    let repo: Arc<dyn Repository> = Arc::new(rounds);
    let handle = DuelcastServer::new(config, repo)
        .start()
        .await
        .context("failed to start server")?;
    tracing::info!(addr = %handle.addr(), "duelcast ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    tracing::info!("shutting down");
    handle.shutdown().await;
    Ok(())
}
