//! End-to-end tests using a real WebSocket client.

use std::sync::Arc;
use std::time::Duration;

use duelcast_core::Repository;
use duelcast_server::{DuelcastServer, ServerConfig, ServerHandle};
use duelcast_store::{Database, RoundRepo};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

const TIMEOUT: Duration = Duration::from_secs(5);

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Boot a server with round `g1` between `0xalice` and `0xbob`.
async fn boot_server() -> (ServerHandle, RoundRepo) {
    let repo = RoundRepo::new(Database::in_memory().unwrap());
    let _ = repo.create_round("g1", "0xalice", "0xbob").unwrap();
    let shared: Arc<dyn Repository> = Arc::new(repo.clone());

    let config = ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        shutdown_timeout: Duration::from_secs(2),
        ..ServerConfig::default()
    };
    let handle = DuelcastServer::new(config, shared).start().await.unwrap();
    (handle, repo)
}

async fn connect(server: &ServerHandle, wallet: Option<&str>) -> WsStream {
    let url = match wallet {
        Some(w) => format!("ws://{}/ws?wallet_address={w}", server.addr()),
        None => format!("ws://{}/ws", server.addr()),
    };
    let (ws, _) = connect_async(url).await.unwrap();
    ws
}

async fn wait_for_connections(server: &ServerHandle, expected: usize) {
    timeout(TIMEOUT, async {
        while server.hub().connection_count().await != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("connection count never reached");
}

/// Read text frames until `n` announcement lines have arrived.
async fn read_lines(ws: &mut WsStream, n: usize) -> Vec<String> {
    let mut lines = Vec::new();
    while lines.len() < n {
        let msg = timeout(TIMEOUT, ws.next())
            .await
            .expect("timeout waiting for message")
            .expect("stream closed")
            .expect("ws error");
        if let Message::Text(text) = msg {
            lines.extend(text.as_str().split('\n').map(str::to_owned));
        }
    }
    lines
}

/// Whether the server closes the socket without sending any text.
async fn closed_without_text(ws: &mut WsStream) -> bool {
    loop {
        match timeout(TIMEOUT, ws.next()).await {
            Err(_) => return false,
            Ok(None | Some(Err(_) | Ok(Message::Close(_)))) => return true,
            Ok(Some(Ok(Message::Text(_)))) => return false,
            Ok(Some(Ok(_))) => {}
        }
    }
}

fn move_frame(wallet: &str, player: u8, mv: u8) -> Message {
    Message::text(
        json!({
            "wallet_address": wallet,
            "game_id": "g1",
            "transaction_hash": "0xfeed",
            "player_number": player,
            "move": mv,
        })
        .to_string(),
    )
}

#[tokio::test]
async fn e2e_round_is_announced_to_both_players() {
    let (server, repo) = boot_server().await;
    let mut alice = connect(&server, Some("0xalice")).await;
    let mut bob = connect(&server, Some("0xbob")).await;
    wait_for_connections(&server, 2).await;

    alice.send(move_frame("0xalice", 1, 3)).await.unwrap();
    assert_eq!(read_lines(&mut bob, 1).await, vec!["0xalice[g1] : MOVE: 3"]);

    bob.send(move_frame("0xbob", 2, 1)).await.unwrap();
    let expected = vec![
        "0xalice[g1] : MOVE: 3",
        "0xbob[g1] : MOVE: 1",
        "player 2 wins",
    ];
    assert_eq!(read_lines(&mut alice, 3).await, expected);
    assert_eq!(read_lines(&mut bob, 2).await, expected[1..]);

    let round = repo.get("g1").unwrap();
    assert_eq!(round.winner.as_deref(), Some("0xbob"));
    assert!(round.announced);

    server.shutdown().await;
}

#[tokio::test]
async fn e2e_winner_is_not_repeated() {
    let (server, _repo) = boot_server().await;
    let mut alice = connect(&server, Some("0xalice")).await;
    wait_for_connections(&server, 1).await;

    alice.send(move_frame("0xalice", 1, 2)).await.unwrap();
    alice.send(move_frame("0xbob", 2, 1)).await.unwrap();
    alice.send(move_frame("0xbob", 2, 1)).await.unwrap();
    alice.send(move_frame("0xalice", 1, 2)).await.unwrap();

    let lines = read_lines(&mut alice, 5).await;
    assert_eq!(lines.iter().filter(|l| *l == "player 1 wins").count(), 1);
    assert_eq!(lines.last().map(String::as_str), Some("0xalice[g1] : MOVE: 2"));

    server.shutdown().await;
}

#[tokio::test]
async fn e2e_stranger_is_disconnected() {
    let (server, _repo) = boot_server().await;
    let mut alice = connect(&server, Some("0xalice")).await;
    wait_for_connections(&server, 1).await;

    let mut stranger = connect(&server, Some("0xmallory")).await;
    assert!(closed_without_text(&mut stranger).await);

    alice.send(move_frame("0xalice", 1, 1)).await.unwrap();
    assert_eq!(read_lines(&mut alice, 1).await, vec!["0xalice[g1] : MOVE: 1"]);
    assert_eq!(server.hub().connection_count().await, 1);

    server.shutdown().await;
}

#[tokio::test]
async fn e2e_stranger_move_sent_before_verdict_is_ignored() {
    let (server, repo) = boot_server().await;
    let mut alice = connect(&server, Some("0xalice")).await;
    wait_for_connections(&server, 1).await;

    let mut stranger = connect(&server, Some("0xmallory")).await;
    let _ = stranger.send(move_frame("0xmallory", 2, 1)).await;
    assert!(closed_without_text(&mut stranger).await);

    alice.send(move_frame("0xalice", 1, 3)).await.unwrap();
    assert_eq!(read_lines(&mut alice, 1).await, vec!["0xalice[g1] : MOVE: 3"]);

    let round = repo.get("g1").unwrap();
    assert_eq!(round.player2_move, None);
    assert_eq!(round.player1_move, Some(3));
    assert_eq!(server.hub().connection_count().await, 1);

    server.shutdown().await;
}

#[tokio::test]
async fn e2e_missing_identity_is_disconnected() {
    let (server, _repo) = boot_server().await;
    let mut anonymous = connect(&server, None).await;
    assert!(closed_without_text(&mut anonymous).await);
    assert_eq!(server.hub().connection_count().await, 0);
    server.shutdown().await;
}

#[tokio::test]
async fn e2e_malformed_frame_closes_only_sender() {
    let (server, _repo) = boot_server().await;
    let mut alice = connect(&server, Some("0xalice")).await;
    let mut bob = connect(&server, Some("0xbob")).await;
    wait_for_connections(&server, 2).await;

    alice.send(Message::text("{not json")).await.unwrap();
    assert!(closed_without_text(&mut alice).await);
    wait_for_connections(&server, 1).await;

    bob.send(move_frame("0xbob", 2, 2)).await.unwrap();
    assert_eq!(read_lines(&mut bob, 1).await, vec!["0xbob[g1] : MOVE: 2"]);

    server.shutdown().await;
}

#[tokio::test]
async fn e2e_unknown_game_closes_sender() {
    let (server, _repo) = boot_server().await;
    let mut bob = connect(&server, Some("0xbob")).await;
    wait_for_connections(&server, 1).await;

    let frame = json!({"wallet_address": "0xbob", "game_id": "missing", "player_number": 2, "move": 1});
    bob.send(Message::text(frame.to_string())).await.unwrap();
    assert!(closed_without_text(&mut bob).await);
    wait_for_connections(&server, 0).await;

    server.shutdown().await;
}

#[tokio::test]
async fn e2e_shutdown_closes_clients() {
    let (server, _repo) = boot_server().await;
    let mut alice = connect(&server, Some("0xalice")).await;
    wait_for_connections(&server, 1).await;

    server.shutdown().await;
    assert!(closed_without_text(&mut alice).await);
}

#[tokio::test]
async fn e2e_health_counts_connections() {
    let (server, _repo) = boot_server().await;
    let _alice = connect(&server, Some("0xalice")).await;
    wait_for_connections(&server, 1).await;

    let mut stream = tokio::net::TcpStream::connect(server.addr()).await.unwrap();
    let request = format!(
        "GET /health HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        server.addr()
    );
    tokio::io::AsyncWriteExt::write_all(&mut stream, request.as_bytes())
        .await
        .unwrap();
    let mut response = String::new();
    let _ = tokio::io::AsyncReadExt::read_to_string(&mut stream, &mut response)
        .await
        .unwrap();

    assert!(response.starts_with("HTTP/1.1 200"));
    let body = response.split("\r\n\r\n").nth(1).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["connections"], 1);

    server.shutdown().await;
}
