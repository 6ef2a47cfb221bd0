//! # duelcast-server
//!
//! The realtime side of duelcast: an Axum server that upgrades `/ws`
//! requests, admits round participants through a single hub task, records
//! their moves, and fans announcements out to every admitted connection.
//!
//! - [`hub`]: connection registry and non-blocking fan-out
//! - [`websocket`]: per-connection inbound and outbound pumps
//! - [`server`]: router, startup, and graceful shutdown

#![deny(unsafe_code)]

pub mod blocking;
pub mod config;
pub mod health;
pub mod hub;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use config::{ConnectionConfig, ServerConfig};
pub use hub::{Hub, HubHandle};
pub use server::{DuelcastServer, ServerHandle};
