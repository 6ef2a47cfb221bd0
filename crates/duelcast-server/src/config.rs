//! Server configuration.

use std::time::Duration;

use duelcast_core::AnnouncePolicy;
use duelcast_settings::{ConnectionSettings, DuelcastSettings};

/// Per-connection limits and keepalive timings.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// Outbound queue depth. A full queue gets the connection evicted.
    pub outbound_capacity: usize,
    /// Largest inbound frame accepted, in bytes.
    pub max_message_size: usize,
    /// Deadline for every write.
    pub write_wait: Duration,
    /// Read-activity deadline.
    pub pong_wait: Duration,
    /// Keepalive period; below `pong_wait`.
    pub ping_period: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::from(&ConnectionSettings::default())
    }
}

impl From<&ConnectionSettings> for ConnectionConfig {
    fn from(s: &ConnectionSettings) -> Self {
        Self {
            outbound_capacity: s.outbound_capacity,
            max_message_size: s.max_message_size,
            write_wait: s.write_wait(),
            pong_wait: s.pong_wait(),
            ping_period: s.ping_period(),
        }
    }
}

/// Configuration for the duelcast server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host to bind.
    pub host: String,
    /// Port to bind (`0` for auto-assign).
    pub port: u16,
    /// Capacity of the hub's command channel.
    pub hub_capacity: usize,
    /// Per-connection settings.
    pub connection: ConnectionConfig,
    /// Winner announcement policy.
    pub announce: AnnouncePolicy,
    /// Budget for draining tasks at shutdown.
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&DuelcastSettings::default())
    }
}

impl From<&DuelcastSettings> for ServerConfig {
    fn from(s: &DuelcastSettings) -> Self {
        Self {
            host: s.server.host.clone(),
            port: s.server.port,
            hub_capacity: s.hub.command_capacity,
            connection: ConnectionConfig::from(&s.connection),
            announce: if s.rounds.announce_once {
                AnnouncePolicy::Once
            } else {
                AnnouncePolicy::EveryMove
            },
            shutdown_timeout: Duration::from_millis(s.server.shutdown_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timings() {
        let cfg = ConnectionConfig::default();
        assert_eq!(cfg.pong_wait, Duration::from_secs(60));
        assert_eq!(cfg.ping_period, Duration::from_secs(54));
        assert_eq!(cfg.write_wait, Duration::from_secs(10));
        assert!(cfg.ping_period < cfg.pong_wait);
    }

    #[test]
    fn default_server_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.hub_capacity, 1024);
        assert_eq!(cfg.connection.outbound_capacity, 256);
        assert_eq!(cfg.announce, AnnouncePolicy::Once);
    }

    #[test]
    fn announce_every_move_when_disabled() {
        let mut settings = DuelcastSettings::default();
        settings.rounds.announce_once = false;
        assert_eq!(ServerConfig::from(&settings).announce, AnnouncePolicy::EveryMove);
    }
}
