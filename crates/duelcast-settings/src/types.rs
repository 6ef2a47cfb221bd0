//! Settings sections.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DuelcastSettings {
    /// HTTP listener.
    pub server: ServerSettings,
    /// Hub actor tuning.
    pub hub: HubSettings,
    /// Per-connection limits and keepalive timings.
    pub connection: ConnectionSettings,
    /// Round announcement behaviour.
    pub rounds: RoundSettings,
    /// Round store location.
    pub store: StoreSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

impl DuelcastSettings {
    /// Reject combinations that would break liveness or fan-out.
    pub fn validate(&self) -> Result<()> {
        let c = &self.connection;
        if c.ping_period_ms >= c.pong_wait_ms {
            return Err(SettingsError::InvalidValue(format!(
                "connection.pingPeriodMs ({}) must be below connection.pongWaitMs ({})",
                c.ping_period_ms, c.pong_wait_ms
            )));
        }
        if c.ping_period_ms == 0 || c.write_wait_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "connection timings must be nonzero".into(),
            ));
        }
        if c.outbound_capacity == 0 || self.hub.command_capacity == 0 {
            return Err(SettingsError::InvalidValue("queue capacities must be nonzero".into()));
        }
        if c.max_message_size == 0 {
            return Err(SettingsError::InvalidValue(
                "connection.maxMessageSize must be nonzero".into(),
            ));
        }
        Ok(())
    }
}

/// HTTP listener settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port (`0` picks a free port).
    pub port: u16,
    /// Graceful shutdown budget in milliseconds.
    pub shutdown_timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_ms: 10_000,
        }
    }
}

/// Hub actor settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HubSettings {
    /// Capacity of the admit/unregister/broadcast command channel.
    pub command_capacity: usize,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self { command_capacity: 1024 }
    }
}

/// Per-connection limits.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionSettings {
    /// Outbound queue depth; a full queue gets the connection evicted.
    pub outbound_capacity: usize,
    /// Largest inbound frame accepted, in bytes.
    pub max_message_size: usize,
    /// Deadline for any single write, in milliseconds.
    pub write_wait_ms: u64,
    /// Read-activity deadline, in milliseconds.
    pub pong_wait_ms: u64,
    /// Keepalive ping period, in milliseconds. Must be below `pong_wait_ms`.
    pub ping_period_ms: u64,
}

impl ConnectionSettings {
    /// `write_wait_ms` as a duration.
    pub fn write_wait(&self) -> Duration {
        Duration::from_millis(self.write_wait_ms)
    }

    /// `pong_wait_ms` as a duration.
    pub fn pong_wait(&self) -> Duration {
        Duration::from_millis(self.pong_wait_ms)
    }

    /// `ping_period_ms` as a duration.
    pub fn ping_period(&self) -> Duration {
        Duration::from_millis(self.ping_period_ms)
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            outbound_capacity: 256,
            max_message_size: 512,
            write_wait_ms: 10_000,
            pong_wait_ms: 60_000,
            ping_period_ms: 54_000,
        }
    }
}

/// Round announcement settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoundSettings {
    /// Announce each round's winner once instead of on every later move.
    pub announce_once: bool,
}

impl Default for RoundSettings {
    fn default() -> Self {
        Self { announce_once: true }
    }
}

/// Round store settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    /// SQLite database file.
    pub db_path: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            db_path: crate::loader::duelcast_dir().join("duelcast.db"),
        }
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable lines.
    Pretty,
}

/// Logging settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default level; `RUST_LOG` wins when set.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Per-module levels, e.g. `{"duelcast_server::hub": "debug"}`.
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
            modules: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        DuelcastSettings::default().validate().unwrap();
    }

    #[test]
    fn default_ping_period_is_nine_tenths_of_pong_wait() {
        let c = ConnectionSettings::default();
        assert_eq!(c.ping_period_ms, c.pong_wait_ms * 9 / 10);
        assert_eq!(c.max_message_size, 512);
        assert_eq!(c.write_wait(), Duration::from_secs(10));
    }

    #[test]
    fn ping_period_must_be_below_pong_wait() {
        let mut s = DuelcastSettings::default();
        s.connection.ping_period_ms = s.connection.pong_wait_ms;
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("pingPeriodMs"));
    }

    #[test]
    fn zero_capacity_rejected() {
        let mut s = DuelcastSettings::default();
        s.connection.outbound_capacity = 0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn camel_case_serialization() {
        let json = serde_json::to_value(DuelcastSettings::default()).unwrap();
        assert_eq!(json["connection"]["outboundCapacity"], 256);
        assert_eq!(json["rounds"]["announceOnce"], true);
        assert_eq!(json["logging"]["format"], "json");
    }

    #[test]
    fn partial_document_fills_defaults() {
        let s: DuelcastSettings =
            serde_json::from_str(r#"{"server":{"port":9000}}"#).unwrap();
        assert_eq!(s.server.port, 9000);
        assert_eq!(s.server.host, "0.0.0.0");
        assert_eq!(s.connection.pong_wait_ms, 60_000);
    }
}
