//! # duelcast-telemetry
//!
//! Installs the global `tracing` subscriber: an [`EnvFilter`] built from
//! settings (`RUST_LOG` wins when set) feeding either a JSON or a
//! human-readable `fmt` layer.

#![deny(unsafe_code)]

use std::str::FromStr;

use duelcast_settings::{LogFormat, LoggingSettings};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for the telemetry subsystem.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Default log level. Overridden by `RUST_LOG`.
    pub log_level: Level,
    /// Per-module level overrides (e.g. `"duelcast_server::hub"` => DEBUG).
    pub module_levels: Vec<(String, Level)>,
    /// Output format.
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            module_levels: Vec::new(),
            format: LogFormat::Json,
        }
    }
}

impl From<&LoggingSettings> for TelemetryConfig {
    fn from(settings: &LoggingSettings) -> Self {
        let log_level = Level::from_str(&settings.level).unwrap_or_else(|_| {
            eprintln!(
                "duelcast-telemetry: unknown log level {:?}, using info",
                settings.level
            );
            Level::INFO
        });
        let module_levels = settings
            .modules
            .iter()
            .filter_map(|(module, level)| match Level::from_str(level) {
                Ok(level) => Some((module.clone(), level)),
                Err(_) => {
                    eprintln!("duelcast-telemetry: unknown level {level:?} for {module}, skipped");
                    None
                }
            })
            .collect();
        Self {
            log_level,
            module_levels,
            format: settings.format,
        }
    }
}

/// Filter directive string for `config`, e.g. `info,duelcast_server=debug`.
pub fn filter_directives(config: &TelemetryConfig) -> String {
    let mut filter = config.log_level.to_string().to_lowercase();
    for (module, level) in &config.module_levels {
        filter.push(',');
        filter.push_str(module);
        filter.push('=');
        filter.push_str(&level.to_string().to_lowercase());
    }
    filter
}

/// Initialize the global subscriber. Call once at startup.
///
/// A second call (or a subscriber installed elsewhere) is reported on
/// stderr and otherwise ignored.
pub fn init_telemetry(config: &TelemetryConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config)));

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_list(true)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().with_target(true).boxed(),
    };

    if let Err(e) = tracing_subscriber::registry()
        .with(fmt_layer.with_filter(env_filter))
        .try_init()
    {
        eprintln!("duelcast-telemetry: subscriber already installed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_info() {
        assert_eq!(filter_directives(&TelemetryConfig::default()), "info");
    }

    #[test]
    fn module_levels_are_appended() {
        let config = TelemetryConfig {
            log_level: Level::WARN,
            module_levels: vec![("duelcast_server".into(), Level::DEBUG)],
            format: LogFormat::Pretty,
        };
        assert_eq!(filter_directives(&config), "warn,duelcast_server=debug");
    }

    #[test]
    fn from_logging_settings() {
        let settings = LoggingSettings {
            level: "debug".into(),
            format: LogFormat::Pretty,
            ..LoggingSettings::default()
        };
        let config = TelemetryConfig::from(&settings);
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.module_levels.is_empty());
    }

    #[test]
    fn module_levels_come_from_settings() {
        let settings = LoggingSettings {
            level: "warn".into(),
            modules: [
                ("duelcast_server::hub".to_owned(), "trace".to_owned()),
                ("duelcast_store".to_owned(), "debug".to_owned()),
                ("noisy".to_owned(), "shouty".to_owned()),
            ]
            .into_iter()
            .collect(),
            ..LoggingSettings::default()
        };
        let config = TelemetryConfig::from(&settings);
        assert_eq!(
            filter_directives(&config),
            "warn,duelcast_server::hub=trace,duelcast_store=debug"
        );
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        let settings = LoggingSettings {
            level: "loud".into(),
            format: LogFormat::Json,
            ..LoggingSettings::default()
        };
        assert_eq!(TelemetryConfig::from(&settings).log_level, Level::INFO);
    }

    #[test]
    fn double_init_does_not_panic() {
        let config = TelemetryConfig::default();
        init_telemetry(&config);
        init_telemetry(&config);
    }
}
