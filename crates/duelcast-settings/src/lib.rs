//! # duelcast-settings
//!
//! Configuration with layered sources.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`DuelcastSettings::default()`]
//! 2. **User file**: `~/.duelcast/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `DUELCAST_*` overrides (highest priority)
//!
//! The binary applies command-line flags on top of the result.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{apply_overrides, deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
