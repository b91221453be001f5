// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sections of `mailroom.toml`.
//!
//! Every table denies unknown fields, so a misspelled key is an error
//! rather than a silently ignored line.

use mailroom_core::Importance;
use serde::{Deserialize, Serialize};

/// Root of `mailroom.toml`. Any section may be omitted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MailroomConfig {
    /// SQLite backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// File reservation (lease) settings.
    #[serde(default)]
    pub reservations: ReservationConfig,

    /// Message dispatch settings.
    #[serde(default)]
    pub messaging: MessagingConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// How long SQLite waits on a locked database before giving up.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("mailroom").join("mailroom.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("mailroom.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// File reservation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReservationConfig {
    /// TTL applied when a reserve or renew request does not name one.
    #[serde(default = "default_ttl_seconds")]
    pub default_ttl_seconds: u64,

    /// Smallest TTL a caller may request. Zero disables the floor.
    #[serde(default)]
    pub min_ttl_seconds: u64,

    /// Largest TTL a caller may request. May not exceed [`TTL_CEILING_SECONDS`].
    #[serde(default = "default_max_ttl_seconds")]
    pub max_ttl_seconds: u64,

    /// Log a warning when an agent reserves a whole-repo glob or an absolute path.
    #[serde(default = "default_warn_on_broad_patterns")]
    pub warn_on_broad_patterns: bool,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: default_ttl_seconds(),
            min_ttl_seconds: 0,
            max_ttl_seconds: default_max_ttl_seconds(),
            warn_on_broad_patterns: default_warn_on_broad_patterns(),
        }
    }
}

fn default_ttl_seconds() -> u64 {
    1800
}

/// Ten years. Keeps every expiry inside the four-digit-year timestamp format.
pub const TTL_CEILING_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

fn default_max_ttl_seconds() -> u64 {
    7 * 24 * 60 * 60
}

fn default_warn_on_broad_patterns() -> bool {
    true
}

/// Message dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MessagingConfig {
    /// Filter recipients through contact policy on every send.
    #[serde(default)]
    pub enforce_contact_policy: bool,

    /// Importance given to messages that do not specify one
    /// (`low`, `normal`, `high`, `urgent`).
    #[serde(default = "default_importance")]
    pub default_importance: String,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            enforce_contact_policy: false,
            default_importance: default_importance(),
        }
    }
}

impl MessagingConfig {
    /// Parsed `default_importance`, falling back to `normal` when unparsable.
    ///
    /// Validation rejects unparsable values, so the fallback is only reached
    /// for configs that skipped validation.
    pub fn importance(&self) -> Importance {
        self.default_importance.parse().unwrap_or_default()
    }
}

fn default_importance() -> String {
    "normal".to_string()
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
