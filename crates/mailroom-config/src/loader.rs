// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./mailroom.toml` > `~/.config/mailroom/mailroom.toml` >
//! `/etc/mailroom/mailroom.toml`, with `MAILROOM_` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::MailroomConfig;

pub(crate) const LOCAL_CONFIG: &str = "mailroom.toml";
pub(crate) const SYSTEM_CONFIG: &str = "/etc/mailroom/mailroom.toml";

/// Path of the per-user config file, if the platform has a config dir.
pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mailroom").join(LOCAL_CONFIG))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/mailroom/mailroom.toml`
/// 3. `~/.config/mailroom/mailroom.toml`
/// 4. `./mailroom.toml`
/// 5. `MAILROOM_*` environment variables
pub fn load_config() -> Result<MailroomConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string on top of the defaults (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<MailroomConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MailroomConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MailroomConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MailroomConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for hierarchical loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MailroomConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Environment provider with an explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys contain
/// underscores: `MAILROOM_RESERVATIONS_DEFAULT_TTL_SECONDS` must become
/// `reservations.default_ttl_seconds`.
fn env_provider() -> Env {
    Env::prefixed("MAILROOM_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env var name onto a dotted config key.
pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 4] = ["storage", "reservations", "messaging", "logging"];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_onto_sections_without_splitting_field_names() {
        assert_eq!(
            map_env_key("reservations_default_ttl_seconds"),
            "reservations.default_ttl_seconds"
        );
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(
            map_env_key("messaging_enforce_contact_policy"),
            "messaging.enforce_contact_policy"
        );
        assert_eq!(map_env_key("logging_level"), "logging.level");
    }

    #[test]
    fn unknown_sections_pass_through() {
        assert_eq!(map_env_key("bogus_key"), "bogus_key");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config_from_path(Path::new("/nonexistent/mailroom.toml"))
            .expect("missing file should be skipped");
        assert_eq!(config.reservations.default_ttl_seconds, 1800);
    }
}
