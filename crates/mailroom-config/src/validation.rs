// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checks that run after a config deserializes: TTL ordering, and the
//! string fields that must name an importance or a log level.

use mailroom_core::Importance;

use crate::diagnostic::ConfigError;
use crate::model::{MailroomConfig, TTL_CEILING_SECONDS};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &MailroomConfig) -> Result<(), Vec<ConfigError>> {
    let MailroomConfig {
        storage,
        reservations,
        messaging,
        logging,
    } = config;

    let problems = [
        storage
            .database_path
            .trim()
            .is_empty()
            .then(|| "storage.database_path must not be empty".to_string()),
        (reservations.default_ttl_seconds == 0)
            .then(|| "reservations.default_ttl_seconds must be greater than zero".to_string()),
        (reservations.default_ttl_seconds < reservations.min_ttl_seconds).then(|| {
            format!(
                "reservations.default_ttl_seconds ({}) is below reservations.min_ttl_seconds ({})",
                reservations.default_ttl_seconds, reservations.min_ttl_seconds
            )
        }),
        (reservations.max_ttl_seconds > TTL_CEILING_SECONDS).then(|| {
            format!(
                "reservations.max_ttl_seconds ({}) exceeds the ceiling of {TTL_CEILING_SECONDS}",
                reservations.max_ttl_seconds
            )
        }),
        (reservations.default_ttl_seconds > reservations.max_ttl_seconds).then(|| {
            format!(
                "reservations.default_ttl_seconds ({}) is above reservations.max_ttl_seconds ({})",
                reservations.default_ttl_seconds, reservations.max_ttl_seconds
            )
        }),
        (reservations.min_ttl_seconds > reservations.max_ttl_seconds).then(|| {
            format!(
                "reservations.min_ttl_seconds ({}) is above reservations.max_ttl_seconds ({})",
                reservations.min_ttl_seconds, reservations.max_ttl_seconds
            )
        }),
        messaging
            .default_importance
            .parse::<Importance>()
            .is_err()
            .then(|| {
                format!(
                    "messaging.default_importance `{}` must be one of low, normal, high, urgent",
                    messaging.default_importance
                )
            }),
        (!LOG_LEVELS.contains(&logging.level.to_ascii_lowercase().as_str())).then(|| {
            format!(
                "logging.level `{}` must be one of {}",
                logging.level,
                LOG_LEVELS.join(", ")
            )
        }),
    ];

    let errors: Vec<ConfigError> = problems
        .into_iter()
        .flatten()
        .map(|message| ConfigError::Validation { message })
        .collect();

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
