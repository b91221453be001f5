// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the mailroom coordination engines.

use thiserror::Error;

use crate::types::{BlockedRecipient, ReservationConflict};

/// The primary error type used across every mailroom crate.
#[derive(Debug, Error)]
pub enum MailroomError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A referenced project, agent, link, reservation, or message does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// An exclusive reservation request overlaps reservations held by other agents.
    ///
    /// The whole batch is rejected; nothing was written.
    #[error("{}", describe_conflicts(conflicts))]
    ReservationConflict { conflicts: Vec<ReservationConflict> },

    /// Contact policy admitted none of the requested recipients.
    #[error("{}", describe_blocked(blocked))]
    PolicyDenied { blocked: Vec<BlockedRecipient> },

    /// Caller supplied an argument the engines refuse to act on.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MailroomError {
    /// Shorthand for a [`MailroomError::NotFound`] keyed by any displayable id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

fn describe_conflicts(conflicts: &[ReservationConflict]) -> String {
    let details = conflicts
        .iter()
        .map(|c| {
            format!(
                "`{}` overlaps `{}` held by {} (reservation {})",
                c.pattern,
                c.holder_pattern,
                c.holder_display_name(),
                c.holder_reservation_id
            )
        })
        .collect::<Vec<_>>()
        .join("; ");
    format!("file reservation conflict: {details}")
}

fn describe_blocked(blocked: &[BlockedRecipient]) -> String {
    let details = blocked
        .iter()
        .map(|b| format!("{} ({})", b.display_name(), b.reason))
        .collect::<Vec<_>>()
        .join(", ");
    format!("all recipients blocked by contact policy: {details}")
}
