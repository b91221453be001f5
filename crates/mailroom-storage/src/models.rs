// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types and insert payloads.
//!
//! Persisted records are defined in `mailroom-core::types` so the engines can
//! share them; this module re-exports them next to the write-side structs.

pub use mailroom_core::types::{
    Agent, AgentLink, FileReservation, InboxEntry, Message, MessageEnvelope, MessageRecipient,
    Project,
};

use mailroom_core::{
    AgentId, ContactPolicy, Importance, ProjectId, RecipientKind, Timestamp,
};

/// Fields supplied when registering an agent.
#[derive(Debug, Clone)]
pub struct NewAgent {
    pub project_id: ProjectId,
    pub name: String,
    /// Tooling family, compared by the `auto` contact policy.
    pub program: String,
    pub model: Option<String>,
    pub contact_policy: ContactPolicy,
}

/// A message ready to persist, with its final recipient list.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub project_id: ProjectId,
    pub sender_id: AgentId,
    pub thread_id: String,
    pub subject: String,
    pub body: String,
    pub importance: Importance,
    pub ack_required: bool,
    /// Final recipients after admission, each with its delivery kind.
    pub recipients: Vec<(AgentId, RecipientKind)>,
}

/// Inbox listing options.
#[derive(Debug, Clone, Default)]
pub struct InboxQuery {
    /// Maximum number of entries, newest first.
    pub limit: Option<i64>,
    /// Skip entries the agent has already read.
    pub unread_only: bool,
    /// Only messages created strictly after this instant.
    pub since: Option<Timestamp>,
}

/// Reservation listing options.
#[derive(Debug, Clone, Copy)]
pub struct ReservationFilter {
    pub project_id: ProjectId,
    /// Only this agent's reservations.
    pub agent_id: Option<AgentId>,
    /// Drop released and expired rows.
    pub active_only: bool,
}
