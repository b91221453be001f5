// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for mailroom.
//!
//! Holds the error type, the domain records (agents, links, file
//! reservations, messages), and the adapter traits for the collaborators the
//! coordination engines consume: the relational backend and the
//! pattern-matching primitive.

pub mod error;
pub mod traits;
pub mod types;

pub use error::MailroomError;
pub use types::{
    AdapterType, AdmissionDecision, AdmissionReason, Agent, AgentId, AgentLink, BlockedRecipient,
    ContactPolicy, FileReservation, HealthStatus, Importance, InboxEntry, LinkId, LinkStatus,
    Message, MessageEnvelope, MessageId, MessageRecipient, Project, ProjectId, RecipientKind,
    ReservationConflict, ReservationId, Timestamp,
};

pub use traits::{PathMatcher, PluginAdapter, StorageAdapter};
