// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain records and enums shared by the storage layer and the engines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// UTC instant used for every stored timestamp.
pub type Timestamp = DateTime<Utc>;

/// Row ids, assigned by SQLite.
pub type ProjectId = i64;
pub type AgentId = i64;
pub type LinkId = i64;
pub type ReservationId = i64;
pub type MessageId = i64;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter behind a [`crate::PluginAdapter`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    /// SQLite persistence.
    Storage,
    /// Path pattern matching.
    Matcher,
}

/// How an agent treats messages from senders it has no approved link with.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContactPolicy {
    /// Anyone may send.
    Open,
    /// Senders running the same program are admitted; others need approval.
    #[default]
    Auto,
    /// Only approved contacts may send.
    ContactsOnly,
    /// Nobody may send.
    BlockAll,
}

/// State of an [`AgentLink`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    /// Awaiting the responder's approval.
    Pending,
    /// Either side may message the other.
    Approved,
    /// Admission refuses every send over this link.
    Blocked,
}

/// Delivery kind of a message recipient.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RecipientKind {
    /// Primary recipient.
    To,
    /// Copied recipient.
    Cc,
    /// Blind-copied recipient.
    Bcc,
}

/// Message importance, inherited by replies.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

/// Why an admission decision came out the way it did.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AdmissionReason {
    /// Recipient policy is `open`.
    Open,
    /// An approved link exists.
    ApprovedContact,
    /// Same program under an `auto` policy.
    AutoApproved,
    /// A link awaits approval.
    Pending,
    /// No approved link under `auto` or `contacts_only`.
    ContactsOnly,
    /// Recipient policy is `block_all`.
    BlockAll,
    /// A blocked link, or an unknown recipient.
    Blocked,
}

/// Result of asking whether one agent may message another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionDecision {
    /// Whether the message may be delivered.
    pub allowed: bool,
    pub reason: AdmissionReason,
}

impl AdmissionDecision {
    /// An allowing decision.
    pub fn allow(reason: AdmissionReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    /// A refusing decision.
    pub fn deny(reason: AdmissionReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

/// A project groups agents and the file reservations they hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    /// Short unique key, e.g. `backend`.
    pub slug: String,
    /// Human-facing key, typically the absolute path of the working tree.
    pub human_key: String,
    pub created_ts: Timestamp,
}

/// A registered agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub project_id: ProjectId,
    /// Unique within the project.
    pub name: String,
    /// Tool the agent runs under (e.g. `claude-code`, `codex`).
    pub program: String,
    /// Model name, when the agent reports one.
    pub model: Option<String>,
    /// Admission policy for senders without an approved link.
    pub contact_policy: ContactPolicy,
    pub created_ts: Timestamp,
}

/// Directed contact-approval record between two agents.
///
/// At most one link exists per unordered pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentLink {
    pub id: LinkId,
    /// Agent that asked for contact.
    pub requester_id: AgentId,
    /// Agent whose policy decided the initial status.
    pub responder_id: AgentId,
    pub status: LinkStatus,
    pub created_ts: Timestamp,
    /// Time of the last status change.
    pub updated_ts: Timestamp,
}

impl AgentLink {
    /// Whether this link connects `a` and `b`, in either direction.
    pub fn connects(&self, a: AgentId, b: AgentId) -> bool {
        (self.requester_id == a && self.responder_id == b)
            || (self.requester_id == b && self.responder_id == a)
    }
}

/// A time-bounded, optionally exclusive claim on a path pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReservation {
    pub id: ReservationId,
    pub project_id: ProjectId,
    /// Holding agent.
    pub agent_id: AgentId,
    /// Project-relative glob, e.g. `src/**/*.rs`.
    pub path_pattern: String,
    /// Exclusive reservations block and are blocked; shared ones never are.
    pub exclusive: bool,
    /// Why the agent reserved it.
    pub reason: Option<String>,
    pub created_ts: Timestamp,
    /// The reservation lapses at this instant unless renewed.
    pub expires_ts: Timestamp,
    /// Set once by release, force-release or the expiry sweep.
    pub released_ts: Option<Timestamp>,
}

impl FileReservation {
    /// Active means not released and not yet expired at `now`.
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        self.released_ts.is_none() && self.expires_ts > now
    }
}

/// One exclusive reservation standing in the way of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationConflict {
    /// The requested pattern (or concrete path) that collided.
    pub pattern: String,
    pub holder_agent_id: AgentId,
    pub holder_agent_name: Option<String>,
    /// The holder's pattern that overlaps the request.
    pub holder_pattern: String,
    pub holder_reservation_id: ReservationId,
    pub holder_expires_ts: Timestamp,
}

impl ReservationConflict {
    /// Holder name, or `agent <id>` when unknown.
    pub fn holder_display_name(&self) -> String {
        self.holder_agent_name
            .clone()
            .unwrap_or_else(|| format!("agent {}", self.holder_agent_id))
    }
}

/// A recipient dropped by contact policy, with the reason it was refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedRecipient {
    pub agent_id: AgentId,
    pub agent_name: Option<String>,
    pub reason: AdmissionReason,
}

impl BlockedRecipient {
    /// Agent name, or `agent <id>` when unknown.
    pub fn display_name(&self) -> String {
        self.agent_name
            .clone()
            .unwrap_or_else(|| format!("agent {}", self.agent_id))
    }
}

/// An immutable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub project_id: ProjectId,
    pub sender_id: AgentId,
    /// Shared by a message and its replies.
    pub thread_id: String,
    pub subject: String,
    pub body: String,
    pub importance: Importance,
    /// Recipients are asked to acknowledge.
    pub ack_required: bool,
    pub created_ts: Timestamp,
}

/// Per-recipient delivery record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecipient {
    pub message_id: MessageId,
    pub agent_id: AgentId,
    pub kind: RecipientKind,
    /// When this recipient first read the message.
    pub read_ts: Option<Timestamp>,
    /// When this recipient acknowledged the message.
    pub ack_ts: Option<Timestamp>,
}

/// A message together with its delivery records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub message: Message,
    pub recipients: Vec<MessageRecipient>,
}

/// A message as seen from one recipient's inbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboxEntry {
    pub message: Message,
    /// How this recipient was addressed.
    pub kind: RecipientKind,
    pub read_ts: Option<Timestamp>,
    pub ack_ts: Option<Timestamp>,
}
