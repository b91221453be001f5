// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message Dispatcher: recipient filtering and single-flight message writes.
//!
//! Holds no policy of its own. When enforcement is on it asks the
//! [`AdmissionEngine`] once per recipient and persists only to the admitted
//! ones. Every mutation runs under the [`lock::MESSAGES`] lock.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use mailroom_core::{
    AgentId, BlockedRecipient, Importance, InboxEntry, MailroomError, Message, MessageEnvelope,
    MessageId, RecipientKind,
};
use mailroom_storage::queries::{agents, messages};
use mailroom_storage::{Database, InboxQuery, NewMessage};

use crate::admission::AdmissionEngine;
use crate::lock::{self, NamedLocks};

/// A message to send.
#[derive(Debug, Clone, Default)]
pub struct SendMessageInput {
    /// Sending agent.
    pub sender_id: AgentId,
    /// Primary recipients.
    pub to: Vec<AgentId>,
    /// Copied recipients.
    pub cc: Vec<AgentId>,
    /// Blind-copied recipients.
    pub bcc: Vec<AgentId>,
    pub subject: String,
    pub body: String,
    /// Falls back to `[messaging].default_importance`.
    pub importance: Option<Importance>,
    /// Ask recipients to acknowledge.
    pub ack_required: bool,
    /// Continue an existing thread; a fresh id is minted otherwise.
    pub thread_id: Option<String>,
}

impl SendMessageInput {
    /// Requested recipients in to, cc, bcc order; the first kind seen for an
    /// agent wins.
    fn recipients(&self) -> Vec<(AgentId, RecipientKind)> {
        let mut seen = HashSet::new();
        let kinds = [
            (&self.to, RecipientKind::To),
            (&self.cc, RecipientKind::Cc),
            (&self.bcc, RecipientKind::Bcc),
        ];
        let mut out = Vec::new();
        for (ids, kind) in kinds {
            for &id in ids {
                if seen.insert(id) {
                    out.push((id, kind));
                }
            }
        }
        out
    }
}

/// Result of [`MessageDispatcher::send_message_with_policy_check`].
#[derive(Debug, Clone, Serialize)]
pub struct SendOutcome {
    /// The persisted message, or `None` when every recipient was refused.
    pub message: Option<MessageEnvelope>,
    /// Recipients dropped by contact policy, with reasons.
    pub blocked_recipients: Vec<BlockedRecipient>,
    /// Whether the message reached at least one recipient.
    pub sent: bool,
}

/// Sends, replies to, and tracks delivery of messages.
#[derive(Clone)]
pub struct MessageDispatcher {
    db: Database,
    admission: AdmissionEngine,
    locks: NamedLocks,
    default_importance: Importance,
}

impl MessageDispatcher {
    /// Dispatcher that admits recipients through `admission`. Messages without an
    /// explicit importance get `default_importance`.
    pub fn new(
        db: Database,
        admission: AdmissionEngine,
        locks: NamedLocks,
        default_importance: Importance,
    ) -> Self {
        Self {
            db,
            admission,
            locks,
            default_importance,
        }
    }

    /// Split recipients into admitted and blocked. Without enforcement every
    /// recipient must exist and all are admitted.
    async fn admit(
        &self,
        sender_id: AgentId,
        recipients: Vec<(AgentId, RecipientKind)>,
        enforce: bool,
    ) -> Result<(Vec<(AgentId, RecipientKind)>, Vec<BlockedRecipient>), MailroomError> {
        let ids: Vec<AgentId> = recipients.iter().map(|(id, _)| *id).collect();
        let names = agents::agent_names(&self.db, &ids).await?;

        if !enforce {
            if let Some(missing) = ids.iter().find(|id| !names.contains_key(*id)) {
                return Err(MailroomError::not_found("agent", missing));
            }
            return Ok((recipients, Vec::new()));
        }

        let mut allowed = Vec::with_capacity(recipients.len());
        let mut blocked = Vec::new();
        for (id, kind) in recipients {
            let decision = self.admission.can_send(sender_id, id).await?;
            if decision.allowed {
                allowed.push((id, kind));
            } else {
                blocked.push(BlockedRecipient {
                    agent_id: id,
                    agent_name: names.get(&id).cloned(),
                    reason: decision.reason,
                });
            }
        }
        Ok((allowed, blocked))
    }

    async fn prepare(
        &self,
        input: &SendMessageInput,
    ) -> Result<(NewMessage, Vec<(AgentId, RecipientKind)>), MailroomError> {
        let sender = agents::get_agent(&self.db, input.sender_id)
            .await?
            .ok_or_else(|| MailroomError::not_found("agent", input.sender_id))?;
        let recipients = input.recipients();
        if recipients.is_empty() {
            return Err(MailroomError::Validation(
                "a message needs at least one recipient".into(),
            ));
        }
        let message = NewMessage {
            project_id: sender.project_id,
            sender_id: sender.id,
            thread_id: input
                .thread_id
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            subject: input.subject.clone(),
            body: input.body.clone(),
            importance: input.importance.unwrap_or(self.default_importance),
            ack_required: input.ack_required,
            recipients: Vec::new(),
        };
        Ok((message, recipients))
    }

    async fn persist(
        &self,
        mut message: NewMessage,
        recipients: Vec<(AgentId, RecipientKind)>,
    ) -> Result<MessageEnvelope, MailroomError> {
        message.recipients = recipients;
        let envelope = self
            .locks
            .with_lock(lock::MESSAGES, messages::insert_message(&self.db, message))
            .await?;
        info!(
            message_id = envelope.message.id,
            sender_id = envelope.message.sender_id,
            thread_id = %envelope.message.thread_id,
            recipients = envelope.recipients.len(),
            "message persisted"
        );
        Ok(envelope)
    }

    /// Send a message.
    ///
    /// With `enforce_contact_policy`, recipients the Admission Engine refuses
    /// are dropped; if none remain the send fails with
    /// [`MailroomError::PolicyDenied`] listing each refusal.
    pub async fn send_message(
        &self,
        input: SendMessageInput,
        enforce_contact_policy: bool,
    ) -> Result<MessageEnvelope, MailroomError> {
        let (message, requested) = self.prepare(&input).await?;
        let (allowed, blocked) = self
            .admit(input.sender_id, requested, enforce_contact_policy)
            .await?;
        if allowed.is_empty() {
            return Err(MailroomError::PolicyDenied { blocked });
        }
        if !blocked.is_empty() {
            debug!(dropped = blocked.len(), "recipients dropped by contact policy");
        }
        self.persist(message, allowed).await
    }

    /// Like [`send_message`](Self::send_message) with enforcement on, but a
    /// fully blocked send is reported in the outcome instead of as an error.
    pub async fn send_message_with_policy_check(
        &self,
        input: SendMessageInput,
    ) -> Result<SendOutcome, MailroomError> {
        let (message, requested) = self.prepare(&input).await?;
        let (allowed, blocked_recipients) = self.admit(input.sender_id, requested, true).await?;
        if allowed.is_empty() {
            return Ok(SendOutcome {
                message: None,
                blocked_recipients,
                sent: false,
            });
        }
        let envelope = self.persist(message, allowed).await?;
        Ok(SendOutcome {
            message: Some(envelope),
            blocked_recipients,
            sent: true,
        })
    }

    /// Reply to a message.
    ///
    /// Goes to the original sender (unless replying to oneself) plus the
    /// original's other recipients minus the replier, each keeping its
    /// original kind. The thread and importance carry over and the subject
    /// gets a `Re: ` prefix.
    pub async fn reply_message(
        &self,
        original_id: MessageId,
        sender_id: AgentId,
        body: &str,
    ) -> Result<MessageEnvelope, MailroomError> {
        let original = self.get_message(original_id).await?;
        let sender = agents::get_agent(&self.db, sender_id)
            .await?
            .ok_or_else(|| MailroomError::not_found("agent", sender_id))?;

        let mut seen = HashSet::from([sender.id]);
        let mut recipients = Vec::new();
        if seen.insert(original.message.sender_id) {
            recipients.push((original.message.sender_id, RecipientKind::To));
        }
        for r in &original.recipients {
            if seen.insert(r.agent_id) {
                recipients.push((r.agent_id, r.kind));
            }
        }
        if recipients.is_empty() {
            return Err(MailroomError::Validation(format!(
                "message {original_id} has no one to reply to"
            )));
        }

        let message = NewMessage {
            project_id: original.message.project_id,
            sender_id: sender.id,
            thread_id: original.message.thread_id.clone(),
            subject: format!("Re: {}", original.message.subject),
            body: body.to_string(),
            importance: original.message.importance,
            ack_required: false,
            recipients: Vec::new(),
        };
        self.persist(message, recipients).await
    }

    /// A message with its delivery records.
    pub async fn get_message(&self, id: MessageId) -> Result<MessageEnvelope, MailroomError> {
        let message = messages::get_message(&self.db, id)
            .await?
            .ok_or_else(|| MailroomError::not_found("message", id))?;
        let recipients = messages::get_recipients(&self.db, id).await?;
        Ok(MessageEnvelope {
            message,
            recipients,
        })
    }

    /// Every message in a thread, oldest first.
    pub async fn fetch_thread(&self, thread_id: &str) -> Result<Vec<Message>, MailroomError> {
        messages::fetch_thread(&self.db, thread_id).await
    }

    /// An agent's inbox, newest first.
    pub async fn fetch_inbox(
        &self,
        agent_id: AgentId,
        query: InboxQuery,
    ) -> Result<Vec<InboxEntry>, MailroomError> {
        messages::fetch_inbox(&self.db, agent_id, query).await
    }

    /// Returns false if already read or not a recipient.
    pub async fn mark_read(&self, message_id: MessageId, agent_id: AgentId) -> Result<bool, MailroomError> {
        self.locks
            .with_lock(lock::MESSAGES, messages::mark_read(&self.db, message_id, agent_id))
            .await
    }

    /// Stamps the ack and, if unset, the read time. Returns false if already
    /// acknowledged or not a recipient.
    pub async fn acknowledge(&self, message_id: MessageId, agent_id: AgentId) -> Result<bool, MailroomError> {
        self.locks
            .with_lock(lock::MESSAGES, messages::acknowledge(&self.db, message_id, agent_id))
            .await
    }

    /// Delivery records the agent has not read yet.
    pub async fn count_unread(&self, agent_id: AgentId) -> Result<i64, MailroomError> {
        messages::count_unread(&self.db, agent_id).await
    }
}
