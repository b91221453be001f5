// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admission Engine: contact links and the may-A-message-B decision.
//!
//! Link creation runs under the [`lock::LINKS`] lock on top of the
//! unordered-pair index in the schema, so a pair never gets two rows even
//! when both agents ask each other at the same moment.

use tracing::{debug, info};

use mailroom_core::{
    AdmissionDecision, AdmissionReason, Agent, AgentId, AgentLink, ContactPolicy, LinkId,
    LinkStatus, MailroomError,
};
use mailroom_storage::Database;
use mailroom_storage::queries::{agents, links};

use crate::lock::{self, NamedLocks};

/// Status a new link starts in, decided by the responder's policy.
pub fn initial_link_status(requester: &Agent, responder: &Agent) -> LinkStatus {
    match responder.contact_policy {
        ContactPolicy::Open => LinkStatus::Approved,
        ContactPolicy::Auto if requester.program == responder.program => LinkStatus::Approved,
        ContactPolicy::Auto | ContactPolicy::ContactsOnly => LinkStatus::Pending,
        ContactPolicy::BlockAll => LinkStatus::Blocked,
    }
}

/// Admission decision from already-loaded state. First matching rule wins.
pub fn decide(
    sender: Option<&Agent>,
    recipient: Option<&Agent>,
    link: Option<&AgentLink>,
) -> AdmissionDecision {
    let Some(recipient) = recipient else {
        return AdmissionDecision::deny(AdmissionReason::Blocked);
    };
    let link_status = link.map(|l| l.status);
    if link_status == Some(LinkStatus::Blocked) {
        return AdmissionDecision::deny(AdmissionReason::Blocked);
    }
    match recipient.contact_policy {
        ContactPolicy::BlockAll => return AdmissionDecision::deny(AdmissionReason::BlockAll),
        ContactPolicy::Open => return AdmissionDecision::allow(AdmissionReason::Open),
        _ => {}
    }
    if link_status == Some(LinkStatus::Approved) {
        return AdmissionDecision::allow(AdmissionReason::ApprovedContact);
    }
    let pending = link_status == Some(LinkStatus::Pending);
    match recipient.contact_policy {
        ContactPolicy::Auto => {
            if sender.is_some_and(|s| s.program == recipient.program) {
                AdmissionDecision::allow(AdmissionReason::AutoApproved)
            } else if pending {
                AdmissionDecision::deny(AdmissionReason::Pending)
            } else {
                AdmissionDecision::deny(AdmissionReason::ContactsOnly)
            }
        }
        ContactPolicy::ContactsOnly if pending => AdmissionDecision::deny(AdmissionReason::Pending),
        ContactPolicy::ContactsOnly => AdmissionDecision::deny(AdmissionReason::ContactsOnly),
        ContactPolicy::Open | ContactPolicy::BlockAll => {
            AdmissionDecision::deny(AdmissionReason::Blocked)
        }
    }
}

/// Owns contact links and admission decisions.
#[derive(Clone)]
pub struct AdmissionEngine {
    db: Database,
    locks: NamedLocks,
}

impl AdmissionEngine {
    /// Engine over `db`, serializing link creation through `locks`.
    pub fn new(db: Database, locks: NamedLocks) -> Self {
        Self { db, locks }
    }

    async fn require_agent(&self, id: AgentId) -> Result<Agent, MailroomError> {
        agents::get_agent(&self.db, id)
            .await?
            .ok_or_else(|| MailroomError::not_found("agent", id))
    }

    async fn require_pair(&self, a: AgentId, b: AgentId) -> Result<(Agent, Agent), MailroomError> {
        if a == b {
            return Err(MailroomError::Validation(format!(
                "agent {a} cannot link to itself"
            )));
        }
        Ok((self.require_agent(a).await?, self.require_agent(b).await?))
    }

    /// Return the pair's link, creating it if absent.
    ///
    /// An existing link in either direction is returned unchanged. A new one
    /// starts in the status the responder's contact policy dictates.
    pub async fn request_link(
        &self,
        requester_id: AgentId,
        responder_id: AgentId,
    ) -> Result<AgentLink, MailroomError> {
        let (requester, responder) = self.require_pair(requester_id, responder_id).await?;

        let _guard = self.locks.acquire(lock::LINKS).await;
        if let Some(existing) = links::find_between(&self.db, requester_id, responder_id).await? {
            debug!(link_id = existing.id, status = %existing.status, "link already exists");
            return Ok(existing);
        }
        let status = initial_link_status(&requester, &responder);
        let (link, created) =
            links::insert_if_absent(&self.db, requester_id, responder_id, status).await?;
        if created {
            info!(
                link_id = link.id,
                requester = %requester.name,
                responder = %responder.name,
                status = %link.status,
                "link created"
            );
        }
        Ok(link)
    }

    /// pending → approved. Any other status is left alone and yields false.
    pub async fn approve_link(&self, id: LinkId) -> Result<bool, MailroomError> {
        let changed = links::update_status(
            &self.db,
            id,
            LinkStatus::Approved,
            Some(LinkStatus::Pending),
        )
        .await?;
        if changed {
            info!(link_id = id, "link approved");
        }
        Ok(changed)
    }

    /// Approve the link between a pair, if there is one.
    pub async fn approve_link_from(
        &self,
        responder_id: AgentId,
        requester_id: AgentId,
    ) -> Result<bool, MailroomError> {
        match links::find_between(&self.db, responder_id, requester_id).await? {
            Some(link) => self.approve_link(link.id).await,
            None => Ok(false),
        }
    }

    /// Block a link from whatever status it is in.
    pub async fn block_link(&self, id: LinkId) -> Result<bool, MailroomError> {
        let changed = links::update_status(&self.db, id, LinkStatus::Blocked, None).await?;
        if changed {
            info!(link_id = id, "link blocked");
        }
        Ok(changed)
    }

    /// Block the pair's link, creating it directly as blocked if absent.
    pub async fn block_link_from(
        &self,
        responder_id: AgentId,
        requester_id: AgentId,
    ) -> Result<bool, MailroomError> {
        self.require_pair(requester_id, responder_id).await?;

        let existing = {
            let _guard = self.locks.acquire(lock::LINKS).await;
            match links::find_between(&self.db, responder_id, requester_id).await? {
                Some(link) => link,
                None => {
                    let (link, created) = links::insert_if_absent(
                        &self.db,
                        requester_id,
                        responder_id,
                        LinkStatus::Blocked,
                    )
                    .await?;
                    if created {
                        info!(link_id = link.id, requester_id, responder_id, "link created blocked");
                        return Ok(true);
                    }
                    link
                }
            }
        };
        self.block_link(existing.id).await
    }

    /// blocked → pending. Any other status is left alone and yields false.
    pub async fn unblock_link(&self, id: LinkId) -> Result<bool, MailroomError> {
        let changed = links::update_status(
            &self.db,
            id,
            LinkStatus::Pending,
            Some(LinkStatus::Blocked),
        )
        .await?;
        if changed {
            info!(link_id = id, "link unblocked");
        }
        Ok(changed)
    }

    /// Permanently remove a link.
    pub async fn delete_link(&self, id: LinkId) -> Result<bool, MailroomError> {
        let deleted = links::delete_link(&self.db, id).await?;
        if deleted {
            info!(link_id = id, "link deleted");
        }
        Ok(deleted)
    }

    /// Whether `sender_id` may message `recipient_id`, and why.
    pub async fn can_send(
        &self,
        sender_id: AgentId,
        recipient_id: AgentId,
    ) -> Result<AdmissionDecision, MailroomError> {
        let recipient = agents::get_agent(&self.db, recipient_id).await?;
        let sender = agents::get_agent(&self.db, sender_id).await?;
        let link = links::find_between(&self.db, sender_id, recipient_id).await?;
        let decision = decide(sender.as_ref(), recipient.as_ref(), link.as_ref());
        if !decision.allowed {
            debug!(sender_id, recipient_id, reason = %decision.reason, "admission denied");
        }
        Ok(decision)
    }

    /// Look up a link by id.
    pub async fn get_link(&self, id: LinkId) -> Result<AgentLink, MailroomError> {
        links::get_link(&self.db, id)
            .await?
            .ok_or_else(|| MailroomError::not_found("link", id))
    }

    /// The link between two agents, in either direction.
    pub async fn find_link(
        &self,
        a: AgentId,
        b: AgentId,
    ) -> Result<Option<AgentLink>, MailroomError> {
        links::find_between(&self.db, a, b).await
    }

    /// Every link the agent takes part in, as requester or responder, in id order.
    pub async fn list_links(&self, agent_id: AgentId) -> Result<Vec<AgentLink>, MailroomError> {
        links::list_for_agent(&self.db, agent_id).await
    }

    /// Change an agent's contact policy and return the updated agent.
    pub async fn set_contact_policy(
        &self,
        agent_id: AgentId,
        policy: ContactPolicy,
    ) -> Result<Agent, MailroomError> {
        if !agents::set_contact_policy(&self.db, agent_id, policy).await? {
            return Err(MailroomError::not_found("agent", agent_id));
        }
        info!(agent_id, policy = %policy, "contact policy changed");
        self.require_agent(agent_id).await
    }
}
