// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Facade wiring storage, matcher, locks, and the three engines together.

use std::sync::Arc;

use tracing::info;

use mailroom_config::model::MailroomConfig;
use mailroom_core::{
    Agent, AgentId, ContactPolicy, HealthStatus, MailroomError, PluginAdapter, Project, ProjectId,
    StorageAdapter,
};
use mailroom_storage::queries::{agents, projects};
use mailroom_storage::{Database, NewAgent, SqliteStorage};

use crate::admission::AdmissionEngine;
use crate::dispatch::MessageDispatcher;
use crate::lease::LeaseEngine;
use crate::lock::NamedLocks;
use crate::matcher::GlobMatcher;

/// Everything a caller needs to coordinate agents on one database.
pub struct Coordinator {
    config: MailroomConfig,
    storage: SqliteStorage,
    locks: NamedLocks,
    lease: LeaseEngine,
    admission: AdmissionEngine,
    dispatcher: MessageDispatcher,
}

impl Coordinator {
    /// Open the configured database and build the engines.
    pub async fn open(config: MailroomConfig) -> Result<Self, MailroomError> {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        Self::build(config, storage)
    }

    /// Build the engines over an already-open database.
    pub fn with_database(config: MailroomConfig, db: Database) -> Result<Self, MailroomError> {
        let storage = SqliteStorage::from_database(config.storage.clone(), db);
        Self::build(config, storage)
    }

    fn build(config: MailroomConfig, storage: SqliteStorage) -> Result<Self, MailroomError> {
        let db = storage.database()?.clone();
        let locks = NamedLocks::new();
        let lease = LeaseEngine::new(
            db.clone(),
            Arc::new(GlobMatcher::new()),
            locks.clone(),
            config.reservations.clone(),
        );
        let admission = AdmissionEngine::new(db.clone(), locks.clone());
        let dispatcher = MessageDispatcher::new(
            db,
            admission.clone(),
            locks.clone(),
            config.messaging.importance(),
        );
        info!(
            adapter = storage.name(),
            path = %config.storage.database_path,
            "coordinator ready"
        );
        Ok(Self {
            config,
            storage,
            locks,
            lease,
            admission,
            dispatcher,
        })
    }

    /// Effective configuration the engines were built from.
    pub fn config(&self) -> &MailroomConfig {
        &self.config
    }

    /// File reservations.
    pub fn lease(&self) -> &LeaseEngine {
        &self.lease
    }

    /// Contact links and send admission.
    pub fn admission(&self) -> &AdmissionEngine {
        &self.admission
    }

    /// Sending, replies and inbox state.
    pub fn dispatcher(&self) -> &MessageDispatcher {
        &self.dispatcher
    }

    /// The lock registry shared by every engine.
    pub fn locks(&self) -> &NamedLocks {
        &self.locks
    }

    /// The open database, for queries the engines do not wrap.
    pub fn database(&self) -> Result<&Database, MailroomError> {
        self.storage.database()
    }

    /// Whether `[messaging].enforce_contact_policy` is on.
    pub fn enforce_contact_policy(&self) -> bool {
        self.config.messaging.enforce_contact_policy
    }

    /// Create a project keyed by `slug`, rooted at `human_key`.
    pub async fn create_project(&self, slug: &str, human_key: &str) -> Result<Project, MailroomError> {
        let project = projects::create_project(self.database()?, slug, human_key).await?;
        info!(project_id = project.id, slug = %project.slug, "project created");
        Ok(project)
    }

    /// Fails with `NotFound` for an unknown slug.
    pub async fn project_by_slug(&self, slug: &str) -> Result<Project, MailroomError> {
        projects::get_project_by_slug(self.database()?, slug)
            .await?
            .ok_or_else(|| MailroomError::not_found("project", slug))
    }

    /// All projects, in id order.
    pub async fn list_projects(&self) -> Result<Vec<Project>, MailroomError> {
        projects::list_projects(self.database()?).await
    }

    /// Register an agent. Names are unique within a project.
    pub async fn register_agent(&self, new: NewAgent) -> Result<Agent, MailroomError> {
        let agent = agents::create_agent(self.database()?, &new).await?;
        info!(
            agent_id = agent.id,
            name = %agent.name,
            program = %agent.program,
            policy = %agent.contact_policy,
            "agent registered"
        );
        Ok(agent)
    }

    /// Fails with `NotFound` for an unknown id.
    pub async fn agent(&self, id: AgentId) -> Result<Agent, MailroomError> {
        agents::get_agent(self.database()?, id)
            .await?
            .ok_or_else(|| MailroomError::not_found("agent", id))
    }

    /// Resolve an agent by its name within a project.
    pub async fn agent_by_name(&self, project_id: ProjectId, name: &str) -> Result<Agent, MailroomError> {
        agents::get_agent_by_name(self.database()?, project_id, name)
            .await?
            .ok_or_else(|| MailroomError::not_found("agent", name))
    }

    /// Agents of one project, in id order.
    pub async fn list_agents(&self, project_id: ProjectId) -> Result<Vec<Agent>, MailroomError> {
        agents::list_agents(self.database()?, project_id).await
    }

    /// Change an agent's contact policy.
    pub async fn set_contact_policy(
        &self,
        agent_id: AgentId,
        policy: ContactPolicy,
    ) -> Result<Agent, MailroomError> {
        self.admission.set_contact_policy(agent_id, policy).await
    }

    /// Health of the underlying store.
    pub async fn health_check(&self) -> Result<HealthStatus, MailroomError> {
        self.storage.health_check().await
    }

    /// Checkpoint and release the database.
    pub async fn shutdown(&self) -> Result<(), MailroomError> {
        self.storage.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailroom_config::model::StorageConfig;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_builds_a_working_coordinator() {
        let dir = tempdir().unwrap();
        let config = MailroomConfig {
            storage: StorageConfig {
                database_path: dir.path().join("coord.db").to_string_lossy().into_owned(),
                ..StorageConfig::default()
            },
            ..MailroomConfig::default()
        };
        let coord = Coordinator::open(config).await.unwrap();
        assert_eq!(coord.health_check().await.unwrap(), HealthStatus::Healthy);

        let project = coord.create_project("demo", "/tmp/demo").await.unwrap();
        assert_eq!(coord.project_by_slug("demo").await.unwrap().id, project.id);

        let agent = coord
            .register_agent(NewAgent {
                project_id: project.id,
                name: "BlueLake".into(),
                program: "codex".into(),
                model: None,
                contact_policy: ContactPolicy::default(),
            })
            .await
            .unwrap();
        assert_eq!(coord.agent_by_name(project.id, "BlueLake").await.unwrap().id, agent.id);
        assert_eq!(coord.list_agents(project.id).await.unwrap().len(), 1);
        assert!(!coord.enforce_contact_policy());

        let err = coord.project_by_slug("nope").await.unwrap_err();
        assert!(matches!(err, MailroomError::NotFound { entity: "project", .. }));

        coord.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn engines_share_one_lock_registry() {
        let db = Database::open_in_memory().await.unwrap();
        let coord = Coordinator::with_database(MailroomConfig::default(), db).unwrap();
        let _guard = coord.locks().acquire(crate::lock::RESERVATIONS).await;
        assert!(coord.locks().is_held(crate::lock::RESERVATIONS));
    }
}
