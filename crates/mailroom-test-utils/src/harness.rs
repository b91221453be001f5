// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` opens a full coordinator on a temp SQLite database with one
//! project already created, so tests only seed the agents they need.

use mailroom_config::model::{MailroomConfig, StorageConfig};
use mailroom_coord::Coordinator;
use mailroom_core::{Agent, ContactPolicy, MailroomError, Project};
use mailroom_storage::NewAgent;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: MailroomConfig,
    project_slug: String,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: MailroomConfig::default(),
            project_slug: "test-project".to_string(),
        }
    }

    /// Turn contact-policy enforcement on or off for sends.
    pub fn with_enforced_contact_policy(mut self, enforce: bool) -> Self {
        self.config.messaging.enforce_contact_policy = enforce;
        self
    }

    /// Override the default reservation TTL.
    pub fn with_default_ttl(mut self, seconds: u64) -> Self {
        self.config.reservations.default_ttl_seconds = seconds;
        self
    }

    /// Override the minimum reservation TTL.
    pub fn with_min_ttl(mut self, seconds: u64) -> Self {
        self.config.reservations.min_ttl_seconds = seconds;
        self
    }

    /// Slug of the project created at build time.
    pub fn with_project_slug(mut self, slug: impl Into<String>) -> Self {
        self.project_slug = slug.into();
        self
    }

    /// Build the harness: temp database, coordinator, and one project.
    pub async fn build(self) -> Result<TestHarness, MailroomError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| MailroomError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let config = MailroomConfig {
            storage: StorageConfig {
                database_path: db_path.to_string_lossy().into_owned(),
                ..self.config.storage.clone()
            },
            ..self.config
        };
        let coordinator = Coordinator::open(config).await?;
        let human_key = temp_dir.path().join("workspace").to_string_lossy().into_owned();
        let project = coordinator
            .create_project(&self.project_slug, &human_key)
            .await?;

        Ok(TestHarness {
            coordinator,
            project,
            _temp_dir: temp_dir,
        })
    }
}

/// A coordinator on temp storage plus the project tests run against.
pub struct TestHarness {
    /// Coordinator over the temp database.
    pub coordinator: Coordinator,
    /// Project created by `build`, rooted at the temp workspace.
    pub project: Project,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Start configuring a harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Register an agent with the default `auto` policy.
    pub async fn agent(&self, name: &str) -> Result<Agent, MailroomError> {
        self.agent_with(name, "claude-code", ContactPolicy::default())
            .await
    }

    /// Register an agent with an explicit program and contact policy.
    pub async fn agent_with(
        &self,
        name: &str,
        program: &str,
        policy: ContactPolicy,
    ) -> Result<Agent, MailroomError> {
        self.coordinator
            .register_agent(NewAgent {
                project_id: self.project.id,
                name: name.to_string(),
                program: program.to_string(),
                model: None,
                contact_policy: policy,
            })
            .await
    }

    /// Directory backing the project's `human_key`, created on demand.
    pub fn workspace_root(&self) -> std::io::Result<std::path::PathBuf> {
        let root = self._temp_dir.path().join("workspace");
        std::fs::create_dir_all(&root)?;
        Ok(root)
    }
}
