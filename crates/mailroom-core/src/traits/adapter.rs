// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait shared by the external collaborators the engines are wired to.

use async_trait::async_trait;

use crate::error::MailroomError;
use crate::types::{AdapterType, HealthStatus};

/// Identity, health, and shutdown hooks for a pluggable collaborator.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Short adapter name, e.g. `sqlite` or `glob`.
    fn name(&self) -> &str;

    fn version(&self) -> semver::Version;

    fn adapter_type(&self) -> AdapterType;

    /// Reports whether the adapter can currently serve requests.
    async fn health_check(&self) -> Result<HealthStatus, MailroomError>;

    /// Releases held resources. Stateless adapters have nothing to do.
    async fn shutdown(&self) -> Result<(), MailroomError> {
        Ok(())
    }
}
