// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the relational backend.

use async_trait::async_trait;

use crate::error::MailroomError;
use crate::traits::adapter::PluginAdapter;

/// Lifecycle of the relational backend that holds projects, agents, links,
/// reservations, and messages.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Opens the backend and applies pending schema migrations.
    async fn initialize(&self) -> Result<(), MailroomError>;

    /// Flushes pending writes and releases the connection.
    async fn close(&self) -> Result<(), MailroomError>;
}
