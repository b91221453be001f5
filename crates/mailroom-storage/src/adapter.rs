// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The SQLite [`StorageAdapter`] the coordinator owns.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use mailroom_config::model::StorageConfig;
use mailroom_core::{AdapterType, HealthStatus, MailroomError, PluginAdapter, StorageAdapter};

use crate::database::Database;

/// Owns the coordinator's [`Database`]. Opened by
/// [`StorageAdapter::initialize`], or handed one via [`SqliteStorage::from_database`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Adapter for `config.database_path`; nothing is opened until `initialize`.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wrap an already-open database.
    pub fn from_database(config: StorageConfig, db: Database) -> Self {
        Self {
            config,
            db: OnceCell::from(db),
        }
    }

    /// The open database, for the engines' typed queries.
    pub fn database(&self) -> Result<&Database, MailroomError> {
        self.db.get().ok_or_else(|| MailroomError::Storage {
            source: format!("database {} is not open", self.config.database_path).into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    /// `PRAGMA quick_check`; a non-`ok` verdict is reported as degraded.
    async fn health_check(&self) -> Result<HealthStatus, MailroomError> {
        let verdict = self
            .database()?
            .connection()
            .call(|conn| -> Result<String, rusqlite::Error> {
                conn.query_row("PRAGMA quick_check", [], |row| row.get(0))
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        if verdict == "ok" {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded(verdict))
        }
    }

    async fn shutdown(&self) -> Result<(), MailroomError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!(path = %self.config.database_path, "database closed");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), MailroomError> {
        if self.db.initialized() {
            return Err(MailroomError::Storage {
                source: format!("database {} is already open", self.config.database_path).into(),
            });
        }
        let db = Database::open_with(&self.config).await?;
        self.db.set(db).map_err(|_| MailroomError::Storage {
            source: "database opened concurrently".into(),
        })?;
        debug!(path = %self.config.database_path, "database open");
        Ok(())
    }

    async fn close(&self) -> Result<(), MailroomError> {
        self.database()?.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::projects;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
            busy_timeout_ms: 1_000,
        }
    }

    #[tokio::test]
    async fn initialize_creates_the_file_once() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("mailroom.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
        assert!(storage.database().is_err());

        storage.initialize().await.unwrap();
        assert!(db_path.exists());

        let again = storage.initialize().await.unwrap_err();
        assert!(again.to_string().contains("already open"), "{again}");
    }

    #[tokio::test]
    async fn health_check_reflects_initialization() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("health.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert!(storage.health_check().await.is_err());
        storage.initialize().await.unwrap();
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn queries_run_through_the_adapter_database() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("queries.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();

        let db = storage.database().unwrap();
        projects::create_project(db, "demo", "/tmp/demo").await.unwrap();
        assert_eq!(projects::list_projects(db).await.unwrap().len(), 1);

        storage.close().await.unwrap();
        storage.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn wrapping_an_open_database_skips_initialize() {
        let db = Database::open_in_memory().await.unwrap();
        let storage = SqliteStorage::from_database(make_config(":memory:"), db);
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
    }
}
