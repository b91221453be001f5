// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mailroom backup` and `mailroom restore` command implementation.
//!
//! Uses rusqlite's online Backup API, so a consistent copy can be taken
//! while other agents keep writing to the WAL-mode database.

use std::path::Path;
use std::time::Duration;

use mailroom_core::MailroomError;
use rusqlite::{Connection, OpenFlags};

/// Pages copied per backup step.
const PAGES_PER_STEP: std::ffi::c_int = 100;
const STEP_PAUSE: Duration = Duration::from_millis(10);

fn storage_err(e: impl std::error::Error + Send + Sync + 'static) -> MailroomError {
    MailroomError::Storage {
        source: Box::new(e),
    }
}

/// Copy `src` into `dst` page by page.
fn copy_database(src: &Connection, dst: &mut Connection) -> Result<(), MailroomError> {
    let backup = rusqlite::backup::Backup::new(src, dst).map_err(storage_err)?;
    backup
        .run_to_completion(PAGES_PER_STEP, STEP_PAUSE, None)
        .map_err(storage_err)
}

fn report(verb: &str, path: &str) -> Result<(), MailroomError> {
    let size = std::fs::metadata(path).map_err(storage_err)?.len();
    let size_mb = size as f64 / (1024.0 * 1024.0);
    eprintln!("{verb} complete: {size_mb:.1} MB ({path})");
    Ok(())
}

/// Back the mailroom database up to `backup_path`.
pub fn run_backup(db_path: &str, backup_path: &str) -> Result<(), MailroomError> {
    if !Path::new(db_path).exists() {
        return Err(MailroomError::not_found("database", db_path));
    }

    let src = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(storage_err)?;
    let mut dst = Connection::open(backup_path).map_err(storage_err)?;
    copy_database(&src, &mut dst)?;

    report("Backup", backup_path)
}

/// Replace the mailroom database with the contents of `restore_from`.
///
/// The current database, if any, is first saved to `<db_path>.pre-restore`.
pub fn run_restore(db_path: &str, restore_from: &str) -> Result<(), MailroomError> {
    if !Path::new(restore_from).exists() {
        return Err(MailroomError::not_found("backup", restore_from));
    }

    let src = Connection::open_with_flags(restore_from, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(storage_err)?;
    // Rejects files that are not SQLite databases before anything is touched.
    src.execute_batch("SELECT count(*) FROM sqlite_master")
        .map_err(storage_err)?;

    if Path::new(db_path).exists() {
        let pre_restore_path = format!("{db_path}.pre-restore");
        eprintln!("Saving current database to {pre_restore_path}");
        run_backup(db_path, &pre_restore_path)?;
    }

    let mut dst = Connection::open(db_path).map_err(storage_err)?;
    copy_database(&src, &mut dst)?;

    report("Restore", db_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailroom_storage::Database;
    use mailroom_storage::queries::projects;

    async fn seeded(path: &Path, slug: &str) -> Database {
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        projects::create_project(&db, slug, "/tmp/work").await.unwrap();
        db.close().await.unwrap();
        db
    }

    fn project_slugs(path: &Path) -> Vec<String> {
        let conn = Connection::open(path).unwrap();
        let mut stmt = conn.prepare("SELECT slug FROM projects ORDER BY id").unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn backup_of_missing_database_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("absent.db");
        let err = run_backup(src.to_str().unwrap(), "/tmp/unused.db").unwrap_err();
        assert!(matches!(err, MailroomError::NotFound { entity: "database", .. }));
    }

    #[test]
    fn restore_from_missing_backup_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target.db");
        let err = run_restore(target.to_str().unwrap(), "/tmp/no-such-mailroom-backup.db")
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn backup_copies_live_database() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("live.db");
        let copy = dir.path().join("copy.db");
        let _db = seeded(&src, "alpha").await;

        run_backup(src.to_str().unwrap(), copy.to_str().unwrap()).unwrap();
        assert_eq!(project_slugs(&copy), vec!["alpha"]);
    }

    #[tokio::test]
    async fn restore_keeps_a_pre_restore_copy() {
        let dir = tempfile::tempdir().unwrap();
        let current = dir.path().join("current.db");
        let saved = dir.path().join("saved.db");
        drop(seeded(&current, "current").await);
        drop(seeded(&saved, "saved").await);

        run_restore(current.to_str().unwrap(), saved.to_str().unwrap()).unwrap();

        let pre_restore = dir.path().join("current.db.pre-restore");
        assert_eq!(project_slugs(&pre_restore), vec!["current"]);
        assert_eq!(project_slugs(&current), vec!["saved"]);
    }

    #[test]
    fn restore_rejects_non_sqlite_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target.db");
        let bogus = dir.path().join("bogus.db");
        std::fs::write(&bogus, b"definitely not sqlite").unwrap();

        assert!(run_restore(target.to_str().unwrap(), bogus.to_str().unwrap()).is_err());
        assert!(!target.exists());
    }
}
