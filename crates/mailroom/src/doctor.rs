// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mailroom doctor` command implementation.
//!
//! Runs diagnostic checks against the configuration and the database
//! without modifying either.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use rusqlite::OpenFlags;
use tokio_rusqlite::Connection;

use mailroom_config::MailroomConfig;
use mailroom_core::MailroomError;
use mailroom_storage::timestamp;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Short label shown in the report.
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    /// Time the check took.
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `mailroom doctor` command.
///
/// With `--deep`, also runs `PRAGMA integrity_check` and reports file size.
pub async fn run_doctor(
    config: &MailroomConfig,
    config_path: Option<&Path>,
    deep: bool,
    plain: bool,
) -> Result<(), MailroomError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let results = collect_checks(config, config_path, deep).await;

    println!();
    println!("  mailroom doctor");
    println!("  {}", "-".repeat(50));

    let mut issues = 0;
    for result in &results {
        if result.status != CheckStatus::Pass {
            issues += 1;
        }
        println!("{}", render_line(result, use_color));
    }

    println!();
    if issues > 0 {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
        if !deep {
            println!("  Run with --deep for detailed diagnostics.");
        }
    } else {
        println!("  All checks passed.");
    }
    println!();

    Ok(())
}

async fn collect_checks(
    config: &MailroomConfig,
    config_path: Option<&Path>,
    deep: bool,
) -> Vec<CheckResult> {
    let db_path = &config.storage.database_path;
    let mut results = vec![check_config(config_path)];

    let start = Instant::now();
    match open_read_only(db_path).await {
        Ok(Some(conn)) => {
            results.push(CheckResult::new("Database", CheckStatus::Pass, "connected", start));
            results.push(check_schema(&conn).await);
            results.push(check_lapsed_reservations(&conn).await);
            if deep {
                results.push(check_integrity(&conn).await);
                results.push(check_file_size(db_path));
            }
        }
        Ok(None) => results.push(CheckResult::new(
            "Database",
            CheckStatus::Warn,
            format!("not found: {db_path} (run `mailroom init`)"),
            start,
        )),
        Err(e) => results.push(CheckResult::new(
            "Database",
            CheckStatus::Fail,
            format!("open failed: {e}"),
            start,
        )),
    }

    results
}

fn render_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red()),
        };
        format!("    {symbol} {:<20} {message} ({duration_ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

fn check_config(config_path: Option<&Path>) -> CheckResult {
    let start = Instant::now();
    let loaded = match config_path {
        Some(path) => mailroom_config::load_and_validate_path(path),
        None => mailroom_config::load_and_validate(),
    };
    match loaded {
        Ok(_) => CheckResult::new("Configuration", CheckStatus::Pass, "valid", start),
        Err(errors) => CheckResult::new(
            "Configuration",
            CheckStatus::Fail,
            format!("{} error(s)", errors.len()),
            start,
        ),
    }
}

/// `Ok(None)` when the file does not exist yet.
async fn open_read_only(
    db_path: &str,
) -> Result<Option<Connection>, tokio_rusqlite::Error<rusqlite::Error>> {
    if !Path::new(db_path).exists() {
        return Ok(None);
    }
    let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY).await?;
    Ok(Some(conn))
}

async fn check_schema(conn: &Connection) -> CheckResult {
    let start = Instant::now();
    let applied = conn
        .call(|conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM refinery_schema_history",
                [],
                |row| row.get(0),
            )
        })
        .await;
    match applied {
        Ok(n) if n > 0 => {
            CheckResult::new("Schema", CheckStatus::Pass, format!("{n} migration(s) applied"), start)
        }
        Ok(_) => CheckResult::new("Schema", CheckStatus::Warn, "no migrations applied", start),
        Err(e) => CheckResult::new("Schema", CheckStatus::Fail, format!("unreadable: {e}"), start),
    }
}

async fn check_lapsed_reservations(conn: &Connection) -> CheckResult {
    let start = Instant::now();
    let now = timestamp::to_sql(&timestamp::now());
    let lapsed = conn
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM file_reservations
                 WHERE released_ts IS NULL AND expires_ts < ?1",
                [&now],
                |row| row.get(0),
            )
        })
        .await;
    match lapsed {
        Ok(0) => CheckResult::new("Reservations", CheckStatus::Pass, "no lapsed rows", start),
        Ok(n) => CheckResult::new(
            "Reservations",
            CheckStatus::Warn,
            format!("{n} lapsed but unreleased (run `mailroom expire`)"),
            start,
        ),
        Err(e) => CheckResult::new(
            "Reservations",
            CheckStatus::Fail,
            format!("query failed: {e}"),
            start,
        ),
    }
}

async fn check_integrity(conn: &Connection) -> CheckResult {
    let start = Instant::now();
    let verdict = conn
        .call(|conn| -> Result<String, rusqlite::Error> {
            conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))
        })
        .await;
    match verdict {
        Ok(v) if v == "ok" => CheckResult::new("Integrity", CheckStatus::Pass, "ok", start),
        Ok(v) => CheckResult::new("Integrity", CheckStatus::Fail, v, start),
        Err(e) => CheckResult::new("Integrity", CheckStatus::Fail, format!("check failed: {e}"), start),
    }
}

fn check_file_size(db_path: &str) -> CheckResult {
    let start = Instant::now();
    match std::fs::metadata(db_path) {
        Ok(meta) => {
            let size_mb = meta.len() as f64 / (1024.0 * 1024.0);
            CheckResult::new("Disk usage", CheckStatus::Pass, format!("{size_mb:.1} MB"), start)
        }
        Err(e) => CheckResult::new("Disk usage", CheckStatus::Warn, format!("stat failed: {e}"), start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailroom_storage::Database;

    fn config_for(path: &Path) -> MailroomConfig {
        let mut config = MailroomConfig::default();
        config.storage.database_path = path.display().to_string();
        config
    }

    #[tokio::test]
    async fn missing_database_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir.path().join("absent.db"));
        let results = collect_checks(&config, None, false).await;
        let db = results.iter().find(|r| r.name == "Database").unwrap();
        assert_eq!(db.status, CheckStatus::Warn);
        assert!(!dir.path().join("absent.db").exists());
    }

    #[tokio::test]
    async fn migrated_database_passes_deep_checks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doctor.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();

        let config = config_for(&path);
        let results = collect_checks(&config, None, true).await;
        for name in ["Database", "Schema", "Reservations", "Integrity", "Disk usage"] {
            let check = results.iter().find(|r| r.name == name).unwrap();
            assert_eq!(check.status, CheckStatus::Pass, "{name}: {}", check.message);
        }
    }

    #[test]
    fn plain_lines_are_tagged() {
        let line = render_line(
            &CheckResult::new("Schema", CheckStatus::Warn, "x", Instant::now()),
            false,
        );
        assert!(line.contains("[WARN]"));
        assert!(line.contains("Schema"));
    }
}
