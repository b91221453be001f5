// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File reservation operations.
//!
//! "Active" is never stored: every query compares `released_ts IS NULL` and
//! `expires_ts > now` at read time.

use chrono::Duration;
use mailroom_core::{
    AgentId, MailroomError, ProjectId, ReservationConflict, ReservationId, Timestamp,
};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};

use crate::database::Database;
use crate::models::{FileReservation, ReservationFilter};
use crate::timestamp;

const COLUMNS: &str =
    "id, project_id, agent_id, path_pattern, exclusive, reason, created_ts, expires_ts, released_ts";

/// `now + ttl_seconds`, or a conversion error when it leaves chrono's range.
fn expiry(now: Timestamp, ttl_seconds: i64) -> rusqlite::Result<Timestamp> {
    Duration::try_seconds(ttl_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| {
            rusqlite::Error::ToSqlConversionFailure(
                format!("ttl_seconds {ttl_seconds} is out of range").into(),
            )
        })
}

fn reservation_from_row(row: &Row<'_>) -> rusqlite::Result<FileReservation> {
    Ok(FileReservation {
        id: row.get(0)?,
        project_id: row.get(1)?,
        agent_id: row.get(2)?,
        path_pattern: row.get(3)?,
        exclusive: row.get(4)?,
        reason: row.get(5)?,
        created_ts: timestamp::ts(row, 6)?,
        expires_ts: timestamp::ts(row, 7)?,
        released_ts: timestamp::opt_ts(row, 8)?,
    })
}

fn select_active_exclusive(
    conn: &Connection,
    project_id: ProjectId,
    now: &Timestamp,
    excluding: Option<AgentId>,
) -> rusqlite::Result<Vec<FileReservation>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM file_reservations
         WHERE project_id = ?1
           AND exclusive = 1
           AND released_ts IS NULL
           AND expires_ts > ?2
           AND (?3 IS NULL OR agent_id <> ?3)
         ORDER BY id"
    ))?;
    let rows = stmt.query_map(
        params![project_id, timestamp::to_sql(now), excluding],
        reservation_from_row,
    )?;
    rows.collect()
}

/// A reservation batch to create.
#[derive(Debug, Clone)]
pub struct ReservationRequest {
    pub project_id: ProjectId,
    pub agent_id: AgentId,
    /// Patterns granted together, sharing one expiry.
    pub patterns: Vec<String>,
    /// Only exclusive batches are checked for conflicts.
    pub exclusive: bool,
    pub reason: Option<String>,
    /// Seconds from now. Values chrono cannot represent are an error.
    pub ttl_seconds: i64,
}

/// Check for conflicts and insert a reservation batch in one `BEGIN IMMEDIATE`
/// transaction.
///
/// For exclusive requests, `detect` receives every other agent's active
/// exclusive reservation in the project and returns the conflicts it finds.
/// Any conflict aborts the whole batch and is returned as the inner `Err`,
/// with holder names filled in. Non-exclusive requests skip detection.
pub async fn reserve_atomically<F>(
    db: &Database,
    request: ReservationRequest,
    detect: F,
) -> Result<Result<Vec<FileReservation>, Vec<ReservationConflict>>, MailroomError>
where
    F: FnOnce(&[FileReservation]) -> Vec<ReservationConflict> + Send + 'static,
{
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let now = timestamp::now();

            if request.exclusive {
                let holders =
                    select_active_exclusive(&tx, request.project_id, &now, Some(request.agent_id))?;
                let mut conflicts = detect(&holders);
                if !conflicts.is_empty() {
                    let mut name_stmt = tx.prepare("SELECT name FROM agents WHERE id = ?1")?;
                    for conflict in &mut conflicts {
                        conflict.holder_agent_name = name_stmt
                            .query_row(params![conflict.holder_agent_id], |row| row.get(0))
                            .optional()?;
                    }
                    return Ok(Err(conflicts));
                }
            }

            let expires = expiry(now, request.ttl_seconds)?;
            let created_sql = timestamp::to_sql(&now);
            let expires_sql = timestamp::to_sql(&expires);
            let mut granted = Vec::with_capacity(request.patterns.len());
            {
                let mut insert = tx.prepare(
                    "INSERT INTO file_reservations
                         (project_id, agent_id, path_pattern, exclusive, reason, created_ts, expires_ts)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )?;
                for pattern in &request.patterns {
                    let id = insert.insert(params![
                        request.project_id,
                        request.agent_id,
                        pattern,
                        request.exclusive,
                        request.reason,
                        created_sql,
                        expires_sql,
                    ])?;
                    granted.push(FileReservation {
                        id,
                        project_id: request.project_id,
                        agent_id: request.agent_id,
                        path_pattern: pattern.clone(),
                        exclusive: request.exclusive,
                        reason: request.reason.clone(),
                        created_ts: now,
                        expires_ts: expires,
                        released_ts: None,
                    });
                }
            }
            tx.commit()?;
            Ok(Ok(granted))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Active exclusive reservations in a project, optionally ignoring one agent's.
pub async fn active_exclusive(
    db: &Database,
    project_id: ProjectId,
    excluding: Option<AgentId>,
) -> Result<Vec<FileReservation>, MailroomError> {
    db.connection()
        .call(move |conn| select_active_exclusive(conn, project_id, &timestamp::now(), excluding))
        .await
        .map_err(crate::database::map_tr_err)
}

/// Active reservations (exclusive or not) held by one agent.
pub async fn active_for_agent(
    db: &Database,
    agent_id: AgentId,
) -> Result<Vec<FileReservation>, MailroomError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM file_reservations
                 WHERE agent_id = ?1 AND released_ts IS NULL AND expires_ts > ?2
                 ORDER BY id"
            ))?;
            let rows = stmt.query_map(
                params![agent_id, timestamp::to_sql(&timestamp::now())],
                reservation_from_row,
            )?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a reservation by id.
pub async fn get_reservation(
    db: &Database,
    id: ReservationId,
) -> Result<Option<FileReservation>, MailroomError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM file_reservations WHERE id = ?1"),
                params![id],
                reservation_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List a project's reservations, newest last.
pub async fn list_reservations(
    db: &Database,
    filter: ReservationFilter,
) -> Result<Vec<FileReservation>, MailroomError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM file_reservations
                 WHERE project_id = ?1
                   AND (?2 IS NULL OR agent_id = ?2)
                   AND (?3 = 0 OR (released_ts IS NULL AND expires_ts > ?4))
                 ORDER BY id"
            ))?;
            let rows = stmt.query_map(
                params![
                    filter.project_id,
                    filter.agent_id,
                    filter.active_only,
                    timestamp::to_sql(&timestamp::now()),
                ],
                reservation_from_row,
            )?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Release the given ids. Already-released rows are left alone and not counted.
pub async fn release_ids(db: &Database, ids: &[ReservationId]) -> Result<usize, MailroomError> {
    let ids = ids.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let now = timestamp::to_sql(&timestamp::now());
            let mut released = 0;
            {
                let mut stmt = tx.prepare(
                    "UPDATE file_reservations SET released_ts = ?1
                     WHERE id = ?2 AND released_ts IS NULL",
                )?;
                for id in ids {
                    released += stmt.execute(params![now, id])?;
                }
            }
            tx.commit()?;
            Ok(released)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Release every unreleased reservation held by an agent.
pub async fn release_all_for_agent(db: &Database, agent_id: AgentId) -> Result<usize, MailroomError> {
    db.connection()
        .call(move |conn| {
            let released = conn.execute(
                "UPDATE file_reservations SET released_ts = ?1
                 WHERE agent_id = ?2 AND released_ts IS NULL",
                params![timestamp::to_sql(&timestamp::now()), agent_id],
            )?;
            Ok(released)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Release a reservation regardless of holder.
///
/// An existing `released_ts` is kept. Returns whether the id exists.
pub async fn force_release(db: &Database, id: ReservationId) -> Result<bool, MailroomError> {
    db.connection()
        .call(move |conn| {
            let touched = conn.execute(
                "UPDATE file_reservations SET released_ts = COALESCE(released_ts, ?1)
                 WHERE id = ?2",
                params![timestamp::to_sql(&timestamp::now()), id],
            )?;
            Ok(touched > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Push `expires_ts` to `now + ttl_seconds` for unreleased rows among `ids`.
pub async fn renew(
    db: &Database,
    ids: &[ReservationId],
    ttl_seconds: i64,
) -> Result<usize, MailroomError> {
    let ids = ids.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let expires = timestamp::to_sql(&expiry(timestamp::now(), ttl_seconds)?);
            let mut renewed = 0;
            {
                let mut stmt = tx.prepare(
                    "UPDATE file_reservations SET expires_ts = ?1
                     WHERE id = ?2 AND released_ts IS NULL",
                )?;
                for id in ids {
                    renewed += stmt.execute(params![expires, id])?;
                }
            }
            tx.commit()?;
            Ok(renewed)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark unreleased rows whose expiry has passed as released.
pub async fn expire_stale(db: &Database) -> Result<usize, MailroomError> {
    db.connection()
        .call(|conn| {
            let now = timestamp::to_sql(&timestamp::now());
            let expired = conn.execute(
                "UPDATE file_reservations SET released_ts = ?1
                 WHERE released_ts IS NULL AND expires_ts < ?1",
                params![now],
            )?;
            Ok(expired)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
