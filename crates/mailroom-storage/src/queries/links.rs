// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact link operations.
//!
//! The `idx_agent_links_pair` expression index allows one row per unordered
//! agent pair, so every lookup here is direction-agnostic.

use mailroom_core::{AgentId, LinkId, LinkStatus, MailroomError};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::database::Database;
use crate::models::AgentLink;
use crate::timestamp;

const COLUMNS: &str = "id, requester_id, responder_id, status, created_ts, updated_ts";

fn link_from_row(row: &Row<'_>) -> rusqlite::Result<AgentLink> {
    Ok(AgentLink {
        id: row.get(0)?,
        requester_id: row.get(1)?,
        responder_id: row.get(2)?,
        status: timestamp::text_enum(row, 3)?,
        created_ts: timestamp::ts(row, 4)?,
        updated_ts: timestamp::ts(row, 5)?,
    })
}

fn select_between(conn: &Connection, a: AgentId, b: AgentId) -> rusqlite::Result<Option<AgentLink>> {
    conn.query_row(
        &format!(
            "SELECT {COLUMNS} FROM agent_links
             WHERE min(requester_id, responder_id) = min(?1, ?2)
               AND max(requester_id, responder_id) = max(?1, ?2)"
        ),
        params![a, b],
        link_from_row,
    )
    .optional()
}

/// The link between `a` and `b` in either direction, if any.
pub async fn find_between(
    db: &Database,
    a: AgentId,
    b: AgentId,
) -> Result<Option<AgentLink>, MailroomError> {
    db.connection()
        .call(move |conn| select_between(conn, a, b))
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a link by id.
pub async fn get_link(db: &Database, id: LinkId) -> Result<Option<AgentLink>, MailroomError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM agent_links WHERE id = ?1"),
                params![id],
                link_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Create a link unless the pair already has one.
///
/// Returns the row for the pair and whether this call created it. The insert
/// leans on the pair index, so a concurrent writer in another process cannot
/// produce a second row either.
pub async fn insert_if_absent(
    db: &Database,
    requester_id: AgentId,
    responder_id: AgentId,
    status: LinkStatus,
) -> Result<(AgentLink, bool), MailroomError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let now = timestamp::to_sql(&timestamp::now());
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO agent_links
                     (requester_id, responder_id, status, created_ts, updated_ts)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![requester_id, responder_id, status.to_string(), now],
            )?;
            let link = select_between(&tx, requester_id, responder_id)?
                .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            tx.commit()?;
            Ok((link, inserted > 0))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set a link's status.
///
/// With `only_from`, the row changes only if its current status matches.
/// Returns whether a row changed.
pub async fn update_status(
    db: &Database,
    id: LinkId,
    status: LinkStatus,
    only_from: Option<LinkStatus>,
) -> Result<bool, MailroomError> {
    db.connection()
        .call(move |conn| {
            let now = timestamp::to_sql(&timestamp::now());
            let changed = match only_from {
                Some(from) => conn.execute(
                    "UPDATE agent_links SET status = ?1, updated_ts = ?2
                     WHERE id = ?3 AND status = ?4",
                    params![status.to_string(), now, id, from.to_string()],
                )?,
                None => conn.execute(
                    "UPDATE agent_links SET status = ?1, updated_ts = ?2 WHERE id = ?3",
                    params![status.to_string(), now, id],
                )?,
            };
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Permanently remove a link. Returns whether it existed.
pub async fn delete_link(db: &Database, id: LinkId) -> Result<bool, MailroomError> {
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute("DELETE FROM agent_links WHERE id = ?1", params![id])?;
            Ok(deleted > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Every link the agent takes part in, on either side, ordered by id.
pub async fn list_for_agent(
    db: &Database,
    agent_id: AgentId,
) -> Result<Vec<AgentLink>, MailroomError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM agent_links
                 WHERE requester_id = ?1 OR responder_id = ?1
                 ORDER BY id"
            ))?;
            let rows = stmt.query_map(params![agent_id], link_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewAgent;
    use crate::queries::{agents, projects};
    use mailroom_core::ContactPolicy;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, Vec<AgentId>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let project = projects::create_project(&db, "demo", "/tmp/demo").await.unwrap();
        let mut ids = Vec::new();
        for name in ["Alpha", "Bravo", "Charlie"] {
            let agent = agents::create_agent(
                &db,
                &NewAgent {
                    project_id: project.id,
                    name: name.into(),
                    program: "codex".into(),
                    model: None,
                    contact_policy: ContactPolicy::Auto,
                },
            )
            .await
            .unwrap();
            ids.push(agent.id);
        }
        (db, ids, dir)
    }

    #[tokio::test]
    async fn insert_if_absent_is_direction_agnostic() {
        let (db, ids, _dir) = setup_db().await;
        let (a, b) = (ids[0], ids[1]);

        let (first, created) = insert_if_absent(&db, a, b, LinkStatus::Pending).await.unwrap();
        assert!(created);
        assert_eq!(first.requester_id, a);

        let (again, created) = insert_if_absent(&db, b, a, LinkStatus::Approved).await.unwrap();
        assert!(!created);
        assert_eq!(again.id, first.id);
        assert_eq!(again.status, LinkStatus::Pending);

        let found = find_between(&db, b, a).await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn conditional_update_only_applies_from_expected_status() {
        let (db, ids, _dir) = setup_db().await;
        let (link, _) = insert_if_absent(&db, ids[0], ids[1], LinkStatus::Blocked)
            .await
            .unwrap();

        let changed = update_status(&db, link.id, LinkStatus::Approved, Some(LinkStatus::Pending))
            .await
            .unwrap();
        assert!(!changed);

        let changed = update_status(&db, link.id, LinkStatus::Pending, Some(LinkStatus::Blocked))
            .await
            .unwrap();
        assert!(changed);

        let fetched = get_link(&db, link.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, LinkStatus::Pending);
        assert!(fetched.updated_ts >= fetched.created_ts);
    }

    #[tokio::test]
    async fn delete_and_list() {
        let (db, ids, _dir) = setup_db().await;
        let (ab, _) = insert_if_absent(&db, ids[0], ids[1], LinkStatus::Pending).await.unwrap();
        insert_if_absent(&db, ids[2], ids[0], LinkStatus::Approved).await.unwrap();

        assert_eq!(list_for_agent(&db, ids[0]).await.unwrap().len(), 2);
        assert_eq!(list_for_agent(&db, ids[1]).await.unwrap().len(), 1);

        assert!(delete_link(&db, ab.id).await.unwrap());
        assert!(!delete_link(&db, ab.id).await.unwrap());
        assert!(find_between(&db, ids[0], ids[1]).await.unwrap().is_none());
    }
}
