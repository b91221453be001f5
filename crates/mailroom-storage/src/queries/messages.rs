// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message and delivery-record operations.

use mailroom_core::{AgentId, MailroomError, MessageId};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::Database;
use crate::models::{InboxEntry, InboxQuery, Message, MessageEnvelope, MessageRecipient, NewMessage};
use crate::timestamp;

const COLUMNS: &str =
    "m.id, m.project_id, m.sender_id, m.thread_id, m.subject, m.body, m.importance, m.ack_required, m.created_ts";

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        project_id: row.get(1)?,
        sender_id: row.get(2)?,
        thread_id: row.get(3)?,
        subject: row.get(4)?,
        body: row.get(5)?,
        importance: timestamp::text_enum(row, 6)?,
        ack_required: row.get(7)?,
        created_ts: timestamp::ts(row, 8)?,
    })
}

fn recipient_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRecipient> {
    Ok(MessageRecipient {
        message_id: row.get(0)?,
        agent_id: row.get(1)?,
        kind: timestamp::text_enum(row, 2)?,
        read_ts: timestamp::opt_ts(row, 3)?,
        ack_ts: timestamp::opt_ts(row, 4)?,
    })
}

/// Insert a message and one delivery record per recipient in a single transaction.
pub async fn insert_message(db: &Database, new: NewMessage) -> Result<MessageEnvelope, MailroomError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let now = timestamp::now();
            tx.execute(
                "INSERT INTO messages
                     (project_id, sender_id, thread_id, subject, body, importance, ack_required, created_ts)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    new.project_id,
                    new.sender_id,
                    new.thread_id,
                    new.subject,
                    new.body,
                    new.importance.to_string(),
                    new.ack_required,
                    timestamp::to_sql(&now),
                ],
            )?;
            let message_id = tx.last_insert_rowid();

            let mut recipients = Vec::with_capacity(new.recipients.len());
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO message_recipients (message_id, agent_id, kind) VALUES (?1, ?2, ?3)",
                )?;
                for (agent_id, kind) in &new.recipients {
                    stmt.execute(params![message_id, agent_id, kind.to_string()])?;
                    recipients.push(MessageRecipient {
                        message_id,
                        agent_id: *agent_id,
                        kind: *kind,
                        read_ts: None,
                        ack_ts: None,
                    });
                }
            }
            tx.commit()?;

            Ok(MessageEnvelope {
                message: Message {
                    id: message_id,
                    project_id: new.project_id,
                    sender_id: new.sender_id,
                    thread_id: new.thread_id,
                    subject: new.subject,
                    body: new.body,
                    importance: new.importance,
                    ack_required: new.ack_required,
                    created_ts: now,
                },
                recipients,
            })
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a message by id.
pub async fn get_message(db: &Database, id: MessageId) -> Result<Option<Message>, MailroomError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM messages m WHERE m.id = ?1"),
                params![id],
                message_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delivery records of a message in insertion order.
pub async fn get_recipients(
    db: &Database,
    message_id: MessageId,
) -> Result<Vec<MessageRecipient>, MailroomError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT message_id, agent_id, kind, read_ts, ack_ts
                 FROM message_recipients WHERE message_id = ?1 ORDER BY rowid",
            )?;
            let rows = stmt.query_map(params![message_id], recipient_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// An agent's inbox, newest first.
pub async fn fetch_inbox(
    db: &Database,
    agent_id: AgentId,
    query: InboxQuery,
) -> Result<Vec<InboxEntry>, MailroomError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS}, r.kind, r.read_ts, r.ack_ts
                 FROM message_recipients r
                 JOIN messages m ON m.id = r.message_id
                 WHERE r.agent_id = ?1
                   AND (?2 = 0 OR r.read_ts IS NULL)
                   AND (?3 IS NULL OR m.created_ts > ?3)
                 ORDER BY m.created_ts DESC, m.id DESC
                 LIMIT ?4"
            ))?;
            let since = query.since.as_ref().map(timestamp::to_sql);
            let rows = stmt.query_map(
                params![agent_id, query.unread_only, since, query.limit.unwrap_or(-1)],
                |row| {
                    Ok(InboxEntry {
                        message: message_from_row(row)?,
                        kind: timestamp::text_enum(row, 9)?,
                        read_ts: timestamp::opt_ts(row, 10)?,
                        ack_ts: timestamp::opt_ts(row, 11)?,
                    })
                },
            )?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Stamp `read_ts` on a delivery record. Returns false if it was already
/// read or the agent is not a recipient.
pub async fn mark_read(
    db: &Database,
    message_id: MessageId,
    agent_id: AgentId,
) -> Result<bool, MailroomError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE message_recipients SET read_ts = ?1
                 WHERE message_id = ?2 AND agent_id = ?3 AND read_ts IS NULL",
                params![timestamp::to_sql(&timestamp::now()), message_id, agent_id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Stamp `ack_ts`, and `read_ts` if unset. Returns false if it was already
/// acknowledged or the agent is not a recipient.
pub async fn acknowledge(
    db: &Database,
    message_id: MessageId,
    agent_id: AgentId,
) -> Result<bool, MailroomError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE message_recipients
                 SET ack_ts = ?1, read_ts = COALESCE(read_ts, ?1)
                 WHERE message_id = ?2 AND agent_id = ?3 AND ack_ts IS NULL",
                params![timestamp::to_sql(&timestamp::now()), message_id, agent_id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of unread delivery records for an agent.
pub async fn count_unread(db: &Database, agent_id: AgentId) -> Result<i64, MailroomError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM message_recipients WHERE agent_id = ?1 AND read_ts IS NULL",
                params![agent_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Every message in a thread, oldest first.
pub async fn fetch_thread(db: &Database, thread_id: &str) -> Result<Vec<Message>, MailroomError> {
    let thread_id = thread_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM messages m WHERE m.thread_id = ?1
                 ORDER BY m.created_ts ASC, m.id ASC"
            ))?;
            let rows = stmt.query_map(params![thread_id], message_from_row)?;
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
    use mailroom_core::{ContactPolicy, Importance, ProjectId, RecipientKind};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, ProjectId, Vec<AgentId>, tempfile::TempDir) {
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
                    contact_policy: ContactPolicy::Open,
                },
            )
            .await
            .unwrap();
            ids.push(agent.id);
        }
        (db, project.id, ids, dir)
    }

    fn make_msg(project_id: ProjectId, sender: AgentId, thread: &str, subject: &str, to: &[(AgentId, RecipientKind)]) -> NewMessage {
        NewMessage {
            project_id,
            sender_id: sender,
            thread_id: thread.to_string(),
            subject: subject.to_string(),
            body: "body".to_string(),
            importance: Importance::High,
            ack_required: true,
            recipients: to.to_vec(),
        }
    }

    #[tokio::test]
    async fn insert_and_read_back_envelope() {
        let (db, project_id, ids, _dir) = setup_db().await;
        let envelope = insert_message(
            &db,
            make_msg(project_id, ids[0], "t-1", "hello", &[(ids[1], RecipientKind::To), (ids[2], RecipientKind::Cc)]),
        )
        .await
        .unwrap();

        let message = get_message(&db, envelope.message.id).await.unwrap().unwrap();
        assert_eq!(message, envelope.message);
        assert_eq!(message.importance, Importance::High);

        let recipients = get_recipients(&db, message.id).await.unwrap();
        assert_eq!(recipients, envelope.recipients);
        assert_eq!(recipients[1].kind, RecipientKind::Cc);
    }

    #[tokio::test]
    async fn inbox_is_newest_first_and_filters_unread() {
        let (db, project_id, ids, _dir) = setup_db().await;
        let first = insert_message(&db, make_msg(project_id, ids[0], "t-1", "first", &[(ids[1], RecipientKind::To)]))
            .await
            .unwrap();
        let second = insert_message(&db, make_msg(project_id, ids[0], "t-2", "second", &[(ids[1], RecipientKind::To)]))
            .await
            .unwrap();

        let inbox = fetch_inbox(&db, ids[1], InboxQuery::default()).await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].message.id, second.message.id);

        assert!(mark_read(&db, first.message.id, ids[1]).await.unwrap());
        let unread = fetch_inbox(
            &db,
            ids[1],
            InboxQuery {
                unread_only: true,
                ..InboxQuery::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].message.subject, "second");

        let limited = fetch_inbox(
            &db,
            ids[1],
            InboxQuery {
                limit: Some(1),
                ..InboxQuery::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn read_and_ack_are_idempotent() {
        let (db, project_id, ids, _dir) = setup_db().await;
        let env = insert_message(&db, make_msg(project_id, ids[0], "t-1", "hi", &[(ids[1], RecipientKind::To)]))
            .await
            .unwrap();
        let id = env.message.id;

        assert_eq!(count_unread(&db, ids[1]).await.unwrap(), 1);
        assert!(acknowledge(&db, id, ids[1]).await.unwrap());
        assert!(!acknowledge(&db, id, ids[1]).await.unwrap());
        assert!(!mark_read(&db, id, ids[1]).await.unwrap(), "ack already stamped read_ts");
        assert_eq!(count_unread(&db, ids[1]).await.unwrap(), 0);

        let recipients = get_recipients(&db, id).await.unwrap();
        assert!(recipients[0].read_ts.is_some());
        assert_eq!(recipients[0].read_ts, recipients[0].ack_ts);

        assert!(!mark_read(&db, id, ids[2]).await.unwrap(), "not a recipient");
    }

    #[tokio::test]
    async fn thread_is_oldest_first() {
        let (db, project_id, ids, _dir) = setup_db().await;
        insert_message(&db, make_msg(project_id, ids[0], "t-9", "one", &[(ids[1], RecipientKind::To)]))
            .await
            .unwrap();
        insert_message(&db, make_msg(project_id, ids[1], "t-9", "Re: one", &[(ids[0], RecipientKind::To)]))
            .await
            .unwrap();
        insert_message(&db, make_msg(project_id, ids[1], "other", "x", &[(ids[0], RecipientKind::To)]))
            .await
            .unwrap();

        let thread = fetch_thread(&db, "t-9").await.unwrap();
        let subjects: Vec<_> = thread.iter().map(|m| m.subject.as_str()).collect();
        assert_eq!(subjects, vec!["one", "Re: one"]);
    }
}
