// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent CRUD operations.

use std::collections::HashMap;

use mailroom_core::{AgentId, ContactPolicy, MailroomError, ProjectId};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::Database;
use crate::models::{Agent, NewAgent};
use crate::timestamp;

const COLUMNS: &str = "id, project_id, name, program, model, contact_policy, created_ts";

pub(crate) fn agent_from_row(row: &Row<'_>) -> rusqlite::Result<Agent> {
    Ok(Agent {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        program: row.get(3)?,
        model: row.get(4)?,
        contact_policy: timestamp::text_enum(row, 5)?,
        created_ts: timestamp::ts(row, 6)?,
    })
}

enum CreateOutcome {
    Created(Agent),
    MissingProject,
    NameTaken,
}

/// Register an agent. Names are unique within a project.
pub async fn create_agent(db: &Database, new: &NewAgent) -> Result<Agent, MailroomError> {
    if new.name.trim().is_empty() {
        return Err(MailroomError::Validation("agent name must not be empty".into()));
    }
    let new = new.clone();
    let project_id = new.project_id;
    let name = new.name.clone();

    let outcome = db
        .connection()
        .call(move |conn| {
            let project_exists = conn
                .query_row("SELECT 1 FROM projects WHERE id = ?1", params![new.project_id], |_| {
                    Ok(())
                })
                .optional()?
                .is_some();
            if !project_exists {
                return Ok(CreateOutcome::MissingProject);
            }
            let name_taken = conn
                .query_row(
                    "SELECT 1 FROM agents WHERE project_id = ?1 AND name = ?2",
                    params![new.project_id, new.name],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if name_taken {
                return Ok(CreateOutcome::NameTaken);
            }

            let now = timestamp::now();
            conn.execute(
                "INSERT INTO agents (project_id, name, program, model, contact_policy, created_ts)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    new.project_id,
                    new.name,
                    new.program,
                    new.model,
                    new.contact_policy.to_string(),
                    timestamp::to_sql(&now),
                ],
            )?;
            Ok(CreateOutcome::Created(Agent {
                id: conn.last_insert_rowid(),
                project_id: new.project_id,
                name: new.name,
                program: new.program,
                model: new.model,
                contact_policy: new.contact_policy,
                created_ts: now,
            }))
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    match outcome {
        CreateOutcome::Created(agent) => Ok(agent),
        CreateOutcome::MissingProject => Err(MailroomError::not_found("project", project_id)),
        CreateOutcome::NameTaken => Err(MailroomError::Validation(format!(
            "agent `{name}` already exists in project {project_id}"
        ))),
    }
}

/// Get an agent by id.
pub async fn get_agent(db: &Database, id: AgentId) -> Result<Option<Agent>, MailroomError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM agents WHERE id = ?1"),
                params![id],
                agent_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get an agent by its name within a project.
pub async fn get_agent_by_name(
    db: &Database,
    project_id: ProjectId,
    name: &str,
) -> Result<Option<Agent>, MailroomError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM agents WHERE project_id = ?1 AND name = ?2"),
                params![project_id, name],
                agent_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List the agents of a project ordered by id.
pub async fn list_agents(db: &Database, project_id: ProjectId) -> Result<Vec<Agent>, MailroomError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM agents WHERE project_id = ?1 ORDER BY id"
            ))?;
            let rows = stmt.query_map(params![project_id], agent_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Change an agent's contact policy. Returns false if the agent does not exist.
pub async fn set_contact_policy(
    db: &Database,
    id: AgentId,
    policy: ContactPolicy,
) -> Result<bool, MailroomError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE agents SET contact_policy = ?1 WHERE id = ?2",
                params![policy.to_string(), id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Resolve display names for a set of agent ids. Unknown ids are omitted.
pub async fn agent_names(
    db: &Database,
    ids: &[AgentId],
) -> Result<HashMap<AgentId, String>, MailroomError> {
    let ids = ids.to_vec();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare("SELECT name FROM agents WHERE id = ?1")?;
            let mut names = HashMap::with_capacity(ids.len());
            for id in ids {
                if let Some(name) = stmt
                    .query_row(params![id], |row| row.get::<_, String>(0))
                    .optional()?
                {
                    names.insert(id, name);
                }
            }
            Ok(names)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::projects::create_project;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, ProjectId, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let project = create_project(&db, "demo", "/tmp/demo").await.unwrap();
        (db, project.id, dir)
    }

    fn new_agent(project_id: ProjectId, name: &str) -> NewAgent {
        NewAgent {
            project_id,
            name: name.to_string(),
            program: "claude-code".to_string(),
            model: Some("opus".to_string()),
            contact_policy: ContactPolicy::Auto,
        }
    }

    #[tokio::test]
    async fn create_and_get_agent() {
        let (db, project_id, _dir) = setup_db().await;

        let agent = create_agent(&db, &new_agent(project_id, "BlueLake")).await.unwrap();
        let fetched = get_agent(&db, agent.id).await.unwrap().unwrap();
        assert_eq!(fetched, agent);
        assert_eq!(fetched.contact_policy, ContactPolicy::Auto);

        let by_name = get_agent_by_name(&db, project_id, "BlueLake")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_name.id, agent.id);
    }

    #[tokio::test]
    async fn duplicate_name_in_project_is_rejected() {
        let (db, project_id, _dir) = setup_db().await;
        create_agent(&db, &new_agent(project_id, "BlueLake")).await.unwrap();

        let err = create_agent(&db, &new_agent(project_id, "BlueLake"))
            .await
            .unwrap_err();
        assert!(matches!(err, MailroomError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_project_is_not_found() {
        let (db, _project_id, _dir) = setup_db().await;
        let err = create_agent(&db, &new_agent(999, "Ghost")).await.unwrap_err();
        assert!(matches!(err, MailroomError::NotFound { entity: "project", .. }));
    }

    #[tokio::test]
    async fn contact_policy_can_be_changed() {
        let (db, project_id, _dir) = setup_db().await;
        let agent = create_agent(&db, &new_agent(project_id, "BlueLake")).await.unwrap();

        assert!(set_contact_policy(&db, agent.id, ContactPolicy::BlockAll).await.unwrap());
        let fetched = get_agent(&db, agent.id).await.unwrap().unwrap();
        assert_eq!(fetched.contact_policy, ContactPolicy::BlockAll);

        assert!(!set_contact_policy(&db, 999, ContactPolicy::Open).await.unwrap());
    }

    #[tokio::test]
    async fn list_and_name_lookup() {
        let (db, project_id, _dir) = setup_db().await;
        let a = create_agent(&db, &new_agent(project_id, "BlueLake")).await.unwrap();
        let b = create_agent(&db, &new_agent(project_id, "GreenHill")).await.unwrap();

        let agents = list_agents(&db, project_id).await.unwrap();
        assert_eq!(agents.len(), 2);

        let names = agent_names(&db, &[a.id, b.id, 777]).await.unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names[&a.id], "BlueLake");
        assert_eq!(names[&b.id], "GreenHill");
    }
}
