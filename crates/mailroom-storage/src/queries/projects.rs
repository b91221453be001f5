// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Project CRUD operations.

use mailroom_core::{MailroomError, ProjectId};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::Database;
use crate::models::Project;
use crate::timestamp;

const COLUMNS: &str = "id, slug, human_key, created_ts";

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        slug: row.get(1)?,
        human_key: row.get(2)?,
        created_ts: timestamp::ts(row, 3)?,
    })
}

/// Create a project. Fails with `Validation` if the slug is taken.
pub async fn create_project(
    db: &Database,
    slug: &str,
    human_key: &str,
) -> Result<Project, MailroomError> {
    let slug = slug.trim().to_string();
    let human_key = human_key.to_string();
    if slug.is_empty() {
        return Err(MailroomError::Validation(
            "project slug must not be empty".into(),
        ));
    }
    let taken_slug = slug.clone();
    let created = db
        .connection()
        .call(move |conn| {
            let exists = conn
                .query_row("SELECT 1 FROM projects WHERE slug = ?1", params![slug], |_| {
                    Ok(())
                })
                .optional()?
                .is_some();
            if exists {
                return Ok(None);
            }
            let now = timestamp::now();
            conn.execute(
                "INSERT INTO projects (slug, human_key, created_ts) VALUES (?1, ?2, ?3)",
                params![slug, human_key, timestamp::to_sql(&now)],
            )?;
            Ok(Some(Project {
                id: conn.last_insert_rowid(),
                slug,
                human_key,
                created_ts: now,
            }))
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    created.ok_or_else(|| {
        MailroomError::Validation(format!("project `{taken_slug}` already exists"))
    })
}

/// Get a project by id.
pub async fn get_project(db: &Database, id: ProjectId) -> Result<Option<Project>, MailroomError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM projects WHERE id = ?1"),
                params![id],
                project_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a project by slug.
pub async fn get_project_by_slug(
    db: &Database,
    slug: &str,
) -> Result<Option<Project>, MailroomError> {
    let slug = slug.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM projects WHERE slug = ?1"),
                params![slug],
                project_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List all projects ordered by id.
pub async fn list_projects(db: &Database) -> Result<Vec<Project>, MailroomError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM projects ORDER BY id"))?;
            let rows = stmt.query_map([], project_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
