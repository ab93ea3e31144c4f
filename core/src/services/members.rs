//! Project membership roster

use super::Tracker;
use crate::cache::EntityKind;
use crate::db::{Db, map_insert_conflict};
use crate::errors::{Result, TrackerError};
use crate::session::SessionContext;
use rusqlite::{OptionalExtension, params};
use std::collections::HashMap;

/// A team member without credential material
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl Tracker {
    /// Assign a member to a project. Duplicate assignment of the same
    /// pair is a DuplicateKey error.
    pub fn add_member_to_project(
        &mut self,
        session: &SessionContext,
        project_id: i64,
        member_id: i64,
    ) -> Result<i64> {
        let project = self.project_row(project_id)?;
        self.require_roster(session, &project)?;

        let member_exists: Option<i64> = self
            .db
            .conn()
            .query_row(
                "SELECT id FROM team_members WHERE id = ?1",
                params![member_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| TrackerError::storage_with_source("failed to check member", e))?;
        if member_exists.is_none() {
            return Err(TrackerError::not_found(format!("team member {member_id}")));
        }

        let tx = self
            .db
            .conn_mut()
            .transaction()
            .map_err(|e| TrackerError::storage_with_source("failed to begin transaction", e))?;

        let already: Option<i64> = tx
            .query_row(
                "SELECT id FROM project_members WHERE project_id = ?1 AND member_id = ?2",
                params![project_id, member_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| TrackerError::storage_with_source("failed to check membership", e))?;
        if already.is_some() {
            return Err(TrackerError::duplicate_key(
                "member is already assigned to this project",
            ));
        }

        tx.execute(
            "INSERT INTO project_members (project_id, member_id) VALUES (?1, ?2)",
            params![project_id, member_id],
        )
        .map_err(|e| {
            map_insert_conflict(
                e,
                "member is already assigned to this project",
                "failed to insert membership",
            )
        })?;
        let id = tx.last_insert_rowid();

        tx.commit()
            .map_err(|e| TrackerError::storage_with_source("failed to commit", e))?;

        self.maps.invalidate(project_id, EntityKind::Member);
        tracing::info!(project_id, member_id, "assigned member to project");
        Ok(id)
    }

    /// Remove a member from a project.
    ///
    /// Blocked while the member still has unfinished tasks there; those
    /// must be reassigned or completed first.
    pub fn remove_member_from_project(
        &mut self,
        session: &SessionContext,
        project_id: i64,
        member_id: i64,
    ) -> Result<()> {
        let project = self.project_row(project_id)?;
        self.require_roster(session, &project)?;

        let tx = self
            .db
            .conn_mut()
            .transaction()
            .map_err(|e| TrackerError::storage_with_source("failed to begin transaction", e))?;

        let open_tasks: i64 = tx
            .query_row(
                r#"
                SELECT COUNT(*) FROM tasks
                WHERE project_id = ?1 AND assigned_to_id = ?2 AND status <> 'Done'
                "#,
                params![project_id, member_id],
                |row| row.get(0),
            )
            .map_err(|e| TrackerError::storage_with_source("failed to count open tasks", e))?;
        if open_tasks > 0 {
            return Err(TrackerError::validation(format!(
                "member still has {open_tasks} unfinished task(s) in this project"
            )));
        }

        let removed = tx
            .execute(
                "DELETE FROM project_members WHERE project_id = ?1 AND member_id = ?2",
                params![project_id, member_id],
            )
            .map_err(|e| TrackerError::storage_with_source("failed to delete membership", e))?;
        if removed == 0 {
            return Err(TrackerError::not_found(format!(
                "member {member_id} is not assigned to project {project_id}"
            )));
        }

        tx.commit()
            .map_err(|e| TrackerError::storage_with_source("failed to commit", e))?;

        self.maps.invalidate(project_id, EntityKind::Member);
        tracing::info!(project_id, member_id, "removed member from project");
        Ok(())
    }

    /// Members of a project, by name
    pub fn list_project_members(
        &self,
        session: &SessionContext,
        project_id: i64,
    ) -> Result<Vec<MemberProfile>> {
        let project = self.project_row(project_id)?;
        self.require_view(session, &project)?;

        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(
                r#"
                SELECT m.id, m.name, m.email
                FROM team_members m
                JOIN project_members pm ON pm.member_id = m.id
                WHERE pm.project_id = ?1
                ORDER BY m.name, m.id
                "#,
            )
            .map_err(|e| TrackerError::storage_with_source("failed to prepare query", e))?;
        let rows = stmt
            .query_map(params![project_id], |row| {
                Ok(MemberProfile {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                })
            })
            .map_err(|e| TrackerError::storage_with_source("failed to list members", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TrackerError::storage_with_source("failed to read member row", e))?;

        Ok(rows)
    }

    /// Resolve a member name to an id inside a project, via the cached
    /// name map. Names repeat across members; the latest row wins, same
    /// as the map the lookup serves.
    pub fn resolve_member_id(
        &mut self,
        session: &SessionContext,
        project_id: i64,
        name: &str,
    ) -> Result<i64> {
        let project = self.project_row(project_id)?;
        self.require_view(session, &project)?;

        let db = &self.db;
        let map = self
            .maps
            .get_or_load(project_id, EntityKind::Member, || {
                member_name_map(db, project_id)
            })?;
        map.get(name).copied().ok_or_else(|| {
            TrackerError::not_found(format!("no member named '{name}' in this project"))
        })
    }
}

fn member_name_map(db: &Db, project_id: i64) -> Result<HashMap<String, i64>> {
    let conn = db.conn();
    let mut stmt = conn
        .prepare(
            r#"
            SELECT m.name, m.id
            FROM team_members m
            JOIN project_members pm ON pm.member_id = m.id
            WHERE pm.project_id = ?1
            ORDER BY m.id
            "#,
        )
        .map_err(|e| TrackerError::storage_with_source("failed to prepare query", e))?;
    let rows = stmt
        .query_map(params![project_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })
        .map_err(|e| TrackerError::storage_with_source("failed to load member map", e))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| TrackerError::storage_with_source("failed to read member row", e))?;

    Ok(rows.into_iter().collect())
}
