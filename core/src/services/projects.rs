//! Project lifecycle and visibility

use super::Tracker;
use crate::config::DeploymentProfile;
use crate::db::map_insert_conflict;
use crate::errors::{Result, TrackerError};
use crate::model::{Project, Role};
use crate::session::SessionContext;
use rusqlite::{OptionalExtension, params};

impl Tracker {
    /// Create a project.
    ///
    /// A super-admin may create with any manager or none; a manager may
    /// only create projects owned by themselves (pass their own id or
    /// None, which claims the project for them). Project names are
    /// unique store-wide.
    pub fn create_project(
        &mut self,
        session: &SessionContext,
        name: &str,
        description: &str,
        manager_id: Option<i64>,
    ) -> Result<i64> {
        let principal = self.require_admin_tier(session)?;
        Self::require_non_empty(name, "project name")?;
        Self::require_non_empty(description, "project description")?;

        // The admin tier leaves only two roles here.
        let manager_id = if principal.role == Role::SuperAdmin {
            manager_id
        } else {
            match manager_id {
                None => Some(principal.id),
                Some(id) if id == principal.id => Some(id),
                Some(_) => {
                    return Err(TrackerError::authorization(
                        "a manager may only create projects they own",
                    ));
                }
            }
        };

        if self.profile == DeploymentProfile::TwoRole && manager_id.is_some() {
            return Err(TrackerError::validation(
                "the two-role deployment profile has no project managers",
            ));
        }

        if let Some(id) = manager_id {
            let exists: Option<i64> = self
                .db
                .conn()
                .query_row(
                    "SELECT id FROM project_managers WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| TrackerError::storage_with_source("failed to check manager", e))?;
            if exists.is_none() {
                return Err(TrackerError::not_found(format!("project manager {id}")));
            }
        }

        let tx = self
            .db
            .conn_mut()
            .transaction()
            .map_err(|e| TrackerError::storage_with_source("failed to begin transaction", e))?;

        // Optimistic pre-check; the unique constraint below remains the
        // final authority under concurrent creates.
        let taken: Option<i64> = tx
            .query_row(
                "SELECT id FROM projects WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| TrackerError::storage_with_source("failed to check project name", e))?;
        if taken.is_some() {
            return Err(TrackerError::duplicate_key(format!(
                "a project named '{name}' already exists"
            )));
        }

        tx.execute(
            "INSERT INTO projects (name, description, manager_id) VALUES (?1, ?2, ?3)",
            params![name, description, manager_id],
        )
        .map_err(|e| {
            map_insert_conflict(
                e,
                format!("a project named '{name}' already exists"),
                "failed to insert project",
            )
        })?;
        let id = tx.last_insert_rowid();

        tx.commit()
            .map_err(|e| TrackerError::storage_with_source("failed to commit", e))?;

        tracing::info!(id, name, ?manager_id, "created project");
        Ok(id)
    }

    /// Projects inside the principal's visibility scope, by name
    pub fn list_projects(&self, session: &SessionContext) -> Result<Vec<Project>> {
        let principal = session.require_principal()?;

        let (sql, bind): (&str, Option<i64>) = match principal.role {
            Role::SuperAdmin => (
                "SELECT id, name, description, problem_statement, manager_id
                 FROM projects ORDER BY name",
                None,
            ),
            Role::ProjectManager => (
                "SELECT id, name, description, problem_statement, manager_id
                 FROM projects WHERE manager_id = ?1 ORDER BY name",
                Some(principal.id),
            ),
            Role::TeamMember => (
                "SELECT p.id, p.name, p.description, p.problem_statement, p.manager_id
                 FROM projects p
                 JOIN project_members pm ON pm.project_id = p.id
                 WHERE pm.member_id = ?1 ORDER BY p.name",
                Some(principal.id),
            ),
        };

        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| TrackerError::storage_with_source("failed to prepare query", e))?;

        let map_row = |row: &rusqlite::Row<'_>| {
            Ok(Project {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                problem_statement: row.get(3)?,
                manager_id: row.get(4)?,
            })
        };

        let rows = match bind {
            Some(id) => stmt.query_map(params![id], map_row),
            None => stmt.query_map([], map_row),
        }
        .map_err(|e| TrackerError::storage_with_source("failed to list projects", e))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| TrackerError::storage_with_source("failed to read project row", e))?;

        Ok(rows)
    }

    /// One project, visibility-checked
    pub fn get_project(&self, session: &SessionContext, project_id: i64) -> Result<Project> {
        let project = self.project_row(project_id)?;
        self.require_view(session, &project)?;
        Ok(project)
    }

    /// Save the project problem statement (managing role).
    ///
    /// The statement grounds every assistant refinement for the project.
    pub fn set_problem_statement(
        &mut self,
        session: &SessionContext,
        project_id: i64,
        statement: &str,
    ) -> Result<()> {
        let project = self.project_row(project_id)?;
        self.require_manage(session, &project)?;
        Self::require_non_empty(statement, "problem statement")?;

        self.db
            .conn()
            .execute(
                "UPDATE projects SET problem_statement = ?2 WHERE id = ?1",
                params![project_id, statement],
            )
            .map_err(|e| {
                TrackerError::storage_with_source("failed to update problem statement", e)
            })?;

        tracing::debug!(project_id, "saved problem statement");
        Ok(())
    }

    /// Delete a project and every row under it, in one transaction.
    ///
    /// A super-admin may delete any project; a manager only their own.
    pub fn delete_project(&mut self, session: &SessionContext, project_id: i64) -> Result<()> {
        let project = self.project_row(project_id)?;
        let principal = session.require_principal()?;
        let allowed = match principal.role {
            Role::SuperAdmin => true,
            Role::ProjectManager => project.manager_id == Some(principal.id),
            Role::TeamMember => false,
        };
        if !allowed {
            return Err(TrackerError::authorization(format!(
                "no rights to delete project '{}'",
                project.name
            )));
        }

        let tx = self
            .db
            .conn_mut()
            .transaction()
            .map_err(|e| TrackerError::storage_with_source("failed to begin transaction", e))?;
        // Children go with the project via foreign-key cascades.
        tx.execute("DELETE FROM projects WHERE id = ?1", params![project_id])
            .map_err(|e| TrackerError::storage_with_source("failed to delete project", e))?;
        tx.commit()
            .map_err(|e| TrackerError::storage_with_source("failed to commit", e))?;

        self.maps.invalidate_project(project_id);
        tracing::info!(project_id, name = project.name, "deleted project");
        Ok(())
    }
}
