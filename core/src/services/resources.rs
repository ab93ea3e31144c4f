//! Shared reference material attached to a project: links to docs,
//! repositories, design notes. Managed by the manager tier, readable
//! by everyone on the project.

use super::Tracker;
use crate::errors::{Result, TrackerError};
use crate::model::Resource;
use crate::session::SessionContext;
use rusqlite::params;

fn resource_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Resource> {
    Ok(Resource {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        link: row.get(3)?,
        description: row.get(4)?,
    })
}

const RESOURCE_COLS: &str = "id, project_id, title, link, description";

impl Tracker {
    /// Attach a resource link to a project
    pub fn add_resource(
        &mut self,
        session: &SessionContext,
        project_id: i64,
        title: &str,
        link: &str,
        description: Option<&str>,
    ) -> Result<Resource> {
        let project = self.project_row(project_id)?;
        self.require_manage(session, &project)?;
        Self::require_non_empty(title, "resource title")?;
        Self::require_non_empty(link, "resource link")?;

        self.db
            .conn()
            .execute(
                r#"
                INSERT INTO resources (project_id, title, link, description)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![project_id, title, link, description],
            )
            .map_err(|e| TrackerError::storage_with_source("failed to add resource", e))?;
        let id = self.db.conn().last_insert_rowid();
        tracing::debug!(resource_id = id, project_id, "resource added");

        Ok(Resource {
            id,
            project_id,
            title: title.to_string(),
            link: link.to_string(),
            description: description.map(str::to_string),
        })
    }

    /// All resources of a project, oldest first
    pub fn list_resources(
        &self,
        session: &SessionContext,
        project_id: i64,
    ) -> Result<Vec<Resource>> {
        let project = self.project_row(project_id)?;
        self.require_view(session, &project)?;

        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {RESOURCE_COLS} FROM resources WHERE project_id = ?1 ORDER BY id"
            ))
            .map_err(|e| TrackerError::storage_with_source("failed to prepare query", e))?;
        let rows = stmt
            .query_map(params![project_id], resource_from_row)
            .map_err(|e| TrackerError::storage_with_source("failed to list resources", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TrackerError::storage_with_source("failed to read resource row", e))?;

        Ok(rows)
    }

    /// Remove a resource. Rights are checked against the project the
    /// resource belongs to.
    pub fn delete_resource(&mut self, session: &SessionContext, resource_id: i64) -> Result<()> {
        let resource = self
            .db
            .conn()
            .query_row(
                &format!("SELECT {RESOURCE_COLS} FROM resources WHERE id = ?1"),
                params![resource_id],
                resource_from_row,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    TrackerError::not_found(format!("resource {resource_id} does not exist"))
                }
                other => TrackerError::storage_with_source("failed to load resource", other),
            })?;
        let project = self.project_row(resource.project_id)?;
        self.require_manage(session, &project)?;

        self.db
            .conn()
            .execute("DELETE FROM resources WHERE id = ?1", params![resource_id])
            .map_err(|e| TrackerError::storage_with_source("failed to delete resource", e))?;
        tracing::debug!(resource_id, "resource deleted");

        Ok(())
    }
}
