//! Requirements and their assistant-refined descriptions

use super::Tracker;
use crate::cache::EntityKind;
use crate::db::Db;
use crate::errors::{Result, TrackerError};
use crate::model::Requirement;
use crate::session::SessionContext;
use rusqlite::{OptionalExtension, Row, params};
use std::collections::HashMap;

fn requirement_from_row(row: &Row<'_>) -> rusqlite::Result<Requirement> {
    Ok(Requirement {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        refined_description: row.get(4)?,
    })
}

const REQUIREMENT_COLS: &str = "id, project_id, title, description, refined_description";

impl Tracker {
    /// Add a requirement to a project (managing role)
    pub fn add_requirement(
        &mut self,
        session: &SessionContext,
        project_id: i64,
        title: &str,
        description: &str,
    ) -> Result<i64> {
        let project = self.project_row(project_id)?;
        self.require_manage(session, &project)?;
        Self::require_non_empty(title, "requirement title")?;
        Self::require_non_empty(description, "requirement description")?;

        self.db
            .conn()
            .execute(
                "INSERT INTO requirements (project_id, title, description) VALUES (?1, ?2, ?3)",
                params![project_id, title, description],
            )
            .map_err(|e| TrackerError::storage_with_source("failed to insert requirement", e))?;
        let id = self.db.conn().last_insert_rowid();

        self.maps.invalidate(project_id, EntityKind::Requirement);
        tracing::info!(id, project_id, title, "added requirement");
        Ok(id)
    }

    /// Requirements of a project in creation order
    pub fn list_requirements(
        &self,
        session: &SessionContext,
        project_id: i64,
    ) -> Result<Vec<Requirement>> {
        let project = self.project_row(project_id)?;
        self.require_view(session, &project)?;

        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {REQUIREMENT_COLS} FROM requirements WHERE project_id = ?1 ORDER BY id"
            ))
            .map_err(|e| TrackerError::storage_with_source("failed to prepare query", e))?;
        let rows = stmt
            .query_map(params![project_id], requirement_from_row)
            .map_err(|e| TrackerError::storage_with_source("failed to list requirements", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TrackerError::storage_with_source("failed to read requirement row", e))?;

        Ok(rows)
    }

    /// One requirement, visibility-checked through its project
    pub fn get_requirement(
        &self,
        session: &SessionContext,
        requirement_id: i64,
    ) -> Result<Requirement> {
        let requirement = self.requirement_row(requirement_id)?;
        let project = self.project_row(requirement.project_id)?;
        self.require_view(session, &project)?;
        Ok(requirement)
    }

    /// Durably save a reviewed refinement draft.
    ///
    /// This is the only write path for refined text: streamed drafts stay
    /// in the caller's hands until they land here, possibly edited.
    pub fn save_refined_description(
        &mut self,
        session: &SessionContext,
        requirement_id: i64,
        refined: &str,
    ) -> Result<()> {
        let requirement = self.requirement_row(requirement_id)?;
        let project = self.project_row(requirement.project_id)?;
        self.require_manage(session, &project)?;
        Self::require_non_empty(refined, "refined description")?;

        self.db
            .conn()
            .execute(
                "UPDATE requirements SET refined_description = ?2 WHERE id = ?1",
                params![requirement_id, refined],
            )
            .map_err(|e| {
                TrackerError::storage_with_source("failed to save refined description", e)
            })?;

        tracing::info!(
            requirement_id,
            chars = refined.len(),
            "saved refined description"
        );
        Ok(())
    }

    /// Resolve a requirement title to an id via the cached name map
    pub fn resolve_requirement_id(
        &mut self,
        session: &SessionContext,
        project_id: i64,
        title: &str,
    ) -> Result<i64> {
        let project = self.project_row(project_id)?;
        self.require_view(session, &project)?;

        let db = &self.db;
        let map = self
            .maps
            .get_or_load(project_id, EntityKind::Requirement, || {
                requirement_title_map(db, project_id)
            })?;
        map.get(title).copied().ok_or_else(|| {
            TrackerError::not_found(format!("no requirement titled '{title}' in this project"))
        })
    }

    pub(crate) fn requirement_row(&self, requirement_id: i64) -> Result<Requirement> {
        self.db
            .conn()
            .query_row(
                &format!("SELECT {REQUIREMENT_COLS} FROM requirements WHERE id = ?1"),
                params![requirement_id],
                requirement_from_row,
            )
            .optional()
            .map_err(|e| TrackerError::storage_with_source("failed to load requirement", e))?
            .ok_or_else(|| TrackerError::not_found(format!("requirement {requirement_id}")))
    }
}

fn requirement_title_map(db: &Db, project_id: i64) -> Result<HashMap<String, i64>> {
    let conn = db.conn();
    let mut stmt = conn
        .prepare("SELECT title, id FROM requirements WHERE project_id = ?1 ORDER BY id")
        .map_err(|e| TrackerError::storage_with_source("failed to prepare query", e))?;
    let rows = stmt
        .query_map(params![project_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })
        .map_err(|e| TrackerError::storage_with_source("failed to load requirement map", e))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| TrackerError::storage_with_source("failed to read requirement row", e))?;

    Ok(rows.into_iter().collect())
}
