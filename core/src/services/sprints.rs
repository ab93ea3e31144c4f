//! Sprints and sprint/requirement planning

use super::Tracker;
use crate::cache::EntityKind;
use crate::db::{self, Db, map_insert_conflict};
use crate::errors::{Result, TrackerError};
use crate::model::{Requirement, Sprint};
use crate::session::SessionContext;
use chrono::NaiveDate;
use rusqlite::{OptionalExtension, Row, params};
use std::collections::HashMap;

/// Task tallies for a sprint dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SprintProgress {
    pub total_tasks: i64,
    pub done_tasks: i64,
}

impl SprintProgress {
    /// Done share of the sprint, or None for a sprint with no tasks.
    /// Never divides by zero; a neutral display is the caller's job.
    pub fn completion_ratio(&self) -> Option<f64> {
        if self.total_tasks == 0 {
            None
        } else {
            Some(self.done_tasks as f64 / self.total_tasks as f64)
        }
    }
}

fn sprint_from_row(row: &Row<'_>) -> rusqlite::Result<Sprint> {
    Ok(Sprint {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        goal: row.get(3)?,
        start_date: db::date_col(row, 4)?,
        end_date: db::date_col(row, 5)?,
    })
}

const SPRINT_COLS: &str = "id, project_id, name, goal, start_date, end_date";

impl Tracker {
    /// Create a sprint (managing role). The end date must not precede
    /// the start date.
    pub fn create_sprint(
        &mut self,
        session: &SessionContext,
        project_id: i64,
        name: &str,
        goal: Option<&str>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<i64> {
        let project = self.project_row(project_id)?;
        self.require_manage(session, &project)?;
        Self::require_non_empty(name, "sprint name")?;
        if end_date < start_date {
            return Err(TrackerError::validation(format!(
                "sprint end date {end_date} is before start date {start_date}"
            )));
        }

        self.db
            .conn()
            .execute(
                r#"
                INSERT INTO sprints (project_id, name, goal, start_date, end_date)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    project_id,
                    name,
                    goal,
                    db::date_to_sql(start_date),
                    db::date_to_sql(end_date)
                ],
            )
            .map_err(|e| TrackerError::storage_with_source("failed to insert sprint", e))?;
        let id = self.db.conn().last_insert_rowid();

        self.maps.invalidate(project_id, EntityKind::Sprint);
        tracing::info!(id, project_id, name, "created sprint");
        Ok(id)
    }

    /// Sprints of a project ordered by start date
    pub fn list_sprints(&self, session: &SessionContext, project_id: i64) -> Result<Vec<Sprint>> {
        let project = self.project_row(project_id)?;
        self.require_view(session, &project)?;

        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SPRINT_COLS} FROM sprints WHERE project_id = ?1 ORDER BY start_date, id"
            ))
            .map_err(|e| TrackerError::storage_with_source("failed to prepare query", e))?;
        let rows = stmt
            .query_map(params![project_id], sprint_from_row)
            .map_err(|e| TrackerError::storage_with_source("failed to list sprints", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TrackerError::storage_with_source("failed to read sprint row", e))?;

        Ok(rows)
    }

    /// Link a requirement into a sprint. Both must belong to the same
    /// project; the pair is unique.
    pub fn assign_requirement_to_sprint(
        &mut self,
        session: &SessionContext,
        sprint_id: i64,
        requirement_id: i64,
    ) -> Result<i64> {
        let sprint = self.sprint_row(sprint_id)?;
        let requirement = self.requirement_row(requirement_id)?;
        if requirement.project_id != sprint.project_id {
            return Err(TrackerError::validation(
                "requirement belongs to a different project than the sprint",
            ));
        }
        let project = self.project_row(sprint.project_id)?;
        self.require_manage(session, &project)?;

        let tx = self
            .db
            .conn_mut()
            .transaction()
            .map_err(|e| TrackerError::storage_with_source("failed to begin transaction", e))?;

        let already: Option<i64> = tx
            .query_row(
                "SELECT id FROM sprint_requirements WHERE sprint_id = ?1 AND requirement_id = ?2",
                params![sprint_id, requirement_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| TrackerError::storage_with_source("failed to check assignment", e))?;
        if already.is_some() {
            return Err(TrackerError::duplicate_key(
                "requirement is already assigned to this sprint",
            ));
        }

        tx.execute(
            "INSERT INTO sprint_requirements (sprint_id, requirement_id) VALUES (?1, ?2)",
            params![sprint_id, requirement_id],
        )
        .map_err(|e| {
            map_insert_conflict(
                e,
                "requirement is already assigned to this sprint",
                "failed to insert sprint assignment",
            )
        })?;
        let id = tx.last_insert_rowid();

        tx.commit()
            .map_err(|e| TrackerError::storage_with_source("failed to commit", e))?;

        tracing::info!(sprint_id, requirement_id, "assigned requirement to sprint");
        Ok(id)
    }

    /// Requirements already linked to a sprint
    pub fn sprint_requirements(
        &self,
        session: &SessionContext,
        sprint_id: i64,
    ) -> Result<Vec<Requirement>> {
        let sprint = self.sprint_row(sprint_id)?;
        let project = self.project_row(sprint.project_id)?;
        self.require_view(session, &project)?;

        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(
                r#"
                SELECT r.id, r.project_id, r.title, r.description, r.refined_description
                FROM requirements r
                JOIN sprint_requirements sr ON sr.requirement_id = r.id
                WHERE sr.sprint_id = ?1
                ORDER BY r.id
                "#,
            )
            .map_err(|e| TrackerError::storage_with_source("failed to prepare query", e))?;
        let rows = stmt
            .query_map(params![sprint_id], |row| {
                Ok(Requirement {
                    id: row.get(0)?,
                    project_id: row.get(1)?,
                    title: row.get(2)?,
                    description: row.get(3)?,
                    refined_description: row.get(4)?,
                })
            })
            .map_err(|e| TrackerError::storage_with_source("failed to list sprint requirements", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TrackerError::storage_with_source("failed to read requirement row", e))?;

        Ok(rows)
    }

    /// Project requirements not yet linked to the sprint (assignment
    /// candidates)
    pub fn unassigned_requirements(
        &self,
        session: &SessionContext,
        sprint_id: i64,
    ) -> Result<Vec<Requirement>> {
        let sprint = self.sprint_row(sprint_id)?;
        let project = self.project_row(sprint.project_id)?;
        self.require_view(session, &project)?;

        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(
                r#"
                SELECT r.id, r.project_id, r.title, r.description, r.refined_description
                FROM requirements r
                WHERE r.project_id = ?1
                  AND r.id NOT IN (
                      SELECT requirement_id FROM sprint_requirements WHERE sprint_id = ?2
                  )
                ORDER BY r.id
                "#,
            )
            .map_err(|e| TrackerError::storage_with_source("failed to prepare query", e))?;
        let rows = stmt
            .query_map(params![sprint.project_id, sprint_id], |row| {
                Ok(Requirement {
                    id: row.get(0)?,
                    project_id: row.get(1)?,
                    title: row.get(2)?,
                    description: row.get(3)?,
                    refined_description: row.get(4)?,
                })
            })
            .map_err(|e| TrackerError::storage_with_source("failed to list candidates", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TrackerError::storage_with_source("failed to read requirement row", e))?;

        Ok(rows)
    }

    /// Task tallies for the sprint dashboard
    pub fn sprint_progress(
        &self,
        session: &SessionContext,
        sprint_id: i64,
    ) -> Result<SprintProgress> {
        let sprint = self.sprint_row(sprint_id)?;
        let project = self.project_row(sprint.project_id)?;
        self.require_view(session, &project)?;

        let (total_tasks, done_tasks) = self
            .db
            .conn()
            .query_row(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(CASE WHEN status = 'Done' THEN 1 ELSE 0 END), 0)
                FROM tasks
                WHERE sprint_id = ?1
                "#,
                params![sprint_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|e| TrackerError::storage_with_source("failed to count sprint tasks", e))?;

        Ok(SprintProgress {
            total_tasks,
            done_tasks,
        })
    }

    /// Resolve a sprint name to an id via the cached name map
    pub fn resolve_sprint_id(
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
            .get_or_load(project_id, EntityKind::Sprint, || {
                sprint_name_map(db, project_id)
            })?;
        map.get(name).copied().ok_or_else(|| {
            TrackerError::not_found(format!("no sprint named '{name}' in this project"))
        })
    }

    pub(crate) fn sprint_row(&self, sprint_id: i64) -> Result<Sprint> {
        self.db
            .conn()
            .query_row(
                &format!("SELECT {SPRINT_COLS} FROM sprints WHERE id = ?1"),
                params![sprint_id],
                sprint_from_row,
            )
            .optional()
            .map_err(|e| TrackerError::storage_with_source("failed to load sprint", e))?
            .ok_or_else(|| TrackerError::not_found(format!("sprint {sprint_id}")))
    }
}

fn sprint_name_map(db: &Db, project_id: i64) -> Result<HashMap<String, i64>> {
    let conn = db.conn();
    let mut stmt = conn
        .prepare("SELECT name, id FROM sprints WHERE project_id = ?1 ORDER BY id")
        .map_err(|e| TrackerError::storage_with_source("failed to prepare query", e))?;
    let rows = stmt
        .query_map(params![project_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })
        .map_err(|e| TrackerError::storage_with_source("failed to load sprint map", e))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| TrackerError::storage_with_source("failed to read sprint row", e))?;

    Ok(rows.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_is_none_for_empty_sprint() {
        let progress = SprintProgress {
            total_tasks: 0,
            done_tasks: 0,
        };
        assert_eq!(progress.completion_ratio(), None);
    }

    #[test]
    fn ratio_is_done_over_total() {
        let progress = SprintProgress {
            total_tasks: 4,
            done_tasks: 3,
        };
        assert_eq!(progress.completion_ratio(), Some(0.75));
    }
}
