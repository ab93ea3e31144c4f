//! Progress updates and weekly activity logs, both append-only

use super::Tracker;
use crate::db;
use crate::errors::{Result, TrackerError};
use crate::model::{ProgressUpdate, Role, TaskStatus, WeeklyActivity};
use crate::session::SessionContext;
use chrono::{NaiveDate, Utc};
use rusqlite::{Row, params};

/// Input for a progress update
#[derive(Debug, Clone, Default)]
pub struct ProgressInput {
    pub description: String,
    pub code_link: Option<String>,
    pub help_needed_summary: Option<String>,
    pub eta_to_complete: Option<NaiveDate>,
}

fn update_from_row(row: &Row<'_>) -> rusqlite::Result<ProgressUpdate> {
    Ok(ProgressUpdate {
        id: row.get(0)?,
        task_id: row.get(1)?,
        member_id: row.get(2)?,
        description: row.get(3)?,
        code_link: row.get(4)?,
        help_needed_summary: row.get(5)?,
        eta_to_complete: db::opt_date_col(row, 6)?,
        created_at: db::datetime_col(row, 7)?,
    })
}

const UPDATE_COLS: &str = "id, task_id, member_id, description, code_link, \
                           help_needed_summary, eta_to_complete, created_at";

impl Tracker {
    /// Append a progress update to one of your own active tasks
    pub fn submit_progress_update(
        &mut self,
        session: &SessionContext,
        task_id: i64,
        input: ProgressInput,
    ) -> Result<i64> {
        let principal = session.require_principal()?;
        if principal.role != Role::TeamMember {
            return Err(TrackerError::authorization(
                "only a team member submits progress updates",
            ));
        }
        let task = self.task_row(task_id)?;
        if task.assigned_to_id != principal.id {
            return Err(TrackerError::authorization(
                "you may only report progress on tasks assigned to you",
            ));
        }
        if task.status == TaskStatus::Done {
            return Err(TrackerError::validation("task is already done"));
        }
        Self::require_non_empty(&input.description, "update description")?;

        let now = Utc::now().to_rfc3339();
        self.db
            .conn()
            .execute(
                r#"
                INSERT INTO progress_updates
                    (task_id, member_id, description, code_link, help_needed_summary,
                     eta_to_complete, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    task_id,
                    principal.id,
                    input.description,
                    input.code_link,
                    input.help_needed_summary,
                    input.eta_to_complete.map(db::date_to_sql),
                    now,
                ],
            )
            .map_err(|e| TrackerError::storage_with_source("failed to insert update", e))?;
        let id = self.db.conn().last_insert_rowid();

        tracing::debug!(id, task_id, "submitted progress update");
        Ok(id)
    }

    /// Append a weekly activity entry to one of your own tasks
    pub fn submit_weekly_activity(
        &mut self,
        session: &SessionContext,
        task_id: i64,
        activity_date: NaiveDate,
        description: &str,
    ) -> Result<i64> {
        let principal = session.require_principal()?;
        if principal.role != Role::TeamMember {
            return Err(TrackerError::authorization(
                "only a team member logs weekly activity",
            ));
        }
        let task = self.task_row(task_id)?;
        if task.assigned_to_id != principal.id {
            return Err(TrackerError::authorization(
                "you may only log activity on tasks assigned to you",
            ));
        }
        Self::require_non_empty(description, "activity description")?;

        self.db
            .conn()
            .execute(
                r#"
                INSERT INTO weekly_activities (task_id, member_id, activity_date, description)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    task_id,
                    principal.id,
                    db::date_to_sql(activity_date),
                    description
                ],
            )
            .map_err(|e| TrackerError::storage_with_source("failed to insert activity", e))?;
        let id = self.db.conn().last_insert_rowid();

        tracing::debug!(id, task_id, "logged weekly activity");
        Ok(id)
    }

    /// The logged-in member's latest progress updates, newest first
    pub fn my_recent_updates(
        &self,
        session: &SessionContext,
        limit: u32,
    ) -> Result<Vec<ProgressUpdate>> {
        let principal = session.require_principal()?;
        if principal.role != Role::TeamMember {
            return Err(TrackerError::authorization(
                "only a team member has a personal update history",
            ));
        }

        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {UPDATE_COLS} FROM progress_updates
                 WHERE member_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2"
            ))
            .map_err(|e| TrackerError::storage_with_source("failed to prepare query", e))?;
        let rows = stmt
            .query_map(params![principal.id, limit], update_from_row)
            .map_err(|e| TrackerError::storage_with_source("failed to list updates", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TrackerError::storage_with_source("failed to read update row", e))?;

        Ok(rows)
    }

    /// Activity log of a task, most recent activity date first
    pub fn task_activities(
        &self,
        session: &SessionContext,
        task_id: i64,
    ) -> Result<Vec<WeeklyActivity>> {
        let task = self.task_row(task_id)?;
        let project = self.project_row(task.project_id)?;
        self.require_view(session, &project)?;

        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(
                r#"
                SELECT id, task_id, member_id, activity_date, description
                FROM weekly_activities
                WHERE task_id = ?1
                ORDER BY activity_date DESC, id DESC
                "#,
            )
            .map_err(|e| TrackerError::storage_with_source("failed to prepare query", e))?;
        let rows = stmt
            .query_map(params![task_id], |row| {
                Ok(WeeklyActivity {
                    id: row.get(0)?,
                    task_id: row.get(1)?,
                    member_id: row.get(2)?,
                    activity_date: db::date_col(row, 3)?,
                    description: row.get(4)?,
                })
            })
            .map_err(|e| TrackerError::storage_with_source("failed to list activities", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TrackerError::storage_with_source("failed to read activity row", e))?;

        Ok(rows)
    }
}
