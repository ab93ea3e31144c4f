//! Dashboard aggregations: status tallies, timeliness, team progress,
//! and the recent-activity feed. Numbers only; rendering is external.

use super::Tracker;
use crate::db;
use crate::errors::{Result, TrackerError};
use crate::session::SessionContext;
use chrono::{DateTime, Utc};
use rusqlite::params;

/// Task counts per status for one project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub to_do: i64,
    pub in_progress: i64,
    pub done: i64,
    pub blocked: i64,
}

impl StatusCounts {
    pub fn total(&self) -> i64 {
        self.to_do + self.in_progress + self.done + self.blocked
    }
}

/// On-time vs late split of completed tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timeliness {
    pub on_time: i64,
    pub late: i64,
}

/// Per-member standing inside a project
#[derive(Debug, Clone)]
pub struct MemberProgress {
    pub member_id: i64,
    pub member_name: String,
    pub total_tasks: i64,
    pub done_tasks: i64,
    pub open_issues: i64,
}

/// One entry of the recent-activity feed
#[derive(Debug, Clone)]
pub struct FeedItem {
    pub created_at: DateTime<Utc>,
    pub member_name: String,
    pub task_title: String,
    pub description: String,
    pub code_link: Option<String>,
    pub help_needed_summary: Option<String>,
}

impl Tracker {
    /// Task counts per status
    pub fn project_status_counts(
        &self,
        session: &SessionContext,
        project_id: i64,
    ) -> Result<StatusCounts> {
        let project = self.project_row(project_id)?;
        self.require_view(session, &project)?;

        self.db
            .conn()
            .query_row(
                r#"
                SELECT
                    COALESCE(SUM(CASE WHEN status = 'To Do' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = 'In Progress' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = 'Done' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = 'Blocked' THEN 1 ELSE 0 END), 0)
                FROM tasks
                WHERE project_id = ?1
                "#,
                params![project_id],
                |row| {
                    Ok(StatusCounts {
                        to_do: row.get(0)?,
                        in_progress: row.get(1)?,
                        done: row.get(2)?,
                        blocked: row.get(3)?,
                    })
                },
            )
            .map_err(|e| TrackerError::storage_with_source("failed to count task statuses", e))
    }

    /// On-time vs late completions. A task is on time when it was
    /// completed no later than its due date; only Done tasks with a
    /// completion date count.
    pub fn completion_timeliness(
        &self,
        session: &SessionContext,
        project_id: i64,
    ) -> Result<Timeliness> {
        let project = self.project_row(project_id)?;
        self.require_view(session, &project)?;

        self.db
            .conn()
            .query_row(
                r#"
                SELECT
                    COALESCE(SUM(CASE WHEN completion_date <= due_date THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN completion_date > due_date THEN 1 ELSE 0 END), 0)
                FROM tasks
                WHERE project_id = ?1 AND status = 'Done' AND completion_date IS NOT NULL
                "#,
                params![project_id],
                |row| {
                    Ok(Timeliness {
                        on_time: row.get(0)?,
                        late: row.get(1)?,
                    })
                },
            )
            .map_err(|e| TrackerError::storage_with_source("failed to compute timeliness", e))
    }

    /// Per-member task and open-issue tallies for a project, ordered by
    /// member name
    pub fn team_progress(
        &self,
        session: &SessionContext,
        project_id: i64,
    ) -> Result<Vec<MemberProgress>> {
        let project = self.project_row(project_id)?;
        self.require_view(session, &project)?;

        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(
                r#"
                SELECT m.id, m.name,
                       COUNT(t.id),
                       COALESCE(SUM(CASE WHEN t.status = 'Done' THEN 1 ELSE 0 END), 0),
                       (SELECT COUNT(*) FROM task_issues i
                        JOIN tasks ti ON ti.id = i.task_id
                        WHERE ti.project_id = ?1 AND i.member_id = m.id
                          AND i.status = 'Open')
                FROM team_members m
                JOIN project_members pm ON pm.member_id = m.id AND pm.project_id = ?1
                LEFT JOIN tasks t ON t.assigned_to_id = m.id AND t.project_id = ?1
                GROUP BY m.id, m.name
                ORDER BY m.name, m.id
                "#,
            )
            .map_err(|e| TrackerError::storage_with_source("failed to prepare query", e))?;
        let rows = stmt
            .query_map(params![project_id], |row| {
                Ok(MemberProgress {
                    member_id: row.get(0)?,
                    member_name: row.get(1)?,
                    total_tasks: row.get(2)?,
                    done_tasks: row.get(3)?,
                    open_issues: row.get(4)?,
                })
            })
            .map_err(|e| TrackerError::storage_with_source("failed to list team progress", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TrackerError::storage_with_source("failed to read progress row", e))?;

        Ok(rows)
    }

    /// Most recent progress updates of a project, newest first
    pub fn activity_feed(
        &self,
        session: &SessionContext,
        project_id: i64,
        limit: u32,
    ) -> Result<Vec<FeedItem>> {
        let project = self.project_row(project_id)?;
        self.require_view(session, &project)?;

        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(
                r#"
                SELECT u.created_at, m.name, t.title, u.description,
                       u.code_link, u.help_needed_summary
                FROM progress_updates u
                JOIN tasks t ON t.id = u.task_id
                JOIN team_members m ON m.id = u.member_id
                WHERE t.project_id = ?1
                ORDER BY u.created_at DESC, u.id DESC
                LIMIT ?2
                "#,
            )
            .map_err(|e| TrackerError::storage_with_source("failed to prepare query", e))?;
        let rows = stmt
            .query_map(params![project_id, limit], |row| {
                Ok(FeedItem {
                    created_at: db::datetime_col(row, 0)?,
                    member_name: row.get(1)?,
                    task_title: row.get(2)?,
                    description: row.get(3)?,
                    code_link: row.get(4)?,
                    help_needed_summary: row.get(5)?,
                })
            })
            .map_err(|e| TrackerError::storage_with_source("failed to load feed", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TrackerError::storage_with_source("failed to read feed row", e))?;

        Ok(rows)
    }
}
