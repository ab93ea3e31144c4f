//! Tasks: creation, status lifecycle, and listings

use super::Tracker;
use crate::cache::EntityKind;
use crate::db::{self, Db};
use crate::errors::{Result, TrackerError};
use crate::model::{Role, Task, TaskStatus};
use crate::session::SessionContext;
use chrono::{NaiveDate, Utc};
use rusqlite::{OptionalExtension, Row, params};
use std::collections::HashMap;

/// Input for task creation
#[derive(Debug, Clone)]
pub struct NewTask {
    pub sprint_id: Option<i64>,
    pub requirement_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub assigned_to_id: i64,
    pub due_date: NaiveDate,
}

/// A task joined with the names around it, for listings
#[derive(Debug, Clone)]
pub struct TaskOverview {
    pub task: Task,
    pub project_name: String,
    pub sprint_name: Option<String>,
    pub requirement_title: Option<String>,
    pub assignee_name: String,
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        project_id: row.get(1)?,
        sprint_id: row.get(2)?,
        requirement_id: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        assigned_to_id: row.get(6)?,
        status: db::enum_col(row, 7, "task status", TaskStatus::parse)?,
        due_date: db::date_col(row, 8)?,
        completion_date: db::opt_date_col(row, 9)?,
    })
}

fn overview_from_row(row: &Row<'_>) -> rusqlite::Result<TaskOverview> {
    Ok(TaskOverview {
        task: task_from_row(row)?,
        project_name: row.get(10)?,
        sprint_name: row.get(11)?,
        requirement_title: row.get(12)?,
        assignee_name: row.get(13)?,
    })
}

const TASK_COLS: &str = "id, project_id, sprint_id, requirement_id, title, description, \
                         assigned_to_id, status, due_date, completion_date";

const OVERVIEW_SQL: &str = r#"
SELECT t.id, t.project_id, t.sprint_id, t.requirement_id, t.title, t.description,
       t.assigned_to_id, t.status, t.due_date, t.completion_date,
       p.name, s.name, r.title, m.name
FROM tasks t
JOIN projects p ON p.id = t.project_id
LEFT JOIN sprints s ON s.id = t.sprint_id
LEFT JOIN requirements r ON r.id = t.requirement_id
JOIN team_members m ON m.id = t.assigned_to_id
"#;

impl Tracker {
    /// Create a task (managing role).
    ///
    /// The assignee must already hold a membership in the project, and
    /// any sprint or requirement link must point inside the same
    /// project. New tasks start in To Do with no completion date.
    pub fn create_task(
        &mut self,
        session: &SessionContext,
        project_id: i64,
        task: NewTask,
    ) -> Result<i64> {
        let project = self.project_row(project_id)?;
        self.require_manage(session, &project)?;
        Self::require_non_empty(&task.title, "task title")?;
        Self::require_non_empty(&task.description, "task description")?;

        if !self.membership_exists(project_id, task.assigned_to_id)? {
            return Err(TrackerError::validation(
                "assignee is not a member of this project",
            ));
        }
        if let Some(sprint_id) = task.sprint_id {
            let sprint = self.sprint_row(sprint_id)?;
            if sprint.project_id != project_id {
                return Err(TrackerError::validation(
                    "sprint belongs to a different project",
                ));
            }
        }
        if let Some(requirement_id) = task.requirement_id {
            let requirement = self.requirement_row(requirement_id)?;
            if requirement.project_id != project_id {
                return Err(TrackerError::validation(
                    "requirement belongs to a different project",
                ));
            }
        }

        self.db
            .conn()
            .execute(
                r#"
                INSERT INTO tasks
                    (project_id, sprint_id, requirement_id, title, description,
                     assigned_to_id, status, due_date)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    project_id,
                    task.sprint_id,
                    task.requirement_id,
                    task.title,
                    task.description,
                    task.assigned_to_id,
                    TaskStatus::ToDo.as_str(),
                    db::date_to_sql(task.due_date),
                ],
            )
            .map_err(|e| TrackerError::storage_with_source("failed to insert task", e))?;
        let id = self.db.conn().last_insert_rowid();

        self.maps.invalidate(project_id, EntityKind::Task);
        tracing::info!(id, project_id, title = task.title, "created task");
        Ok(id)
    }

    /// Move a task to a new status.
    ///
    /// Permitted to the assignee and to the managing role. The
    /// completion date is written in the same statement as the status:
    /// Done stamps today, every other status clears it. Concurrent
    /// writers are last-write-wins.
    pub fn update_task_status(
        &mut self,
        session: &SessionContext,
        task_id: i64,
        status: TaskStatus,
    ) -> Result<Task> {
        let task = self.task_row(task_id)?;
        let principal = session.require_principal()?;
        match principal.role {
            Role::TeamMember => {
                if task.assigned_to_id != principal.id {
                    return Err(TrackerError::authorization(
                        "only the assignee may update this task",
                    ));
                }
            }
            Role::ProjectManager | Role::SuperAdmin => {
                let project = self.project_row(task.project_id)?;
                self.require_manage(session, &project)?;
            }
        }

        let today = db::date_to_sql(Utc::now().date_naive());
        self.db
            .conn()
            .execute(
                r#"
                UPDATE tasks
                SET status = ?2,
                    completion_date = CASE WHEN ?2 = 'Done' THEN ?3 ELSE NULL END
                WHERE id = ?1
                "#,
                params![task_id, status.as_str(), today],
            )
            .map_err(|e| TrackerError::storage_with_source("failed to update task status", e))?;

        if task.status != status {
            tracing::debug!(
                task_id,
                from = task.status.as_str(),
                to = status.as_str(),
                "task status changed"
            );
        }

        self.task_row(task_id)
    }

    /// The logged-in member's tasks across all projects, grouped by
    /// sprint schedule then due date
    pub fn my_tasks(&self, session: &SessionContext) -> Result<Vec<TaskOverview>> {
        let principal = session.require_principal()?;
        if principal.role != Role::TeamMember {
            return Err(TrackerError::authorization(
                "only a team member has a personal task list",
            ));
        }

        let sql = format!(
            "{OVERVIEW_SQL} WHERE t.assigned_to_id = ?1
             ORDER BY (s.end_date IS NULL), s.end_date, t.due_date, t.id"
        );
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| TrackerError::storage_with_source("failed to prepare query", e))?;
        let rows = stmt
            .query_map(params![principal.id], overview_from_row)
            .map_err(|e| TrackerError::storage_with_source("failed to list tasks", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TrackerError::storage_with_source("failed to read task row", e))?;

        Ok(rows)
    }

    /// Every task of a project with its display names
    pub fn list_project_tasks(
        &self,
        session: &SessionContext,
        project_id: i64,
    ) -> Result<Vec<TaskOverview>> {
        let project = self.project_row(project_id)?;
        self.require_view(session, &project)?;

        let sql = format!(
            "{OVERVIEW_SQL} WHERE t.project_id = ?1
             ORDER BY (s.end_date IS NULL), s.end_date, t.due_date, t.id"
        );
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| TrackerError::storage_with_source("failed to prepare query", e))?;
        let rows = stmt
            .query_map(params![project_id], overview_from_row)
            .map_err(|e| TrackerError::storage_with_source("failed to list tasks", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TrackerError::storage_with_source("failed to read task row", e))?;

        Ok(rows)
    }

    /// One task, visibility-checked through its project
    pub fn get_task(&self, session: &SessionContext, task_id: i64) -> Result<Task> {
        let task = self.task_row(task_id)?;
        let project = self.project_row(task.project_id)?;
        self.require_view(session, &project)?;
        Ok(task)
    }

    /// Resolve a task title to an id via the cached name map
    pub fn resolve_task_id(
        &mut self,
        session: &SessionContext,
        project_id: i64,
        title: &str,
    ) -> Result<i64> {
        let project = self.project_row(project_id)?;
        self.require_view(session, &project)?;

        let db = &self.db;
        let map = self.maps.get_or_load(project_id, EntityKind::Task, || {
            task_title_map(db, project_id)
        })?;
        map.get(title).copied().ok_or_else(|| {
            TrackerError::not_found(format!("no task titled '{title}' in this project"))
        })
    }

    pub(crate) fn task_row(&self, task_id: i64) -> Result<Task> {
        self.db
            .conn()
            .query_row(
                &format!("SELECT {TASK_COLS} FROM tasks WHERE id = ?1"),
                params![task_id],
                task_from_row,
            )
            .optional()
            .map_err(|e| TrackerError::storage_with_source("failed to load task", e))?
            .ok_or_else(|| TrackerError::not_found(format!("task {task_id}")))
    }
}

fn task_title_map(db: &Db, project_id: i64) -> Result<HashMap<String, i64>> {
    let conn = db.conn();
    let mut stmt = conn
        .prepare("SELECT title, id FROM tasks WHERE project_id = ?1 ORDER BY id")
        .map_err(|e| TrackerError::storage_with_source("failed to prepare query", e))?;
    let rows = stmt
        .query_map(params![project_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })
        .map_err(|e| TrackerError::storage_with_source("failed to load task map", e))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| TrackerError::storage_with_source("failed to read task row", e))?;

    Ok(rows.into_iter().collect())
}
