//! Task issues and responses
//!
//! Issue lifecycle is a two-state machine: raised Open, moved to
//! Resolved only by a response carrying the explicit resolve flag.
//! Responding without the flag leaves the issue Open; there is no
//! reopen, a new issue is raised instead.

use super::Tracker;
use crate::db;
use crate::errors::{Result, TrackerError};
use crate::model::{HintType, IssueResponse, IssueStatus, IssueType, Role, TaskIssue, TaskStatus};
use crate::session::SessionContext;
use chrono::Utc;
use rusqlite::{OptionalExtension, Row, params};

/// An issue joined with its task and reporter names, for manager queues
#[derive(Debug, Clone)]
pub struct IssueOverview {
    pub issue: TaskIssue,
    pub task_title: String,
    pub member_name: String,
}

/// An issue joined with its task title, for the reporter's history
#[derive(Debug, Clone)]
pub struct MyIssue {
    pub issue: TaskIssue,
    pub task_title: String,
}

/// Input for responding to an issue
#[derive(Debug, Clone)]
pub struct ResponseInput {
    pub response_text: String,
    /// Newline-delimited URL list
    pub reference_links: Option<String>,
    pub hint_type: HintType,
    /// Atomically move the issue to Resolved with this response
    pub resolve: bool,
}

fn issue_from_row(row: &Row<'_>) -> rusqlite::Result<TaskIssue> {
    Ok(TaskIssue {
        id: row.get(0)?,
        task_id: row.get(1)?,
        member_id: row.get(2)?,
        issue_type: db::enum_col(row, 3, "issue type", IssueType::parse)?,
        description: row.get(4)?,
        request_1_on_1: row.get(5)?,
        status: db::enum_col(row, 6, "issue status", IssueStatus::parse)?,
        created_at: db::datetime_col(row, 7)?,
    })
}

fn response_from_row(row: &Row<'_>) -> rusqlite::Result<IssueResponse> {
    Ok(IssueResponse {
        id: row.get(0)?,
        issue_id: row.get(1)?,
        responder_id: row.get(2)?,
        response_text: row.get(3)?,
        reference_links: row.get(4)?,
        hint_type: db::enum_col(row, 5, "hint type", HintType::parse)?,
        created_at: db::datetime_col(row, 6)?,
    })
}

const ISSUE_COLS: &str =
    "id, task_id, member_id, issue_type, description, request_1_on_1, status, created_at";

const RESPONSE_COLS: &str =
    "id, issue_id, responder_id, response_text, reference_links, hint_type, created_at";

impl Tracker {
    /// Raise an issue on one of your own unfinished tasks.
    pub fn raise_issue(
        &mut self,
        session: &SessionContext,
        task_id: i64,
        issue_type: IssueType,
        description: &str,
        request_1_on_1: bool,
    ) -> Result<i64> {
        let principal = session.require_principal()?;
        if principal.role != Role::TeamMember {
            return Err(TrackerError::authorization(
                "only a team member raises task issues",
            ));
        }
        let task = self.task_row(task_id)?;
        if task.assigned_to_id != principal.id {
            return Err(TrackerError::authorization(
                "you may only raise issues on tasks assigned to you",
            ));
        }
        if task.status == TaskStatus::Done {
            return Err(TrackerError::validation(
                "task is already done; raise a new issue on an active task",
            ));
        }
        Self::require_non_empty(description, "issue description")?;

        let now = Utc::now().to_rfc3339();
        self.db
            .conn()
            .execute(
                r#"
                INSERT INTO task_issues
                    (task_id, member_id, issue_type, description, request_1_on_1, status, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    task_id,
                    principal.id,
                    issue_type.as_str(),
                    description,
                    request_1_on_1,
                    IssueStatus::Open.as_str(),
                    now,
                ],
            )
            .map_err(|e| TrackerError::storage_with_source("failed to insert issue", e))?;
        let id = self.db.conn().last_insert_rowid();

        tracing::info!(
            id,
            task_id,
            issue_type = issue_type.as_str(),
            request_1_on_1,
            "raised issue"
        );
        Ok(id)
    }

    /// Open issues of a project for the manager queue.
    ///
    /// Meeting requests surface first, then creation order; pass
    /// `meeting_only` to restrict the queue to 1:1 requests.
    pub fn open_issues(
        &self,
        session: &SessionContext,
        project_id: i64,
        meeting_only: bool,
    ) -> Result<Vec<IssueOverview>> {
        let project = self.project_row(project_id)?;
        self.require_view(session, &project)?;

        let mut sql = String::from(
            r#"
            SELECT i.id, i.task_id, i.member_id, i.issue_type, i.description,
                   i.request_1_on_1, i.status, i.created_at,
                   t.title, m.name
            FROM task_issues i
            JOIN tasks t ON t.id = i.task_id
            JOIN team_members m ON m.id = i.member_id
            WHERE t.project_id = ?1 AND i.status = 'Open'
            "#,
        );
        if meeting_only {
            sql.push_str(" AND i.request_1_on_1 = 1");
        }
        sql.push_str(" ORDER BY i.request_1_on_1 DESC, i.created_at ASC, i.id ASC");

        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| TrackerError::storage_with_source("failed to prepare query", e))?;
        let rows = stmt
            .query_map(params![project_id], |row| {
                Ok(IssueOverview {
                    issue: issue_from_row(row)?,
                    task_title: row.get(8)?,
                    member_name: row.get(9)?,
                })
            })
            .map_err(|e| TrackerError::storage_with_source("failed to list issues", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TrackerError::storage_with_source("failed to read issue row", e))?;

        Ok(rows)
    }

    /// Respond to an open issue (managing role).
    ///
    /// The response insert and the Open-to-Resolved transition commit in
    /// one transaction when `resolve` is set.
    pub fn respond_to_issue(
        &mut self,
        session: &SessionContext,
        issue_id: i64,
        input: ResponseInput,
    ) -> Result<i64> {
        let issue = self.issue_row(issue_id)?;
        let task = self.task_row(issue.task_id)?;
        let project = self.project_row(task.project_id)?;
        let principal = self.require_manage(session, &project)?;
        Self::require_non_empty(&input.response_text, "response text")?;
        if issue.status == IssueStatus::Resolved {
            return Err(TrackerError::validation(
                "issue is already resolved; a new issue must be raised instead",
            ));
        }
        let responder_id = principal.id;

        let now = Utc::now().to_rfc3339();
        let tx = self
            .db
            .conn_mut()
            .transaction()
            .map_err(|e| TrackerError::storage_with_source("failed to begin transaction", e))?;

        tx.execute(
            r#"
            INSERT INTO issue_responses
                (issue_id, responder_id, response_text, reference_links, hint_type, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                issue_id,
                responder_id,
                input.response_text,
                input.reference_links,
                input.hint_type.as_str(),
                now,
            ],
        )
        .map_err(|e| TrackerError::storage_with_source("failed to insert response", e))?;
        let response_id = tx.last_insert_rowid();

        if input.resolve {
            tx.execute(
                "UPDATE task_issues SET status = ?2 WHERE id = ?1 AND status = ?3",
                params![
                    issue_id,
                    IssueStatus::Resolved.as_str(),
                    IssueStatus::Open.as_str()
                ],
            )
            .map_err(|e| TrackerError::storage_with_source("failed to resolve issue", e))?;
        }

        tx.commit()
            .map_err(|e| TrackerError::storage_with_source("failed to commit", e))?;

        tracing::info!(
            issue_id,
            response_id,
            resolved = input.resolve,
            "responded to issue"
        );
        Ok(response_id)
    }

    /// The logged-in member's issues, newest first
    pub fn my_issues(&self, session: &SessionContext) -> Result<Vec<MyIssue>> {
        let principal = session.require_principal()?;
        if principal.role != Role::TeamMember {
            return Err(TrackerError::authorization(
                "only a team member has an issue history",
            ));
        }

        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(
                r#"
                SELECT i.id, i.task_id, i.member_id, i.issue_type, i.description,
                       i.request_1_on_1, i.status, i.created_at,
                       t.title
                FROM task_issues i
                JOIN tasks t ON t.id = i.task_id
                WHERE i.member_id = ?1
                ORDER BY i.created_at DESC, i.id DESC
                "#,
            )
            .map_err(|e| TrackerError::storage_with_source("failed to prepare query", e))?;
        let rows = stmt
            .query_map(params![principal.id], |row| {
                Ok(MyIssue {
                    issue: issue_from_row(row)?,
                    task_title: row.get(8)?,
                })
            })
            .map_err(|e| TrackerError::storage_with_source("failed to list issues", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TrackerError::storage_with_source("failed to read issue row", e))?;

        Ok(rows)
    }

    /// Responses to one issue in posting order.
    ///
    /// A member sees only their own issues; managing roles see issues of
    /// projects in their scope.
    pub fn responses_for_issue(
        &self,
        session: &SessionContext,
        issue_id: i64,
    ) -> Result<Vec<IssueResponse>> {
        let issue = self.issue_row(issue_id)?;
        let principal = session.require_principal()?;
        if principal.role == Role::TeamMember {
            if issue.member_id != principal.id {
                return Err(TrackerError::authorization("not your issue"));
            }
        } else {
            let task = self.task_row(issue.task_id)?;
            let project = self.project_row(task.project_id)?;
            self.require_view(session, &project)?;
        }

        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {RESPONSE_COLS} FROM issue_responses
                 WHERE issue_id = ?1 ORDER BY created_at ASC, id ASC"
            ))
            .map_err(|e| TrackerError::storage_with_source("failed to prepare query", e))?;
        let rows = stmt
            .query_map(params![issue_id], response_from_row)
            .map_err(|e| TrackerError::storage_with_source("failed to list responses", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TrackerError::storage_with_source("failed to read response row", e))?;

        Ok(rows)
    }

    /// Link-bearing responses for a task's issues: the reference shelf a
    /// member sees next to the task. Members get links from their own
    /// issues only.
    pub fn task_reference_links(
        &self,
        session: &SessionContext,
        task_id: i64,
    ) -> Result<Vec<IssueResponse>> {
        let task = self.task_row(task_id)?;
        let project = self.project_row(task.project_id)?;
        let principal = self.require_view(session, &project)?;

        let mut sql = String::from(
            r#"
            SELECT r.id, r.issue_id, r.responder_id, r.response_text,
                   r.reference_links, r.hint_type, r.created_at
            FROM issue_responses r
            JOIN task_issues i ON i.id = r.issue_id
            WHERE i.task_id = ?1 AND r.reference_links IS NOT NULL
            "#,
        );
        let member_scope = principal.role == Role::TeamMember;
        if member_scope {
            sql.push_str(" AND i.member_id = ?2");
        }
        sql.push_str(" ORDER BY r.created_at ASC, r.id ASC");

        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| TrackerError::storage_with_source("failed to prepare query", e))?;
        let rows = if member_scope {
            stmt.query_map(params![task_id, principal.id], response_from_row)
        } else {
            stmt.query_map(params![task_id], response_from_row)
        }
        .map_err(|e| TrackerError::storage_with_source("failed to list references", e))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| TrackerError::storage_with_source("failed to read response row", e))?;

        Ok(rows)
    }

    pub(crate) fn issue_row(&self, issue_id: i64) -> Result<TaskIssue> {
        self.db
            .conn()
            .query_row(
                &format!("SELECT {ISSUE_COLS} FROM task_issues WHERE id = ?1"),
                params![issue_id],
                issue_from_row,
            )
            .optional()
            .map_err(|e| TrackerError::storage_with_source("failed to load issue", e))?
            .ok_or_else(|| TrackerError::not_found(format!("issue {issue_id}")))
    }
}
