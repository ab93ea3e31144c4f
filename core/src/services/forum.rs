//! Project doubts forum. Any member of the project may post a
//! question; the manager tier marks posts answered. Unlike task
//! issues, forum posts hang off the project, not a task.

use super::Tracker;
use crate::db;
use crate::errors::{Result, TrackerError};
use crate::model::{DoubtsForumPost, ForumStatus, Role};
use crate::session::SessionContext;
use chrono::Utc;
use rusqlite::params;

/// Forum post joined with its author's name
#[derive(Debug, Clone)]
pub struct ForumPostView {
    pub post: DoubtsForumPost,
    pub member_name: String,
}

fn post_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DoubtsForumPost> {
    Ok(DoubtsForumPost {
        id: row.get(0)?,
        project_id: row.get(1)?,
        member_id: row.get(2)?,
        question: row.get(3)?,
        status: db::enum_col(row, 4, "forum status", ForumStatus::parse)?,
        created_at: db::datetime_col(row, 5)?,
    })
}

const POST_COLS: &str = "p.id, p.project_id, p.member_id, p.question, p.status, p.created_at";

impl Tracker {
    /// Post a question to a project's forum. Team members only, and
    /// only on projects they belong to.
    pub fn post_forum_question(
        &mut self,
        session: &SessionContext,
        project_id: i64,
        question: &str,
    ) -> Result<DoubtsForumPost> {
        let principal = session.require_principal()?;
        if principal.role != Role::TeamMember {
            return Err(TrackerError::authorization(
                "only a team member may post to the doubts forum",
            ));
        }
        let project = self.project_row(project_id)?;
        if !self.membership_exists(project_id, principal.id)? {
            return Err(TrackerError::authorization(format!(
                "project '{}' is not in your scope",
                project.name
            )));
        }
        Self::require_non_empty(question, "question")?;

        let now = Utc::now();
        self.db
            .conn()
            .execute(
                r#"
                INSERT INTO doubts_forum_posts (project_id, member_id, question, status, created_at)
                VALUES (?1, ?2, ?3, 'Open', ?4)
                "#,
                params![project_id, principal.id, question, now.to_rfc3339()],
            )
            .map_err(|e| TrackerError::storage_with_source("failed to post question", e))?;
        let id = self.db.conn().last_insert_rowid();
        tracing::debug!(post_id = id, project_id, "forum question posted");

        Ok(DoubtsForumPost {
            id,
            project_id,
            member_id: principal.id,
            question: question.to_string(),
            status: ForumStatus::Open,
            created_at: now,
        })
    }

    /// All forum posts of a project, newest first
    pub fn list_forum_posts(
        &self,
        session: &SessionContext,
        project_id: i64,
    ) -> Result<Vec<ForumPostView>> {
        let project = self.project_row(project_id)?;
        self.require_view(session, &project)?;

        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(&format!(
                r#"
                SELECT {POST_COLS}, m.name
                FROM doubts_forum_posts p
                JOIN team_members m ON m.id = p.member_id
                WHERE p.project_id = ?1
                ORDER BY p.created_at DESC, p.id DESC
                "#,
            ))
            .map_err(|e| TrackerError::storage_with_source("failed to prepare query", e))?;
        let rows = stmt
            .query_map(params![project_id], |row| {
                Ok(ForumPostView {
                    post: post_from_row(row)?,
                    member_name: row.get(6)?,
                })
            })
            .map_err(|e| TrackerError::storage_with_source("failed to list forum posts", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TrackerError::storage_with_source("failed to read forum row", e))?;

        Ok(rows)
    }

    /// Mark a forum post answered. Requires management rights on the
    /// post's project. Marking an answered post again is a no-op.
    pub fn mark_forum_post_answered(
        &mut self,
        session: &SessionContext,
        post_id: i64,
    ) -> Result<DoubtsForumPost> {
        let post = self.forum_post_row(post_id)?;
        let project = self.project_row(post.project_id)?;
        self.require_manage(session, &project)?;

        self.db
            .conn()
            .execute(
                "UPDATE doubts_forum_posts SET status = ?2 WHERE id = ?1",
                params![post_id, ForumStatus::Answered.as_str()],
            )
            .map_err(|e| TrackerError::storage_with_source("failed to update forum post", e))?;
        tracing::debug!(post_id, "forum post marked answered");

        self.forum_post_row(post_id)
    }

    fn forum_post_row(&self, post_id: i64) -> Result<DoubtsForumPost> {
        self.db
            .conn()
            .query_row(
                &format!("SELECT {POST_COLS} FROM doubts_forum_posts p WHERE p.id = ?1"),
                params![post_id],
                post_from_row,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    TrackerError::not_found(format!("forum post {post_id} does not exist"))
                }
                other => TrackerError::storage_with_source("failed to load forum post", other),
            })
    }
}
