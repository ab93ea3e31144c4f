//! Principal accounts: project managers and team members

use super::{MemberProfile, Tracker};
use crate::config::DeploymentProfile;
use crate::credentials;
use crate::db::map_insert_conflict;
use crate::errors::{Result, TrackerError};
use crate::session::SessionContext;
use rusqlite::{OptionalExtension, params};

impl Tracker {
    /// Create a project-manager account. Super-admin only; usernames are
    /// unique within the manager table.
    pub fn create_project_manager(
        &mut self,
        session: &SessionContext,
        username: &str,
        password: &str,
    ) -> Result<i64> {
        self.require_super_admin(session)?;
        if self.profile == DeploymentProfile::TwoRole {
            return Err(TrackerError::validation(
                "the two-role deployment profile has no project managers",
            ));
        }
        Self::require_non_empty(username, "username")?;
        Self::require_non_empty(password, "password")?;

        let hash = credentials::hash_password(password)?;

        let tx = self
            .db
            .conn_mut()
            .transaction()
            .map_err(|e| TrackerError::storage_with_source("failed to begin transaction", e))?;

        let taken: Option<i64> = tx
            .query_row(
                "SELECT id FROM project_managers WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| TrackerError::storage_with_source("failed to check username", e))?;
        if taken.is_some() {
            return Err(TrackerError::duplicate_key(format!(
                "project manager username '{username}' already in use"
            )));
        }

        tx.execute(
            "INSERT INTO project_managers (username, password_hash) VALUES (?1, ?2)",
            params![username, hash],
        )
        .map_err(|e| {
            map_insert_conflict(
                e,
                format!("project manager username '{username}' already in use"),
                "failed to insert project manager",
            )
        })?;
        let id = tx.last_insert_rowid();

        tx.commit()
            .map_err(|e| TrackerError::storage_with_source("failed to commit", e))?;

        tracing::info!(id, username, "created project manager");
        Ok(id)
    }

    /// Create a team-member account. Admin tier; emails are unique.
    pub fn create_team_member(
        &mut self,
        session: &SessionContext,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<i64> {
        self.require_admin_tier(session)?;
        Self::require_non_empty(name, "name")?;
        Self::require_non_empty(email, "email")?;
        Self::require_non_empty(password, "password")?;
        if !email.contains('@') {
            return Err(TrackerError::validation(format!(
                "'{email}' is not an email address"
            )));
        }

        let hash = credentials::hash_password(password)?;

        let tx = self
            .db
            .conn_mut()
            .transaction()
            .map_err(|e| TrackerError::storage_with_source("failed to begin transaction", e))?;

        let taken: Option<i64> = tx
            .query_row(
                "SELECT id FROM team_members WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| TrackerError::storage_with_source("failed to check email", e))?;
        if taken.is_some() {
            return Err(TrackerError::duplicate_key(format!(
                "a member with email '{email}' already exists"
            )));
        }

        tx.execute(
            "INSERT INTO team_members (name, email, password_hash) VALUES (?1, ?2, ?3)",
            params![name, email, hash],
        )
        .map_err(|e| {
            map_insert_conflict(
                e,
                format!("a member with email '{email}' already exists"),
                "failed to insert team member",
            )
        })?;
        let id = tx.last_insert_rowid();

        tx.commit()
            .map_err(|e| TrackerError::storage_with_source("failed to commit", e))?;

        tracing::info!(id, email, "created team member");
        Ok(id)
    }

    /// All team-member accounts, admin tier only
    pub fn list_team_members(&self, session: &SessionContext) -> Result<Vec<MemberProfile>> {
        self.require_admin_tier(session)?;

        let conn = self.db.conn();
        let mut stmt = conn
            .prepare("SELECT id, name, email FROM team_members ORDER BY name, id")
            .map_err(|e| TrackerError::storage_with_source("failed to prepare query", e))?;
        let rows = stmt
            .query_map([], |row| {
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
}
