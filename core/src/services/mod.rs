//! Domain services
//!
//! [`Tracker`] is the single entry point for every domain operation.
//! Each method takes the caller's [`SessionContext`] explicitly and runs
//! its own role and project-scope checks before touching the store.
//! Method groups live in the submodules, one per service area, all as
//! `impl Tracker` blocks.

mod accounts;
mod analytics;
mod forum;
mod issues;
mod members;
mod progress;
mod projects;
mod requirements;
mod resources;
mod sprints;
mod tasks;

pub use analytics::{FeedItem, MemberProgress, StatusCounts, Timeliness};
pub use forum::ForumPostView;
pub use issues::{IssueOverview, MyIssue, ResponseInput};
pub use members::MemberProfile;
pub use progress::ProgressInput;
pub use sprints::SprintProgress;
pub use tasks::{NewTask, TaskOverview};

use crate::cache::ProjectMaps;
use crate::config::{DeploymentProfile, TrackerConfig};
use crate::credentials::{self, LoginKind, Principal};
use crate::db::Db;
use crate::errors::{Result, TrackerError};
use crate::model::{Project, Role};
use crate::session::SessionContext;
use rusqlite::{OptionalExtension, params};

/// Domain-service facade over the tracker store
pub struct Tracker {
    db: Db,
    maps: ProjectMaps,
    profile: DeploymentProfile,
}

impl Tracker {
    /// Open the configured database, apply the schema, and seed the
    /// bootstrap super-admin. Safe to call on every startup.
    pub fn init(cfg: &TrackerConfig) -> Result<Self> {
        let db = Db::connect_and_init(cfg)?;
        let tracker = Self {
            db,
            maps: ProjectMaps::new(),
            profile: cfg.deployment_profile,
        };
        tracker.seed_bootstrap(
            &cfg.bootstrap.admin_username,
            &cfg.bootstrap.admin_password,
        )?;
        Ok(tracker)
    }

    /// In-memory tracker without the bootstrap seed (tests and throwaway
    /// runs seed explicitly).
    pub fn open_in_memory(profile: DeploymentProfile) -> Result<Self> {
        Ok(Self {
            db: Db::open_in_memory()?,
            maps: ProjectMaps::new(),
            profile,
        })
    }

    /// Hash and insert the bootstrap super-admin if absent.
    pub fn seed_bootstrap(&self, username: &str, password: &str) -> Result<bool> {
        let hash = credentials::hash_password(password)?;
        self.db.seed_super_admin(username, &hash)
    }

    pub fn deployment_profile(&self) -> DeploymentProfile {
        self.profile
    }

    /// Authenticate and install the principal into the session.
    pub fn login(
        &self,
        session: &mut SessionContext,
        identifier: &str,
        password: &str,
        claimed: LoginKind,
    ) -> Result<Principal> {
        let principal =
            credentials::authenticate(&self.db, self.profile, identifier, password, claimed)?;
        session.login(principal.clone());
        Ok(principal)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Shared lookups and authorization gates
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetch a project row, NotFound when missing
    pub(crate) fn project_row(&self, project_id: i64) -> Result<Project> {
        self.db
            .conn()
            .query_row(
                r#"
                SELECT id, name, description, problem_statement, manager_id
                FROM projects
                WHERE id = ?1
                "#,
                params![project_id],
                |row| {
                    Ok(Project {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        problem_statement: row.get(3)?,
                        manager_id: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(|e| TrackerError::storage_with_source("failed to load project", e))?
            .ok_or_else(|| TrackerError::not_found(format!("project {project_id}")))
    }

    pub(crate) fn membership_exists(&self, project_id: i64, member_id: i64) -> Result<bool> {
        let found: Option<i64> = self
            .db
            .conn()
            .query_row(
                "SELECT id FROM project_members WHERE project_id = ?1 AND member_id = ?2",
                params![project_id, member_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| TrackerError::storage_with_source("failed to check membership", e))?;
        Ok(found.is_some())
    }

    /// Must be logged in as super-admin
    pub(crate) fn require_super_admin<'a>(
        &self,
        session: &'a SessionContext,
    ) -> Result<&'a Principal> {
        let principal = session.require_principal()?;
        if principal.role != Role::SuperAdmin {
            return Err(TrackerError::authorization(
                "only a super admin may do this",
            ));
        }
        Ok(principal)
    }

    /// Must be logged in as super-admin or project manager
    pub(crate) fn require_admin_tier<'a>(
        &self,
        session: &'a SessionContext,
    ) -> Result<&'a Principal> {
        let principal = session.require_principal()?;
        match principal.role {
            Role::SuperAdmin | Role::ProjectManager => Ok(principal),
            Role::TeamMember => Err(TrackerError::authorization(
                "only an admin-tier role may do this",
            )),
        }
    }

    /// Project must be inside the principal's visibility scope.
    ///
    /// super_admin: every project; project_manager: own projects;
    /// team_member: projects with a membership row.
    pub(crate) fn require_view<'a>(
        &self,
        session: &'a SessionContext,
        project: &Project,
    ) -> Result<&'a Principal> {
        let principal = session.require_principal()?;
        let visible = match principal.role {
            Role::SuperAdmin => true,
            Role::ProjectManager => project.manager_id == Some(principal.id),
            Role::TeamMember => self.membership_exists(project.id, principal.id)?,
        };
        if !visible {
            return Err(TrackerError::authorization(format!(
                "project '{}' is not in your scope",
                project.name
            )));
        }
        Ok(principal)
    }

    /// Management rights over project content (sprints, requirements,
    /// tasks, responses, resources).
    ///
    /// The owning project manager manages a claimed project; a
    /// super-admin manages only projects with no manager assigned. The
    /// two-role profile has no manager tier, so the super-admin manages
    /// everything there.
    pub(crate) fn require_manage<'a>(
        &self,
        session: &'a SessionContext,
        project: &Project,
    ) -> Result<&'a Principal> {
        let principal = session.require_principal()?;
        let allowed = match principal.role {
            Role::ProjectManager => project.manager_id == Some(principal.id),
            Role::SuperAdmin => {
                self.profile == DeploymentProfile::TwoRole || project.manager_id.is_none()
            }
            Role::TeamMember => false,
        };
        if !allowed {
            return Err(TrackerError::authorization(format!(
                "no management rights on project '{}'",
                project.name
            )));
        }
        Ok(principal)
    }

    /// Roster rights: who may assign/unassign members.
    ///
    /// Unlike content management, a super-admin administers the roster
    /// of every project; a manager only their own.
    pub(crate) fn require_roster<'a>(
        &self,
        session: &'a SessionContext,
        project: &Project,
    ) -> Result<&'a Principal> {
        let principal = session.require_principal()?;
        let allowed = match principal.role {
            Role::SuperAdmin => true,
            Role::ProjectManager => project.manager_id == Some(principal.id),
            Role::TeamMember => false,
        };
        if !allowed {
            return Err(TrackerError::authorization(format!(
                "no roster rights on project '{}'",
                project.name
            )));
        }
        Ok(principal)
    }

    pub(crate) fn require_non_empty(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(TrackerError::validation(format!("{field} must not be empty")));
        }
        Ok(())
    }
}
