//! Credential store and login resolution
//!
//! Passwords are bcrypt-hashed with per-hash salts and verified in
//! constant time. `authenticate` resolves an (identifier, password,
//! claim) tuple to a [`Principal`]; every failure path returns the same
//! generic error so callers cannot learn whether an identifier exists.

use crate::config::DeploymentProfile;
use crate::db::Db;
use crate::errors::{Result, TrackerError};
use crate::model::Role;
use rusqlite::{OptionalExtension, params};

/// Which login form the caller used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginKind {
    /// Team-member login, identifier is an email address
    TeamMember,
    /// Manager/admin login, identifier is a username. The super-admin
    /// table is consulted first; first match wins.
    ManagerOrAdmin,
}

/// An authenticated actor for the duration of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub role: Role,
    pub id: i64,
    pub display_name: String,
}

/// Hash a password for storage
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| TrackerError::storage_with_source("failed to hash password", e))
}

/// Verify a password against a stored hash.
///
/// A malformed stored hash counts as a failed verification and is logged;
/// it must not turn into a distinguishable error for the caller.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match bcrypt::verify(password, password_hash) {
        Ok(ok) => ok,
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash failed verification");
            false
        }
    }
}

/// Burn one bcrypt computation when no credential row was found, so an
/// unknown identifier costs the same as a wrong password.
fn equalize_timing(password: &str) {
    let _ = bcrypt::hash(password, bcrypt::DEFAULT_COST);
}

/// Resolve credentials to a principal.
///
/// `LoginKind::ManagerOrAdmin` checks super_admins before
/// project_managers; usernames are not globally unique across the two
/// tables, and the first identifier match is authoritative. Under the
/// two-role deployment profile only super_admins is consulted.
pub fn authenticate(
    db: &Db,
    profile: DeploymentProfile,
    identifier: &str,
    password: &str,
    claimed: LoginKind,
) -> Result<Principal> {
    let found = match claimed {
        LoginKind::TeamMember => find_team_member(db, identifier)?,
        LoginKind::ManagerOrAdmin => {
            let admin = find_super_admin(db, identifier)?;
            match (admin, profile) {
                (Some(hit), _) => Some(hit),
                (None, DeploymentProfile::TwoRole) => None,
                (None, DeploymentProfile::ThreeRole) => find_project_manager(db, identifier)?,
            }
        }
    };

    let Some((role, id, display_name, password_hash)) = found else {
        equalize_timing(password);
        return Err(TrackerError::authentication());
    };

    if !verify_password(password, &password_hash) {
        return Err(TrackerError::authentication());
    }

    tracing::debug!(role = role.as_str(), id, "login verified");

    Ok(Principal {
        role,
        id,
        display_name,
    })
}

type CredentialHit = (Role, i64, String, String);

fn find_super_admin(db: &Db, username: &str) -> Result<Option<CredentialHit>> {
    db.conn()
        .query_row(
            "SELECT id, username, password_hash FROM super_admins WHERE username = ?1",
            params![username],
            |row| Ok((Role::SuperAdmin, row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()
        .map_err(|e| TrackerError::storage_with_source("failed to look up super admin", e))
}

fn find_project_manager(db: &Db, username: &str) -> Result<Option<CredentialHit>> {
    db.conn()
        .query_row(
            "SELECT id, username, password_hash FROM project_managers WHERE username = ?1",
            params![username],
            |row| Ok((Role::ProjectManager, row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()
        .map_err(|e| TrackerError::storage_with_source("failed to look up project manager", e))
}

fn find_team_member(db: &Db, email: &str) -> Result<Option<CredentialHit>> {
    db.conn()
        .query_row(
            "SELECT id, name, password_hash FROM team_members WHERE email = ?1",
            params![email],
            |row| Ok((Role::TeamMember, row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()
        .map_err(|e| TrackerError::storage_with_source("failed to look up team member", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low cost keeps the fixtures fast; production hashing always goes
    // through hash_password at DEFAULT_COST.
    fn test_hash(password: &str) -> String {
        bcrypt::hash(password, 4).expect("hash")
    }

    fn seeded_db() -> Db {
        let db = Db::open_in_memory().expect("open");
        db.conn()
            .execute(
                "INSERT INTO super_admins (username, password_hash) VALUES ('boss', ?1)",
                params![test_hash("admin-pw")],
            )
            .expect("admin");
        db.conn()
            .execute(
                "INSERT INTO project_managers (username, password_hash) VALUES ('boss', ?1)",
                params![test_hash("pm-pw")],
            )
            .expect("pm shadowing admin username");
        db.conn()
            .execute(
                "INSERT INTO project_managers (username, password_hash) VALUES ('lead', ?1)",
                params![test_hash("lead-pw")],
            )
            .expect("pm");
        db.conn()
            .execute(
                "INSERT INTO team_members (name, email, password_hash) VALUES ('Alice', 'alice@example.com', ?1)",
                params![test_hash("alice-pw")],
            )
            .expect("member");
        db
    }

    #[test]
    fn verify_round_trip() {
        let hash = test_hash("open sesame");
        assert!(verify_password("open sesame", &hash));
        assert!(!verify_password("open says me", &hash));
        assert!(!verify_password("open sesame", "not-a-hash"));
    }

    #[test]
    fn super_admin_takes_precedence_on_shared_username() {
        let db = seeded_db();
        let principal = authenticate(
            &db,
            DeploymentProfile::ThreeRole,
            "boss",
            "admin-pw",
            LoginKind::ManagerOrAdmin,
        )
        .expect("admin login");
        assert_eq!(principal.role, Role::SuperAdmin);

        // The shadowed manager password does not work: the admin row is
        // the match, and a wrong password there is a failure, not a
        // fall-through.
        let err = authenticate(
            &db,
            DeploymentProfile::ThreeRole,
            "boss",
            "pm-pw",
            LoginKind::ManagerOrAdmin,
        )
        .expect_err("no fall-through");
        assert!(matches!(err, TrackerError::Authentication { .. }));
    }

    #[test]
    fn manager_login_resolves_manager_role() {
        let db = seeded_db();
        let principal = authenticate(
            &db,
            DeploymentProfile::ThreeRole,
            "lead",
            "lead-pw",
            LoginKind::ManagerOrAdmin,
        )
        .expect("manager login");
        assert_eq!(principal.role, Role::ProjectManager);
        assert_eq!(principal.display_name, "lead");
    }

    #[test]
    fn two_role_profile_skips_manager_table() {
        let db = seeded_db();
        let err = authenticate(
            &db,
            DeploymentProfile::TwoRole,
            "lead",
            "lead-pw",
            LoginKind::ManagerOrAdmin,
        )
        .expect_err("no manager tier in two-role profile");
        assert!(matches!(err, TrackerError::Authentication { .. }));
    }

    #[test]
    fn team_member_logs_in_by_email() {
        let db = seeded_db();
        let principal = authenticate(
            &db,
            DeploymentProfile::ThreeRole,
            "alice@example.com",
            "alice-pw",
            LoginKind::TeamMember,
        )
        .expect("member login");
        assert_eq!(principal.role, Role::TeamMember);
        assert_eq!(principal.display_name, "Alice");
    }

    #[test]
    fn unknown_identifier_and_bad_password_are_indistinguishable() {
        let db = seeded_db();
        let unknown = authenticate(
            &db,
            DeploymentProfile::ThreeRole,
            "nobody@example.com",
            "whatever",
            LoginKind::TeamMember,
        )
        .expect_err("unknown identifier");
        let wrong = authenticate(
            &db,
            DeploymentProfile::ThreeRole,
            "alice@example.com",
            "wrong-pw",
            LoginKind::TeamMember,
        )
        .expect_err("wrong password");
        assert_eq!(unknown.to_string(), wrong.to_string());
    }
}
