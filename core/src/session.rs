//! Per-session state
//!
//! Identity, project selection, and the assistant API key all live on an
//! explicit [`SessionContext`] owned by the caller. Nothing here is
//! process-global: two sessions never observe each other's selection.
//!
//! The assistant API key is a UX carry-over, not an authentication
//! value: logout clears identity and selection but keeps the key, so
//! re-login in the same session does not force re-entering it. The key
//! is never written to storage.

use crate::credentials::Principal;
use crate::errors::{Result, TrackerError};

/// Session-scoped state for one logical user session
#[derive(Debug, Default)]
pub struct SessionContext {
    principal: Option<Principal>,
    selected_project_id: Option<i64>,
    assistant_api_key: Option<String>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a freshly authenticated principal.
    ///
    /// Any project selection from a previous identity is dropped.
    pub fn login(&mut self, principal: Principal) {
        tracing::debug!(role = principal.role.as_str(), id = principal.id, "session login");
        self.principal = Some(principal);
        self.selected_project_id = None;
    }

    /// Clear identity and selection, keeping the assistant API key.
    pub fn logout(&mut self) {
        self.principal = None;
        self.selected_project_id = None;
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// The authenticated principal, or an error when nobody is logged in
    pub fn require_principal(&self) -> Result<&Principal> {
        self.principal
            .as_ref()
            .ok_or_else(|| TrackerError::authorization("login required"))
    }

    pub fn selected_project_id(&self) -> Option<i64> {
        self.selected_project_id
    }

    pub fn select_project(&mut self, project_id: i64) {
        self.selected_project_id = Some(project_id);
    }

    pub fn clear_project_selection(&mut self) {
        self.selected_project_id = None;
    }

    pub fn assistant_api_key(&self) -> Option<&str> {
        self.assistant_api_key.as_deref()
    }

    pub fn set_assistant_api_key(&mut self, key: Option<String>) {
        self.assistant_api_key = key;
    }
}
