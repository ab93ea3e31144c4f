//! Read-through name lookup cache
//!
//! Name-to-id maps are loaded per `(project, entity kind)` on first use
//! and served from memory after that. Every writer that changes the
//! entity set of a project invalidates the matching slot, so a lookup
//! after a write always sees the new row. Single-owner access only; the
//! cache lives inside the tracker and is never shared across sessions.

use crate::errors::Result;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Which per-project name map a cache slot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Member,
    Requirement,
    Sprint,
    Task,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Requirement => "requirement",
            Self::Sprint => "sprint",
            Self::Task => "task",
        }
    }

    const ALL: [Self; 4] = [Self::Member, Self::Requirement, Self::Sprint, Self::Task];
}

/// Cached name-to-id maps keyed by `(project_id, kind)`
#[derive(Debug, Default)]
pub struct ProjectMaps {
    maps: HashMap<(i64, EntityKind), HashMap<String, i64>>,
}

impl ProjectMaps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached map for a slot, loading it on a miss.
    pub fn get_or_load(
        &mut self,
        project_id: i64,
        kind: EntityKind,
        load: impl FnOnce() -> Result<HashMap<String, i64>>,
    ) -> Result<&HashMap<String, i64>> {
        match self.maps.entry((project_id, kind)) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(slot) => {
                let loaded = load()?;
                tracing::debug!(
                    project_id,
                    kind = kind.as_str(),
                    entries = loaded.len(),
                    "loaded project map"
                );
                Ok(slot.insert(loaded))
            }
        }
    }

    /// Drop one slot after a write to that entity kind
    pub fn invalidate(&mut self, project_id: i64, kind: EntityKind) {
        if self.maps.remove(&(project_id, kind)).is_some() {
            tracing::debug!(project_id, kind = kind.as_str(), "invalidated project map");
        }
    }

    /// Drop every slot of a project (project deletion)
    pub fn invalidate_project(&mut self, project_id: i64) {
        for kind in EntityKind::ALL {
            self.maps.remove(&(project_id, kind));
        }
    }

    /// Whether a slot is currently cached
    pub fn is_cached(&self, project_id: i64, kind: EntityKind) -> bool {
        self.maps.contains_key(&(project_id, kind))
    }
}
