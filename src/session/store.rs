//! Session registry - per-participant state keyed by session id.
//!
//! Each session owns its state exclusively; nothing is shared between
//! participants except the persisted table.

use super::state::{SessionId, SessionState};
use crate::{Error, Result};
use dashmap::DashMap;

/// In-memory session registry using a lock-free concurrent hashmap.
///
/// Sessions live until removed or the process exits.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SessionState>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Create with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sessions: DashMap::with_capacity(capacity),
        }
    }

    /// Number of live sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Check if no session is live
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop every session.
    pub fn clear(&self) {
        self.sessions.clear();
    }

    /// Register a session, returning its id.
    pub fn insert(&self, state: SessionState) -> SessionId {
        let id = state.session_id();
        self.sessions.insert(id, state);
        id
    }

    /// Check if `id` is registered
    #[must_use]
    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Copy of the session state.
    #[must_use]
    pub fn snapshot(&self, id: &SessionId) -> Option<SessionState> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// Run `f` with exclusive access to one session.
    ///
    /// # Errors
    ///
    /// Returns `Error::SessionNotFound` for an unknown id, or whatever `f` returns
    pub fn update<T, F>(&self, id: &SessionId, f: F) -> Result<T>
    where
        F: FnOnce(&mut SessionState) -> Result<T>,
    {
        let mut entry = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        f(entry.value_mut())
    }

    /// Remove a session.
    pub fn remove(&self, id: &SessionId) -> Option<SessionState> {
        self.sessions.remove(id).map(|(_, state)| state)
    }
}
