//! In-memory session store
//!
//! Constructed explicitly and handed to the engine; nothing here is global.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::Session;
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new session; ids are never reused
    pub fn insert(&mut self, session: Session) -> EngineResult<()> {
        debug!(session_id = %session.id, "SessionStore::insert: called");
        if self.sessions.contains_key(&session.id) {
            return Err(EngineError::config(format!("session '{}' already exists", session.id)));
        }
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn get(&self, id: &str) -> EngineResult<&Session> {
        self.sessions.get(id).ok_or_else(|| EngineError::NotFound(id.to_string()))
    }

    pub fn get_mut(&mut self, id: &str) -> EngineResult<&mut Session> {
        self.sessions
            .get_mut(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Ids of matching sessions, oldest first
    pub fn ids_where(&self, predicate: impl Fn(&Session) -> bool) -> Vec<String> {
        let mut matching: Vec<&Session> = self.sessions.values().filter(|s| predicate(s)).collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        matching.into_iter().map(|s| s.id.clone()).collect()
    }
}
