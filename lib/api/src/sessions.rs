//! In-memory session store backing the list endpoints

use amusic_recommend::Session;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// Sessions keyed by id. Each list call locks only for its own update.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.write().insert(id, Session::new());
        id
    }

    /// Snapshot of a session's lists
    pub fn get(&self, id: &Uuid) -> Option<Session> {
        self.sessions.read().get(id).cloned()
    }

    /// Apply `f` to a session; `None` when the id is unknown
    pub fn update<R>(&self, id: &Uuid, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        self.sessions.write().get_mut(id).map(f)
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions.write().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
