//! In-memory registry of live session state. The host serializes turns per
//! session; the mutex is for cross-session registry access, not for
//! intra-turn parallelism.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use whittle_core::ids::SessionId;
use whittle_core::state::SessionState;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Arc<Mutex<SessionState>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for `session_id`, created fresh on first sight.
    pub fn get_or_create(&self, session_id: &SessionId) -> Arc<Mutex<SessionState>> {
        self.sessions
            .entry(session_id.clone())
            .or_insert_with(|| {
                debug!(%session_id, "session state created");
                Arc::new(Mutex::new(SessionState::new(session_id.clone())))
            })
            .clone()
    }

    /// Drop a finished session. Outstanding clones stay usable; the registry
    /// just stops handing the state out.
    pub fn remove(&self, session_id: &SessionId) -> Option<Arc<Mutex<SessionState>>> {
        self.sessions.remove(session_id).map(|(_, state)| state)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
