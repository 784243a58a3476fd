use async_trait::async_trait;

use crate::errors::HostError;
use crate::ids::SessionId;
use crate::state::SessionState;

/// Toast/chat notification delivery, provided by the host runtime.
/// Delivery is awaited but failures are logged and swallowed by callers.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn toast(&self, session_id: &SessionId, message: &str) -> Result<(), HostError>;
}

/// Session-state persistence, provided by the host runtime. Persistence is
/// fire-and-forget: callers detach it onto a background task and the
/// in-memory state stays authoritative for the rest of the process's
/// handling of the session.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn persist(&self, state: &SessionState) -> Result<(), HostError>;
}

/// No-op collaborators for tests and the debug binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullHost;

#[async_trait]
impl Notifier for NullHost {
    async fn toast(&self, _session_id: &SessionId, _message: &str) -> Result<(), HostError> {
        Ok(())
    }
}

#[async_trait]
impl StateStore for NullHost {
    async fn persist(&self, _state: &SessionState) -> Result<(), HostError> {
        Ok(())
    }
}
