use whittle_core::errors::{HostError, SquashError};

/// Umbrella error for engine entry points. `Squash` surfaces to the invoking
/// tool caller; `Host` failures are logged and swallowed at their call sites
/// and only bubble through APIs that expose collaborator results directly.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Squash(#[from] SquashError),

    #[error(transparent)]
    Host(#[from] HostError),
}
