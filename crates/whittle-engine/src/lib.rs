//! Context-management engine: per-session tool metadata, pruning, squash
//! range resolution, and nudge tracking over wire-format request bodies.
//!
//! The host calls three surfaces: [`cache::sync_tool_cache`] once per turn
//! with the full transcript, [`squash::run_squash`] when the squash tool is
//! invoked, and [`rewrite::rewrite_request`] on every outbound request body.

pub mod cache;
pub mod config;
pub mod error;
pub mod inject;
pub mod notify;
pub mod nudge;
pub mod prune;
pub mod rewrite;
pub mod sessions;
pub mod squash;
pub mod synth;

pub use cache::sync_tool_cache;
pub use config::{EngineConfig, NotificationLevel};
pub use error::EngineError;
pub use nudge::NudgeOutcome;
pub use rewrite::{rewrite_request, RewriteSummary};
pub use sessions::SessionRegistry;
pub use squash::{run_squash, SquashRequest};
