use serde::Deserialize;

/// Name of the reserved pruning tool. A prune call resets the nudge counter
/// and its own results never clear `skip_next_idle`.
pub const PRUNE_TOOL: &str = "prune";

/// Name of the reserved question tool, whose inputs (not outputs) get pruned.
pub const QUESTION_TOOL: &str = "question";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// A nudge fires each time the tool-result count crosses a multiple of
    /// this frequency.
    pub nudge_frequency: u64,
    /// Tools the nudge counter and the prunable-tools list skip.
    pub protected_tools: Vec<String>,
    /// Verbosity of end-of-turn notifications.
    pub notification: NotificationLevel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Off,
    Minimal,
    Detailed,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            nudge_frequency: 10,
            protected_tools: vec![PRUNE_TOOL.into(), QUESTION_TOOL.into(), "task".into()],
            notification: NotificationLevel::Detailed,
        }
    }
}

impl EngineConfig {
    pub fn is_protected(&self, tool: &str) -> bool {
        self.protected_tools.iter().any(|t| t == tool)
    }
}
