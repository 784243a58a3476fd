use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ids::{MessageId, SessionId};
use crate::messages::ToolStatus;

/// Hard bound on cached tool metadata entries per session.
pub const MAX_TOOL_CACHE_SIZE: usize = 1000;

/// Snapshot of a tool call taken the first time it is seen during a sync
/// pass. First-write-wins: a record is never updated afterwards, even if the
/// call's status later moves from pending to completed or error. Downstream
/// pruning eligibility and token-savings estimates rely on the snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool: String,
    pub parameters: serde_json::Value,
    pub status: ToolStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub compacted: bool,
    /// Small per-session integer for human-readable references in the
    /// prunable-tools list. Stable for the lifetime of the session.
    pub numeric_id: u32,
}

/// Session-scoped `call id -> ToolCallRecord` map, bounded to
/// [`MAX_TOOL_CACHE_SIZE`] entries with FIFO eviction by insertion order.
/// Keys are lower-cased so the case-insensitive descriptor lookups and the
/// sync pass agree on identity.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ToolMetadataCache {
    entries: HashMap<String, ToolCallRecord>,
    insertion_order: VecDeque<String>,
    next_numeric_id: u32,
}

impl ToolMetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record for `call_id` unless one is already present.
    /// Returns true when a new record was inserted. Does not evict; callers
    /// run [`trim`](Self::trim) after their pass so an entry is never dropped
    /// mid-use within the pass that inserted it.
    pub fn insert_if_absent(
        &mut self,
        call_id: &str,
        mut make: impl FnMut(u32) -> ToolCallRecord,
    ) -> bool {
        let key = call_id.to_lowercase();
        if self.entries.contains_key(&key) {
            return false;
        }
        let numeric_id = self.next_numeric_id;
        self.next_numeric_id += 1;
        self.entries.insert(key.clone(), make(numeric_id));
        self.insertion_order.push_back(key);
        true
    }

    pub fn get(&self, call_id: &str) -> Option<&ToolCallRecord> {
        self.entries.get(&call_id.to_lowercase())
    }

    pub fn contains(&self, call_id: &str) -> bool {
        self.entries.contains_key(&call_id.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order (oldest first).
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ToolCallRecord)> {
        self.insertion_order
            .iter()
            .filter_map(|k| self.entries.get(k).map(|r| (k.as_str(), r)))
    }

    /// FIFO-evict oldest entries until the cache is within bound.
    pub fn trim(&mut self) {
        while self.entries.len() > MAX_TOOL_CACHE_SIZE {
            let Some(oldest) = self.insertion_order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }
}

/// Identifiers marked for pruning. Append-only; duplicates are allowed and
/// harmless since the prune passes are idempotent.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PruneSet {
    pub tool_ids: Vec<String>,
    pub message_ids: Vec<String>,
}

impl PruneSet {
    pub fn contains_tool(&self, call_id: &str) -> bool {
        self.tool_ids.iter().any(|id| id.eq_ignore_ascii_case(call_id))
    }
}

/// One successful squash: the author-supplied summary, anchored at the first
/// message of the squashed range. Render-time replacement of the range is the
/// host's job, keyed by the anchor id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SquashSummary {
    pub anchor_message_id: MessageId,
    pub summary: String,
}

/// Tracks tool results observed on outbound wire bodies, across formats.
/// `seen_result_ids` only grows; re-observing an id never double-counts.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ToolResultTracker {
    seen_result_ids: HashSet<String>,
    pub result_count: u64,
    pub skip_next_idle: bool,
}

impl ToolResultTracker {
    /// Mark a result id seen. Returns true when it was new. Case-insensitive.
    pub fn mark_seen(&mut self, result_id: &str) -> bool {
        self.seen_result_ids.insert(result_id.to_lowercase())
    }

    pub fn has_seen(&self, result_id: &str) -> bool {
        self.seen_result_ids.contains(&result_id.to_lowercase())
    }
}

/// Running and lifetime token-savings counters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PruneStats {
    pub prune_token_counter: u64,
    pub total_prune_tokens: u64,
}

impl PruneStats {
    /// Fold the running counter into the lifetime total and reset it.
    pub fn fold(&mut self) {
        self.total_prune_tokens += self.prune_token_counter;
        self.prune_token_counter = 0;
    }
}

/// All engine state for one session. Created on the session's first turn,
/// persisted between turns by the host, passed by explicit reference into
/// every operation — there is no ambient global state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: SessionId,
    pub tool_cache: ToolMetadataCache,
    pub prune: PruneSet,
    pub squash_summaries: Vec<SquashSummary>,
    pub tracker: ToolResultTracker,
    pub stats: PruneStats,
    pub nudge_counter: u32,
    pub last_tool_was_prune: bool,
}

impl SessionState {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            tool_cache: ToolMetadataCache::new(),
            prune: PruneSet::default(),
            squash_summaries: Vec::new(),
            tracker: ToolResultTracker::default(),
            stats: PruneStats::default(),
            nudge_counter: 0,
            last_tool_was_prune: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(tool: &str, numeric_id: u32) -> ToolCallRecord {
        ToolCallRecord {
            tool: tool.into(),
            parameters: json!({}),
            status: ToolStatus::Completed,
            error: None,
            compacted: false,
            numeric_id,
        }
    }

    #[test]
    fn insert_if_absent_is_first_write_wins() {
        let mut cache = ToolMetadataCache::new();
        assert!(cache.insert_if_absent("Call_1", |n| record("read", n)));
        assert!(!cache.insert_if_absent("call_1", |n| record("write", n)));
        assert_eq!(cache.get("CALL_1").unwrap().tool, "read");
    }

    #[test]
    fn numeric_ids_are_monotonic() {
        let mut cache = ToolMetadataCache::new();
        cache.insert_if_absent("a", |n| record("read", n));
        cache.insert_if_absent("b", |n| record("read", n));
        cache.insert_if_absent("c", |n| record("read", n));
        assert_eq!(cache.get("a").unwrap().numeric_id, 0);
        assert_eq!(cache.get("b").unwrap().numeric_id, 1);
        assert_eq!(cache.get("c").unwrap().numeric_id, 2);
    }

    #[test]
    fn trim_evicts_oldest_first() {
        let mut cache = ToolMetadataCache::new();
        for i in 0..MAX_TOOL_CACHE_SIZE {
            cache.insert_if_absent(&format!("call_{i}"), |n| record("read", n));
        }
        cache.insert_if_absent("call_newest", |n| record("read", n));
        assert_eq!(cache.len(), MAX_TOOL_CACHE_SIZE + 1);

        cache.trim();
        assert_eq!(cache.len(), MAX_TOOL_CACHE_SIZE);
        assert!(!cache.contains("call_0"));
        assert!(cache.contains("call_1"));
        assert!(cache.contains("call_newest"));
    }

    #[test]
    fn iter_yields_insertion_order() {
        let mut cache = ToolMetadataCache::new();
        cache.insert_if_absent("b", |n| record("read", n));
        cache.insert_if_absent("a", |n| record("grep", n));
        let keys: Vec<&str> = cache.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn prune_set_tool_match_is_case_insensitive() {
        let prune = PruneSet {
            tool_ids: vec!["Call_ABC".into()],
            message_ids: vec![],
        };
        assert!(prune.contains_tool("call_abc"));
        assert!(!prune.contains_tool("call_xyz"));
    }

    #[test]
    fn tracker_never_double_counts() {
        let mut tracker = ToolResultTracker::default();
        assert!(tracker.mark_seen("Call_1"));
        assert!(!tracker.mark_seen("call_1"));
        assert!(tracker.has_seen("CALL_1"));
    }

    #[test]
    fn stats_fold_accumulates_and_resets() {
        let mut stats = PruneStats {
            prune_token_counter: 250,
            total_prune_tokens: 1000,
        };
        stats.fold();
        assert_eq!(stats.total_prune_tokens, 1250);
        assert_eq!(stats.prune_token_counter, 0);
    }

    #[test]
    fn session_state_serde_roundtrip() {
        let mut state = SessionState::new(SessionId::from_raw("ses_test"));
        state.tool_cache.insert_if_absent("call_1", |n| record("read", n));
        state.prune.tool_ids.push("call_1".into());
        state.squash_summaries.push(SquashSummary {
            anchor_message_id: MessageId::from_raw("msg_1"),
            summary: "explored auth".into(),
        });
        state.tracker.mark_seen("call_1");
        state.tracker.result_count = 1;

        let json = serde_json::to_string(&state).unwrap();
        let parsed: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.tool_cache.len(), 1);
        assert!(parsed.tracker.has_seen("call_1"));
        assert_eq!(parsed.squash_summaries.len(), 1);
    }
}
