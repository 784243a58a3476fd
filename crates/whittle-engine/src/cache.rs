//! Per-turn sync of tool metadata from the host transcript.

use tracing::debug;

use whittle_core::messages::{Part, ToolStatus, TranscriptMessage};
use whittle_core::state::{SessionState, ToolCallRecord};

use crate::config::{EngineConfig, PRUNE_TOOL};

/// Walk the full ordered transcript once, capturing first-sight snapshots of
/// every tool call and maintaining the nudge bookkeeping.
///
/// First-write-wins: a call id already in the cache is left untouched even if
/// its status has since changed. The FIFO trim runs only after the walk, so
/// nothing inserted by this pass is evicted mid-pass.
pub fn sync_tool_cache(
    state: &mut SessionState,
    config: &EngineConfig,
    messages: &[TranscriptMessage],
) {
    state.nudge_counter = 0;
    let mut inserted = 0usize;

    for msg in messages {
        for part in &msg.parts {
            let Part::Tool { call_id, tool, state: call_state } = part else {
                continue;
            };

            if tool == PRUNE_TOOL {
                state.nudge_counter = 0;
            } else if !config.is_protected(tool) {
                state.nudge_counter += 1;
            }
            state.last_tool_was_prune = tool == PRUNE_TOOL;

            let was_new = state.tool_cache.insert_if_absent(call_id.as_str(), |numeric_id| {
                ToolCallRecord {
                    tool: tool.clone(),
                    parameters: call_state.input.clone(),
                    status: call_state.status,
                    error: if call_state.status == ToolStatus::Error {
                        call_state.error.clone()
                    } else {
                        None
                    },
                    compacted: call_state.status == ToolStatus::Completed
                        && call_state.compacted_at.is_some(),
                    numeric_id,
                }
            });
            if was_new {
                inserted += 1;
            }
        }
    }

    state.tool_cache.trim();

    debug!(
        inserted,
        cache_size = state.tool_cache.len(),
        nudge_counter = state.nudge_counter,
        last_tool_was_prune = state.last_tool_was_prune,
        "tool cache synced"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use whittle_core::ids::SessionId;
    use whittle_core::messages::ToolCallState;
    use whittle_core::state::MAX_TOOL_CACHE_SIZE;

    fn state() -> SessionState {
        SessionState::new(SessionId::from_raw("ses_test"))
    }

    fn tool_msg(id: &str, call_id: &str, tool: &str) -> TranscriptMessage {
        TranscriptMessage::assistant_text(id, "").with_tool_part(
            call_id,
            tool,
            ToolCallState::completed(json!({"path": "/a"}), "output"),
        )
    }

    #[test]
    fn records_are_captured_at_first_sight() {
        let mut state = state();
        let messages = vec![tool_msg("msg_1", "call_1", "read")];
        sync_tool_cache(&mut state, &EngineConfig::default(), &messages);

        let record = state.tool_cache.get("call_1").unwrap();
        assert_eq!(record.tool, "read");
        assert_eq!(record.status, ToolStatus::Completed);
        assert!(!record.compacted);
    }

    #[test]
    fn first_write_wins_across_syncs() {
        let mut state = state();
        let pending = TranscriptMessage::assistant_text("msg_1", "").with_tool_part(
            "call_1",
            "read",
            ToolCallState {
                status: ToolStatus::Pending,
                input: json!({}),
                output: None,
                error: None,
                compacted_at: None,
            },
        );
        sync_tool_cache(&mut state, &EngineConfig::default(), &[pending]);
        assert_eq!(state.tool_cache.get("call_1").unwrap().status, ToolStatus::Pending);

        // Later the same call shows up completed; the snapshot stays pending.
        sync_tool_cache(
            &mut state,
            &EngineConfig::default(),
            &[tool_msg("msg_1", "call_1", "read")],
        );
        assert_eq!(state.tool_cache.get("call_1").unwrap().status, ToolStatus::Pending);
    }

    #[test]
    fn error_detail_captured_only_for_errors() {
        let mut state = state();
        let errored = TranscriptMessage::assistant_text("msg_1", "").with_tool_part(
            "call_err",
            "bash",
            ToolCallState::errored(json!({"command": "ls"}), "exit 1"),
        );
        sync_tool_cache(&mut state, &EngineConfig::default(), &[errored]);
        let record = state.tool_cache.get("call_err").unwrap();
        assert_eq!(record.status, ToolStatus::Error);
        assert_eq!(record.error.as_deref(), Some("exit 1"));
    }

    #[test]
    fn compacted_flag_requires_completed_and_timestamp() {
        let mut state = state();
        let compacted = TranscriptMessage::assistant_text("msg_1", "").with_tool_part(
            "call_1",
            "read",
            ToolCallState {
                status: ToolStatus::Completed,
                input: json!({}),
                output: Some("x".into()),
                error: None,
                compacted_at: Some("2026-08-01T00:00:00Z".into()),
            },
        );
        sync_tool_cache(&mut state, &EngineConfig::default(), &[compacted]);
        assert!(state.tool_cache.get("call_1").unwrap().compacted);
    }

    #[test]
    fn nudge_counter_counts_unprotected_tools_and_resets_on_prune() {
        let mut state = state();
        let messages = vec![
            tool_msg("msg_1", "call_1", "read"),
            tool_msg("msg_2", "call_2", "grep"),
            tool_msg("msg_3", "call_3", "prune"),
            tool_msg("msg_4", "call_4", "read"),
        ];
        sync_tool_cache(&mut state, &EngineConfig::default(), &messages);
        // Reset at the prune call, then one more unprotected call.
        assert_eq!(state.nudge_counter, 1);
        assert!(!state.last_tool_was_prune);
    }

    #[test]
    fn protected_tools_do_not_advance_the_counter() {
        let mut state = state();
        let messages = vec![
            tool_msg("msg_1", "call_1", "question"),
            tool_msg("msg_2", "call_2", "task"),
        ];
        sync_tool_cache(&mut state, &EngineConfig::default(), &messages);
        assert_eq!(state.nudge_counter, 0);
    }

    #[test]
    fn last_tool_was_prune_tracks_final_call() {
        let mut state = state();
        let messages = vec![
            tool_msg("msg_1", "call_1", "read"),
            tool_msg("msg_2", "call_2", "prune"),
        ];
        sync_tool_cache(&mut state, &EngineConfig::default(), &messages);
        assert!(state.last_tool_was_prune);
    }

    #[test]
    fn counter_resets_at_each_pass_start() {
        let mut state = state();
        let messages = vec![tool_msg("msg_1", "call_1", "read")];
        sync_tool_cache(&mut state, &EngineConfig::default(), &messages);
        sync_tool_cache(&mut state, &EngineConfig::default(), &messages);
        // Same transcript resynced; the counter reflects one walk, not two.
        assert_eq!(state.nudge_counter, 1);
    }

    #[test]
    fn cache_stays_within_bound_evicting_oldest() {
        let mut state = state();
        let mut messages = Vec::new();
        for i in 0..=MAX_TOOL_CACHE_SIZE {
            messages.push(tool_msg(&format!("msg_{i}"), &format!("call_{i}"), "read"));
        }
        sync_tool_cache(&mut state, &EngineConfig::default(), &messages);
        assert_eq!(state.tool_cache.len(), MAX_TOOL_CACHE_SIZE);
        assert!(!state.tool_cache.contains("call_0"));
        assert!(state.tool_cache.contains(&format!("call_{MAX_TOOL_CACHE_SIZE}")));
    }
}
