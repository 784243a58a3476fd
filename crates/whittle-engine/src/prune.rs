//! In-place redaction of tool-call parts marked in the session's prune set.
//! Pruning never removes a message or part, so positions and identifiers
//! stay stable for the squash and nudge logic that scans by position.

use tracing::debug;

use whittle_core::messages::{Part, ToolStatus, TranscriptMessage};
use whittle_core::state::SessionState;
use whittle_core::tokens::{estimate_batch, TokenEstimator};

use crate::config::QUESTION_TOOL;

pub const PRUNED_TOOL_OUTPUT: &str =
    "[Output removed to save context - information superseded or no longer needed]";
pub const PRUNED_ERROR_INPUT: &str = "[input removed due to failed tool call]";
pub const PRUNED_QUESTION_INPUT: &str = "[questions removed - see output for user's answers]";

/// Run all three prune passes. Idempotent: pruned parts are rewritten to the
/// same placeholder on every run.
pub fn prune(state: &SessionState, messages: &mut [TranscriptMessage]) {
    let mut outputs = 0usize;
    let mut question_inputs = 0usize;
    let mut error_inputs = 0usize;

    for msg in messages.iter_mut() {
        if msg.is_compacted() {
            // Compaction is terminal host state; never re-prune it.
            continue;
        }
        for part in &mut msg.parts {
            let Part::Tool { call_id, tool, state: call_state } = part else {
                continue;
            };
            if !state.prune.contains_tool(call_id.as_str()) {
                continue;
            }
            match call_state.status {
                ToolStatus::Completed if tool != QUESTION_TOOL => {
                    call_state.output = Some(PRUNED_TOOL_OUTPUT.into());
                    outputs += 1;
                }
                ToolStatus::Completed => {
                    if let Some(questions) = call_state.input.get_mut("questions") {
                        *questions = serde_json::Value::String(PRUNED_QUESTION_INPUT.into());
                        question_inputs += 1;
                    }
                }
                ToolStatus::Error => {
                    if let Some(fields) = call_state.input.as_object_mut() {
                        for value in fields.values_mut() {
                            if value.is_string() {
                                *value = serde_json::Value::String(PRUNED_ERROR_INPUT.into());
                            }
                        }
                        error_inputs += 1;
                    }
                }
                ToolStatus::Pending => {}
            }
        }
    }

    debug!(outputs, question_inputs, error_inputs, "prune passes applied");
}

/// Approximate tokens saved by pruning the given call ids: the estimated
/// size of each pruned output, question payload, or error text.
pub fn tokens_saved(
    estimator: &dyn TokenEstimator,
    messages: &[TranscriptMessage],
    prune_tool_ids: &[String],
) -> u64 {
    let mut contents: Vec<String> = Vec::new();
    for msg in messages {
        if msg.is_compacted() {
            continue;
        }
        for part in &msg.parts {
            let Part::Tool { call_id, tool, state: call_state } = part else {
                continue;
            };
            if !prune_tool_ids.iter().any(|id| id.eq_ignore_ascii_case(call_id.as_str())) {
                continue;
            }
            if tool == QUESTION_TOOL {
                if let Some(questions) = call_state.input.get("questions") {
                    contents.push(match questions.as_str() {
                        Some(s) => s.to_string(),
                        None => questions.to_string(),
                    });
                }
                continue;
            }
            match call_state.status {
                ToolStatus::Completed => {
                    if let Some(output) = &call_state.output {
                        contents.push(output.clone());
                    }
                }
                ToolStatus::Error => {
                    if let Some(error) = &call_state.error {
                        contents.push(error.clone());
                    }
                }
                ToolStatus::Pending => {}
            }
        }
    }
    estimate_batch(estimator, &contents)
}
