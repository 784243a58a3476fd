//! The per-request interception point: everything the engine does to one
//! outbound wire body happens here, in order, under one `&mut` borrow pair.

use serde_json::Value;
use tracing::info;

use whittle_core::state::SessionState;
use whittle_formats::{descriptor_for, detect_format, FormatVariant};

use crate::config::EngineConfig;
use crate::inject::{build_end_injection, build_prunable_list};
use crate::nudge::{observe_and_nudge, NudgeOutcome};
use crate::prune::PRUNED_TOOL_OUTPUT;

/// System notice added whenever this request carries placeholder-replaced
/// tool outputs, so the model knows the gaps are deliberate.
pub const CONTEXT_NOTICE: &str = include_str!("../prompts/context-notice.txt");

#[derive(Clone, Debug)]
pub struct RewriteSummary {
    pub format: FormatVariant,
    pub replaced: usize,
    pub nudged: bool,
    pub notice_injected: bool,
}

/// Rewrite one outbound request body in place. Returns None when the body's
/// format is not recognized or carries no message list; in that case the
/// body is untouched.
///
/// Order matters: pruned outputs are replaced before the result observation
/// pass, so placeholder units still count as seen results, and the system
/// notice goes in last, after the message list borrow ends.
pub fn rewrite_request(
    body: &mut Value,
    state: &mut SessionState,
    config: &EngineConfig,
    url: &str,
) -> Option<RewriteSummary> {
    let variant = detect_format(body)?;
    let format = descriptor_for(variant);

    let mut replaced = 0usize;
    let nudged;
    let metadata;
    {
        let data = format.data_array(body)?;

        for id in &state.prune.tool_ids {
            if format.replace_tool_output(data, id, PRUNED_TOOL_OUTPUT) {
                replaced += 1;
            }
        }

        let outcome = observe_and_nudge(
            format,
            data,
            &state.tool_cache,
            &mut state.tracker,
            config.nudge_frequency,
        );
        // An explicit prune just happened; reminding again is noise.
        let nudge_due = outcome == NudgeOutcome::Due && !state.last_tool_was_prune;

        let prunable = build_prunable_list(&state.tool_cache, &state.prune, config);
        let appended = match build_end_injection(prunable.as_deref(), nudge_due) {
            Some(text) => format.append_to_last_assistant(data, &text),
            None => false,
        };
        nudged = nudge_due && appended;

        metadata = format.log_metadata(data, replaced, url);
    }

    let notice_injected =
        replaced > 0 && format.inject_system_message(body, CONTEXT_NOTICE.trim_end());

    info!(
        session_id = %state.session_id,
        replaced,
        nudged,
        notice_injected,
        metadata = %metadata,
        "request body rewritten"
    );

    Some(RewriteSummary {
        format: variant,
        replaced,
        nudged,
        notice_injected,
    })
}
