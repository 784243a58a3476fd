//! Periodic context-management reminders, gated on newly observed tool
//! results rather than turns, so idle chatter never triggers one.

use serde_json::Value;
use tracing::debug;

use whittle_core::state::{ToolMetadataCache, ToolResultTracker};
use whittle_formats::WireFormat;

use crate::config::PRUNE_TOOL;

/// Reminder text appended when a result bucket is crossed.
pub const NUDGE_TEXT: &str = include_str!("../prompts/nudge.txt");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NudgeOutcome {
    Due,
    NotDue,
}

/// Count tool-result units in `data` whose ids the tracker has not seen yet.
/// Each new id is marked seen and clears `skip_next_idle`, except results of
/// the pruning tool itself, which must not cancel a pending idle skip.
pub fn observe_tool_results(
    format: &dyn WireFormat,
    data: &[Value],
    cache: &ToolMetadataCache,
    tracker: &mut ToolResultTracker,
) -> u64 {
    let mut newly_seen = 0u64;
    for output in format.extract_tool_outputs(data, cache) {
        if !tracker.mark_seen(&output.id) {
            continue;
        }
        newly_seen += 1;
        if output.tool_name.as_deref() != Some(PRUNE_TOOL) {
            tracker.skip_next_idle = false;
        }
    }
    tracker.result_count += newly_seen;
    newly_seen
}

/// Whether the count moved into a new bucket of size `freq`. Bucket
/// arithmetic instead of a modulo check: a batch that jumps past one or more
/// boundaries still fires exactly once.
pub fn bucket_crossed(before: u64, after: u64, freq: u64) -> bool {
    freq > 0 && after / freq > before / freq
}

/// Observe the body's tool results and report whether a bucket boundary was
/// crossed this turn. Appending [`NUDGE_TEXT`] is the caller's job: the
/// reminder travels with the prunable-tools block, which is assembled at the
/// request-rewrite site.
pub fn observe_and_nudge(
    format: &dyn WireFormat,
    data: &[Value],
    cache: &ToolMetadataCache,
    tracker: &mut ToolResultTracker,
    freq: u64,
) -> NudgeOutcome {
    let before = tracker.result_count;
    let newly_seen = observe_tool_results(format, data, cache, tracker);
    let after = tracker.result_count;

    if !bucket_crossed(before, after, freq) {
        return NudgeOutcome::NotDue;
    }
    debug!(before, after, newly_seen, "nudge due");
    NudgeOutcome::Due
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use whittle_formats::{descriptor_for, FormatVariant};

    fn openai_data(result_ids: &[&str]) -> Vec<Value> {
        let mut data = vec![
            json!({"role": "user", "content": "do the thing"}),
            json!({"role": "assistant", "content": "working on it"}),
        ];
        for id in result_ids {
            data.push(json!({"role": "tool", "tool_call_id": id, "content": "ok"}));
        }
        data
    }

    #[test]
    fn bucket_arithmetic_handles_batches_and_zero_freq() {
        assert!(!bucket_crossed(4, 4, 5));
        assert!(bucket_crossed(4, 5, 5));
        assert!(bucket_crossed(4, 6, 5));
        // Jumping past two boundaries is still one crossing event.
        assert!(bucket_crossed(4, 12, 5));
        assert!(!bucket_crossed(5, 6, 5));
        assert!(!bucket_crossed(0, 100, 0));
    }

    #[test]
    fn new_results_counted_once_case_insensitively() {
        let format = descriptor_for(FormatVariant::OpenaiChat);
        let cache = ToolMetadataCache::new();
        let mut tracker = ToolResultTracker::default();
        let data = openai_data(&["Call_1", "call_2"]);

        assert_eq!(observe_tool_results(format, &data, &cache, &mut tracker), 2);
        assert_eq!(tracker.result_count, 2);

        // Same ids again, different case: nothing new.
        let again = openai_data(&["call_1", "CALL_2"]);
        assert_eq!(observe_tool_results(format, &again, &cache, &mut tracker), 0);
        assert_eq!(tracker.result_count, 2);
    }

    #[test]
    fn non_prune_results_clear_skip_next_idle() {
        let format = descriptor_for(FormatVariant::OpenaiChat);
        let cache = ToolMetadataCache::new();
        let mut tracker = ToolResultTracker::default();
        tracker.skip_next_idle = true;
        observe_tool_results(format, &openai_data(&["call_1"]), &cache, &mut tracker);
        assert!(!tracker.skip_next_idle);
    }

    #[test]
    fn prune_results_leave_skip_next_idle_set() {
        let format = descriptor_for(FormatVariant::OpenaiChat);
        let mut cache = ToolMetadataCache::new();
        cache.insert_if_absent("call_prune", |numeric_id| whittle_core::state::ToolCallRecord {
            tool: PRUNE_TOOL.into(),
            parameters: json!({}),
            status: whittle_core::messages::ToolStatus::Completed,
            error: None,
            compacted: false,
            numeric_id,
        });
        let mut tracker = ToolResultTracker::default();
        tracker.skip_next_idle = true;
        observe_tool_results(format, &openai_data(&["call_prune"]), &cache, &mut tracker);
        assert!(tracker.skip_next_idle);
        assert_eq!(tracker.result_count, 1);
    }

    #[test]
    fn batch_crossing_a_boundary_is_due_exactly_once() {
        let format = descriptor_for(FormatVariant::OpenaiChat);
        let cache = ToolMetadataCache::new();
        let mut tracker = ToolResultTracker::default();
        tracker.result_count = 4;

        // Frequency 5, count 4; two new results land in one batch.
        let data = openai_data(&["call_5", "call_6"]);
        assert_eq!(
            observe_and_nudge(format, &data, &cache, &mut tracker, 5),
            NudgeOutcome::Due
        );
        assert_eq!(tracker.result_count, 6);

        // Re-observing the same body: nothing new, no second nudge.
        assert_eq!(
            observe_and_nudge(format, &data, &cache, &mut tracker, 5),
            NudgeOutcome::NotDue
        );
    }

    #[test]
    fn no_nudge_below_the_boundary() {
        let format = descriptor_for(FormatVariant::OpenaiChat);
        let cache = ToolMetadataCache::new();
        let mut tracker = ToolResultTracker::default();
        let data = openai_data(&["call_1", "call_2"]);
        assert_eq!(
            observe_and_nudge(format, &data, &cache, &mut tracker, 5),
            NudgeOutcome::NotDue
        );
        assert_eq!(tracker.result_count, 2);
    }
}
