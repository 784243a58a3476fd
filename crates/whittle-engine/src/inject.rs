//! Builds the pruning-awareness block injected at the end of each outbound
//! request: the numbered list of prunable tool calls, optionally followed by
//! the nudge reminder.

use whittle_core::state::{PruneSet, ToolCallRecord, ToolMetadataCache};

use crate::config::EngineConfig;
use crate::nudge::NUDGE_TEXT;

const PRUNABLE_LIST_INTRO: &str = "The following tools have been invoked and are available for \
pruning. This list does not mandate immediate action. Consider your current goals and the \
resources you need before discarding valuable tool outputs. Keep the context free of noise.";

const MAX_PARAMETER_LEN: usize = 60;

/// Representative parameter for one cached call: the most recognizable
/// string field of its input, truncated for display.
fn representative_parameter(record: &ToolCallRecord) -> Option<String> {
    const PREFERRED_KEYS: [&str; 8] =
        ["path", "filePath", "file_path", "command", "pattern", "query", "url", "description"];

    let fields = record.parameters.as_object()?;
    let preferred = PREFERRED_KEYS
        .iter()
        .find_map(|k| fields.get(*k).and_then(|v| v.as_str()));
    let value = preferred.or_else(|| fields.values().find_map(|v| v.as_str()))?;

    if value.chars().count() > MAX_PARAMETER_LEN {
        let cut: String = value.chars().take(MAX_PARAMETER_LEN).collect();
        Some(format!("{cut}..."))
    } else {
        Some(value.to_string())
    }
}

/// Numbered list of cached tool calls still eligible for pruning, wrapped in
/// a `<prunable-tools>` block. None when nothing is eligible. Entries come
/// out in insertion order, so numeric ids read chronologically.
pub fn build_prunable_list(
    cache: &ToolMetadataCache,
    prune: &PruneSet,
    config: &EngineConfig,
) -> Option<String> {
    let mut lines = Vec::new();
    for (call_id, record) in cache.iter() {
        if prune.contains_tool(call_id) || record.compacted {
            continue;
        }
        if config.is_protected(&record.tool) {
            continue;
        }
        let line = match representative_parameter(record) {
            Some(param) => format!("{}: {}, {param}", record.numeric_id, record.tool),
            None => format!("{}: {}", record.numeric_id, record.tool),
        };
        lines.push(line);
    }

    if lines.is_empty() {
        return None;
    }
    Some(format!(
        "<prunable-tools>\n{PRUNABLE_LIST_INTRO}\n{}\n</prunable-tools>",
        lines.join("\n")
    ))
}

/// The full end-of-request injection: the prunable list, plus the nudge text
/// when a result bucket was crossed this turn. Empty list means no injection
/// at all, nudge due or not.
pub fn build_end_injection(prunable_list: Option<&str>, include_nudge: bool) -> Option<String> {
    let list = prunable_list?;
    if include_nudge {
        Some(format!("{list}\n\n{}", NUDGE_TEXT.trim_end()))
    } else {
        Some(list.to_string())
    }
}
