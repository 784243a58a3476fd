//! Squash: collapse an inclusive message range, located by unique text
//! anchors, into one author-supplied summary. The squash marks everything in
//! the range for pruning and records the summary; actual removal at render
//! time is the host's job, keyed by the anchor message id.

use std::sync::Arc;

use tracing::{error, info, warn};

use whittle_core::errors::SquashError;
use whittle_core::host::{Notifier, StateStore};
use whittle_core::messages::TranscriptMessage;
use whittle_core::state::{SessionState, SquashSummary};
use whittle_core::tokens::{estimate_batch, TokenEstimator};

use crate::config::EngineConfig;
use crate::notify::send_squash_notification;

/// Tool description for the host-facing squash tool.
pub const SQUASH_TOOL_DESCRIPTION: &str = include_str!("../prompts/squash-tool.txt");

/// The four ordered strings the squash tool accepts.
#[derive(Clone, Debug)]
pub struct SquashRequest {
    pub start: String,
    pub end: String,
    pub topic: String,
    pub summary: String,
}

struct AnchorHit {
    message_index: usize,
    message_id: String,
}

/// Locate `needle` in the flattened text of the transcript. The anchor must
/// land in exactly one message; ambiguity would squash an unpredictable
/// range, so the operation refuses rather than guesses.
fn find_anchor(
    messages: &[TranscriptMessage],
    needle: &str,
    which: &'static str,
) -> Result<AnchorHit, SquashError> {
    let mut hit: Option<AnchorHit> = None;
    let mut matches = 0usize;

    for (index, msg) in messages.iter().enumerate() {
        if msg.flattened_text().contains(needle) {
            matches += 1;
            if hit.is_none() {
                hit = Some(AnchorHit {
                    message_index: index,
                    message_id: msg.id.as_str().to_string(),
                });
            }
        }
    }

    match matches {
        0 => Err(SquashError::AnchorNotFound {
            which,
            anchor: SquashError::truncate_anchor(needle),
        }),
        1 => Ok(hit.expect("one match recorded")),
        _ => Err(SquashError::AnchorAmbiguous {
            which,
            anchor: SquashError::truncate_anchor(needle),
        }),
    }
}

/// Resolve and apply one squash. Anchor errors surface to the caller; the
/// notification is awaited but its failure only logs; persistence is fired
/// onto a detached task and the in-memory state stays authoritative.
pub async fn run_squash(
    state: &mut SessionState,
    config: &EngineConfig,
    estimator: &dyn TokenEstimator,
    notifier: &dyn Notifier,
    store: Arc<dyn StateStore>,
    messages: &[TranscriptMessage],
    request: SquashRequest,
) -> Result<String, SquashError> {
    let start = find_anchor(messages, &request.start, "startString")?;
    let end = find_anchor(messages, &request.end, "endString")?;

    if start.message_index > end.message_index {
        return Err(SquashError::StartAfterEnd);
    }

    let range = &messages[start.message_index..=end.message_index];

    let contained_tool_ids: Vec<String> = range
        .iter()
        .flat_map(|m| m.tool_call_ids())
        .map(|id| id.as_str().to_string())
        .collect();
    let contained_message_ids: Vec<String> =
        range.iter().map(|m| m.id.as_str().to_string()).collect();

    state.prune.tool_ids.extend(contained_tool_ids.iter().cloned());
    state.prune.message_ids.extend(contained_message_ids.iter().cloned());

    // A larger squash absorbs any summary whose anchor now sits inside it,
    // so overlapping ranges never inject twice.
    let before = state.squash_summaries.len();
    state
        .squash_summaries
        .retain(|s| !contained_message_ids.iter().any(|id| id == s.anchor_message_id.as_str()));
    let subsumed = before - state.squash_summaries.len();

    state.squash_summaries.push(SquashSummary {
        anchor_message_id: whittle_core::ids::MessageId::from_raw(&start.message_id),
        summary: request.summary.clone(),
    });

    let flattened: Vec<String> = range.iter().map(|m| m.flattened_text()).collect();
    let estimated_tokens = estimate_batch(estimator, &flattened);
    state.stats.prune_token_counter += estimated_tokens;

    let messages_squashed = end.message_index - start.message_index + 1;
    info!(
        session_id = %state.session_id,
        messages_squashed,
        tool_calls = contained_tool_ids.len(),
        subsumed,
        estimated_tokens,
        topic = %request.topic,
        "squash range created"
    );

    if let Err(err) = send_squash_notification(
        notifier,
        config,
        state,
        &request.topic,
        Some(&request.summary),
        messages_squashed,
        contained_tool_ids.len(),
    )
    .await
    {
        warn!(%err, "squash notification failed");
    }

    state.stats.fold();
    state.nudge_counter = 0;

    // Fire-and-forget persistence; the spawned task owns its error channel.
    let snapshot = state.clone();
    tokio::spawn(async move {
        if let Err(err) = store.persist(&snapshot).await {
            error!(%err, session_id = %snapshot.session_id, "failed to persist session state");
        }
    });

    Ok(format!(
        "Squashed {messages_squashed} messages ({} tool calls) into summary. \
         The content will be replaced with your summary.",
        contained_tool_ids.len()
    ))
}
