//! End-of-turn notification text. Delivery goes through the host's
//! [`Notifier`]; failures are the caller's to log and swallow.

use whittle_core::errors::HostError;
use whittle_core::host::Notifier;
use whittle_core::state::{PruneStats, SessionState};

use crate::config::{EngineConfig, NotificationLevel};

/// `850 tokens`, `1.2K tokens`, `12K tokens`.
pub fn format_token_count(tokens: u64) -> String {
    if tokens >= 1000 {
        let mut k = format!("{:.1}", tokens as f64 / 1000.0);
        if let Some(trimmed) = k.strip_suffix(".0") {
            k = trimmed.to_string();
        }
        format!("{k}K tokens")
    } else {
        format!("{tokens} tokens")
    }
}

fn stats_header(stats: &PruneStats) -> String {
    format!(
        "Pruned ~{} this session (~{} pending)",
        format_token_count(stats.total_prune_tokens + stats.prune_token_counter),
        format_token_count(stats.prune_token_counter),
    )
}

/// Notification body for a completed squash, or None when notifications are
/// off. Minimal keeps the stats header; detailed adds the range breakdown.
pub fn build_squash_notification(
    config: &EngineConfig,
    stats: &PruneStats,
    topic: &str,
    summary: Option<&str>,
    messages_squashed: usize,
    tool_calls: usize,
) -> Option<String> {
    match config.notification {
        NotificationLevel::Off => None,
        NotificationLevel::Minimal => Some(stats_header(stats)),
        NotificationLevel::Detailed => {
            let mut message = stats_header(stats);
            message.push_str(&format!(
                "\n\n\u{25a3} Squashing (~{})",
                format_token_count(stats.prune_token_counter)
            ));
            message.push_str(&format!("\n\u{2192} Topic: {topic}"));
            if tool_calls > 0 {
                message.push_str(&format!(
                    "\n\u{2192} Items: {messages_squashed} messages and {tool_calls} tools condensed"
                ));
            } else {
                message.push_str(&format!(
                    "\n\u{2192} Items: {messages_squashed} messages condensed"
                ));
            }
            if let Some(summary) = summary {
                message.push_str(&format!("\n\u{2192} Summary: {summary}"));
            }
            Some(message)
        }
    }
}

pub async fn send_squash_notification(
    notifier: &dyn Notifier,
    config: &EngineConfig,
    state: &SessionState,
    topic: &str,
    summary: Option<&str>,
    messages_squashed: usize,
    tool_calls: usize,
) -> Result<(), HostError> {
    let Some(message) = build_squash_notification(
        config,
        &state.stats,
        topic,
        summary,
        messages_squashed,
        tool_calls,
    ) else {
        return Ok(());
    };
    notifier.toast(&state.session_id, &message).await
}
