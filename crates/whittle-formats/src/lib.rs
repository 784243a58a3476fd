//! Per-protocol strategies over wire-format request bodies.
//!
//! Everything downstream (pruning, nudging, system notices) goes through the
//! [`WireFormat`] contract, so supporting a fifth protocol means adding one
//! descriptor here and nothing anywhere else.

pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod responses;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use whittle_core::state::ToolMetadataCache;

/// The four supported wire protocols.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatVariant {
    Anthropic,
    OpenaiChat,
    Gemini,
    Responses,
}

/// A tool-result unit found in a wire body. `tool_name` is best-effort,
/// resolved through the session's metadata cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolOutputRef {
    pub id: String,
    pub tool_name: Option<String>,
}

/// Strategy implemented once per [`FormatVariant`].
pub trait WireFormat: Send + Sync {
    fn variant(&self) -> FormatVariant;

    /// Pure structural test. Under the fixed order in [`detect_format`],
    /// exactly one descriptor matches any well-formed body.
    fn detect(&self, body: &Value) -> bool;

    /// The ordered message-like list the remaining operations traverse.
    fn data_array<'a>(&self, body: &'a mut Value) -> Option<&'a mut Vec<Value>>;

    /// Append `text` as an additional system-level instruction. No-op on
    /// empty text. Scalar system representations are upgraded in place;
    /// pre-existing instructions are never dropped.
    fn inject_system_message(&self, body: &mut Value, text: &str) -> bool;

    /// Insert `text` into the most recent assistant entry, before its first
    /// tool-invocation unit if one exists. False when no assistant entry.
    fn append_to_last_assistant(&self, data: &mut [Value], text: &str) -> bool;

    /// All tool-result units, ids normalized to lower case.
    fn extract_tool_outputs(&self, data: &[Value], cache: &ToolMetadataCache) -> Vec<ToolOutputRef>;

    /// Case-insensitive id match; rewrites every matching result unit's
    /// content to the literal replacement, discarding structured
    /// sub-content. True iff at least one unit was modified.
    fn replace_tool_output(&self, data: &mut [Value], id: &str, replacement: &str) -> bool;

    fn has_tool_outputs(&self, data: &[Value]) -> bool;

    /// Diagnostic summary for request logging. No side effects.
    fn log_metadata(&self, data: &[Value], replaced: usize, url: &str) -> Value {
        serde_json::json!({
            "format": self.variant(),
            "url": url,
            "replaced_count": replaced,
            "total_messages": data.len(),
        })
    }
}

static ANTHROPIC: anthropic::AnthropicFormat = anthropic::AnthropicFormat;
static GEMINI: gemini::GeminiFormat = gemini::GeminiFormat;
static RESPONSES: responses::ResponsesFormat = responses::ResponsesFormat;
static OPENAI: openai::OpenAiChatFormat = openai::OpenAiChatFormat;

/// Detection order is significant and fixed: the more specific markers come
/// first (top-level `system`, `contents`, `input`) so that the generic
/// OpenAI-chat `messages` test never shadows another protocol.
pub fn detect_format(body: &Value) -> Option<FormatVariant> {
    for format in all_formats() {
        if format.detect(body) {
            return Some(format.variant());
        }
    }
    None
}

pub fn descriptor_for(variant: FormatVariant) -> &'static dyn WireFormat {
    match variant {
        FormatVariant::Anthropic => &ANTHROPIC,
        FormatVariant::Gemini => &GEMINI,
        FormatVariant::Responses => &RESPONSES,
        FormatVariant::OpenaiChat => &OPENAI,
    }
}

/// All descriptors in detection order.
pub fn all_formats() -> [&'static dyn WireFormat; 4] {
    [&ANTHROPIC, &GEMINI, &RESPONSES, &OPENAI]
}
