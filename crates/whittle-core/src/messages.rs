use serde::{Deserialize, Serialize};

use crate::ids::{MessageId, ToolCallId};

/// One entry of the host-side transcript: a message plus its parts.
/// This is the shape the host's message-retrieval call hands the engine
/// each turn; the engine never constructs these itself outside of tests.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub id: MessageId,
    pub role: Role,
    /// Set by the host once its own compaction has replaced this message.
    /// Compaction is terminal: the engine never re-prunes compacted content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compacted_at: Option<String>,
    pub parts: Vec<Part>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        synthetic: bool,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        ignored: bool,
    },
    Tool {
        call_id: ToolCallId,
        tool: String,
        state: ToolCallState,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCallState {
    pub status: ToolStatus,
    #[serde(default)]
    pub input: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compacted_at: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Pending,
    Completed,
    Error,
}

impl TranscriptMessage {
    pub fn is_compacted(&self) -> bool {
        self.compacted_at.is_some()
    }

    /// Flatten everything a squash anchor may land in: text parts, tool
    /// inputs, outputs, and errors, in part order.
    pub fn flattened_text(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Text { text, .. } => out.push_str(text),
                Part::Tool { state, .. } => {
                    if !state.input.is_null() {
                        out.push_str(&state.input.to_string());
                    }
                    if let Some(output) = &state.output {
                        out.push_str(output);
                    }
                    if let Some(error) = &state.error {
                        out.push_str(error);
                    }
                }
            }
            out.push('\n');
        }
        out
    }

    pub fn tool_call_ids(&self) -> Vec<&ToolCallId> {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Tool { call_id, .. } => Some(call_id),
                _ => None,
            })
            .collect()
    }
}

// --- Convenience constructors (mainly for tests and the debug binary) ---

impl TranscriptMessage {
    pub fn user_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::from_raw(id),
            role: Role::User,
            compacted_at: None,
            parts: vec![Part::Text {
                text: text.into(),
                synthetic: false,
                ignored: false,
            }],
        }
    }

    pub fn assistant_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::from_raw(id),
            role: Role::Assistant,
            compacted_at: None,
            parts: vec![Part::Text {
                text: text.into(),
                synthetic: false,
                ignored: false,
            }],
        }
    }

    pub fn with_tool_part(
        mut self,
        call_id: impl Into<String>,
        tool: impl Into<String>,
        state: ToolCallState,
    ) -> Self {
        self.parts.push(Part::Tool {
            call_id: ToolCallId::from_raw(call_id),
            tool: tool.into(),
            state,
        });
        self
    }
}

impl ToolCallState {
    pub fn completed(input: serde_json::Value, output: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Completed,
            input,
            output: Some(output.into()),
            error: None,
            compacted_at: None,
        }
    }

    pub fn errored(input: serde_json::Value, error: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Error,
            input,
            output: None,
            error: Some(error.into()),
            compacted_at: None,
        }
    }
}
