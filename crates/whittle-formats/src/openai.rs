//! OpenAI chat completions: flat `messages` array, tool calls under the
//! assistant's `tool_calls` field, results as whole `role: "tool"` messages
//! keyed by `tool_call_id`. Detection is the fallback case — a `messages`
//! array without Anthropic's top-level `system`.

use serde_json::{json, Value};

use whittle_core::state::ToolMetadataCache;

use crate::{FormatVariant, ToolOutputRef, WireFormat};

pub struct OpenAiChatFormat;

impl WireFormat for OpenAiChatFormat {
    fn variant(&self) -> FormatVariant {
        FormatVariant::OpenaiChat
    }

    fn detect(&self, body: &Value) -> bool {
        body["messages"].is_array() && body["system"].is_null()
    }

    fn data_array<'a>(&self, body: &'a mut Value) -> Option<&'a mut Vec<Value>> {
        body.get_mut("messages")?.as_array_mut()
    }

    fn inject_system_message(&self, body: &mut Value, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let Some(messages) = body.get_mut("messages").and_then(|m| m.as_array_mut()) else {
            return false;
        };
        // Keep system instructions contiguous at the head of the list.
        let at = messages
            .iter()
            .take_while(|m| m["role"] == "system" || m["role"] == "developer")
            .count();
        messages.insert(at, json!({"role": "system", "content": text}));
        true
    }

    fn append_to_last_assistant(&self, data: &mut [Value], text: &str) -> bool {
        for entry in data.iter_mut().rev() {
            if entry["role"] != "assistant" {
                continue;
            }
            // Tool invocations live in `tool_calls`, not in content, so the
            // text always trails the existing rationale.
            match &mut entry["content"] {
                Value::String(existing) => {
                    let combined = format!("{existing}\n\n{text}");
                    entry["content"] = json!(combined);
                }
                Value::Array(parts) => {
                    parts.push(json!({"type": "text", "text": text}));
                }
                _ => {
                    entry["content"] = json!(text);
                }
            }
            return true;
        }
        false
    }

    fn extract_tool_outputs(&self, data: &[Value], cache: &ToolMetadataCache) -> Vec<ToolOutputRef> {
        let mut outputs = Vec::new();
        for entry in data {
            if entry["role"] != "tool" {
                continue;
            }
            if let Some(id) = entry["tool_call_id"].as_str() {
                let id = id.to_lowercase();
                let tool_name = cache.get(&id).map(|r| r.tool.clone());
                outputs.push(ToolOutputRef { id, tool_name });
            }
        }
        outputs
    }

    fn replace_tool_output(&self, data: &mut [Value], id: &str, replacement: &str) -> bool {
        let mut replaced = false;
        for entry in data.iter_mut() {
            if entry["role"] != "tool" {
                continue;
            }
            let matches = entry["tool_call_id"]
                .as_str()
                .is_some_and(|eid| eid.eq_ignore_ascii_case(id));
            if matches {
                entry["content"] = json!(replacement);
                replaced = true;
            }
        }
        replaced
    }

    fn has_tool_outputs(&self, data: &[Value]) -> bool {
        data.iter().any(|entry| entry["role"] == "tool")
    }
}
