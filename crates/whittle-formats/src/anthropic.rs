//! Anthropic Messages API: top-level `system` (string or block list),
//! `tool_use` blocks in assistant content, `tool_result` blocks in user
//! content keyed by `tool_use_id`.

use serde_json::{json, Value};

use whittle_core::state::ToolMetadataCache;

use crate::{FormatVariant, ToolOutputRef, WireFormat};

pub struct AnthropicFormat;

impl WireFormat for AnthropicFormat {
    fn variant(&self) -> FormatVariant {
        FormatVariant::Anthropic
    }

    fn detect(&self, body: &Value) -> bool {
        !body["system"].is_null() && body["messages"].is_array()
    }

    fn data_array<'a>(&self, body: &'a mut Value) -> Option<&'a mut Vec<Value>> {
        body.get_mut("messages")?.as_array_mut()
    }

    fn inject_system_message(&self, body: &mut Value, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        // Scalar system prompt upgrades to a single-element block list so
        // the original instruction survives ahead of the injected one.
        if let Some(existing) = body["system"].as_str() {
            body["system"] = json!([{"type": "text", "text": existing}]);
        } else if !body["system"].is_array() {
            body["system"] = json!([]);
        }
        if let Some(blocks) = body["system"].as_array_mut() {
            blocks.push(json!({"type": "text", "text": text}));
        }
        true
    }

    fn append_to_last_assistant(&self, data: &mut [Value], text: &str) -> bool {
        for entry in data.iter_mut().rev() {
            if entry["role"] != "assistant" {
                continue;
            }
            match &mut entry["content"] {
                Value::String(existing) => {
                    let existing = existing.clone();
                    entry["content"] = json!([
                        {"type": "text", "text": existing},
                        {"type": "text", "text": text},
                    ]);
                }
                Value::Array(blocks) => {
                    let at = blocks
                        .iter()
                        .position(|b| b["type"] == "tool_use")
                        .unwrap_or(blocks.len());
                    blocks.insert(at, json!({"type": "text", "text": text}));
                }
                _ => {
                    entry["content"] = json!([{"type": "text", "text": text}]);
                }
            }
            return true;
        }
        false
    }

    fn extract_tool_outputs(&self, data: &[Value], cache: &ToolMetadataCache) -> Vec<ToolOutputRef> {
        let mut outputs = Vec::new();
        for entry in data {
            if entry["role"] != "user" {
                continue;
            }
            let Some(blocks) = entry["content"].as_array() else {
                continue;
            };
            for block in blocks {
                if block["type"] != "tool_result" {
                    continue;
                }
                if let Some(id) = block["tool_use_id"].as_str() {
                    let id = id.to_lowercase();
                    let tool_name = cache.get(&id).map(|r| r.tool.clone());
                    outputs.push(ToolOutputRef { id, tool_name });
                }
            }
        }
        outputs
    }

    fn replace_tool_output(&self, data: &mut [Value], id: &str, replacement: &str) -> bool {
        let mut replaced = false;
        for entry in data.iter_mut() {
            if entry["role"] != "user" {
                continue;
            }
            let Some(blocks) = entry["content"].as_array_mut() else {
                continue;
            };
            for block in blocks {
                if block["type"] != "tool_result" {
                    continue;
                }
                let matches = block["tool_use_id"]
                    .as_str()
                    .is_some_and(|bid| bid.eq_ignore_ascii_case(id));
                if matches {
                    // tool_result content may be a string or a block list;
                    // either collapses to the plain replacement string.
                    block["content"] = json!(replacement);
                    replaced = true;
                }
            }
        }
        replaced
    }

    fn has_tool_outputs(&self, data: &[Value]) -> bool {
        data.iter().any(|entry| {
            entry["role"] == "user"
                && entry["content"]
                    .as_array()
                    .is_some_and(|blocks| blocks.iter().any(|b| b["type"] == "tool_result"))
        })
    }
}
