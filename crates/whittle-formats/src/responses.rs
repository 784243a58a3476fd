//! OpenAI Responses API: top-level `input` item list mixing `message`,
//! `function_call`, and `function_call_output` items; system text in the
//! `instructions` string.

use serde_json::{json, Value};

use whittle_core::state::ToolMetadataCache;

use crate::{FormatVariant, ToolOutputRef, WireFormat};

pub struct ResponsesFormat;

impl WireFormat for ResponsesFormat {
    fn variant(&self) -> FormatVariant {
        FormatVariant::Responses
    }

    fn detect(&self, body: &Value) -> bool {
        body["input"].is_array()
    }

    fn data_array<'a>(&self, body: &'a mut Value) -> Option<&'a mut Vec<Value>> {
        body.get_mut("input")?.as_array_mut()
    }

    fn inject_system_message(&self, body: &mut Value, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        // `instructions` is a plain string in this protocol; the injection
        // appends after a blank line so the original text reads first.
        match body["instructions"].as_str() {
            Some(existing) if !existing.is_empty() => {
                let combined = format!("{existing}\n\n{text}");
                body["instructions"] = json!(combined);
            }
            _ => {
                body["instructions"] = json!(text);
            }
        }
        true
    }

    fn append_to_last_assistant(&self, data: &mut [Value], text: &str) -> bool {
        for entry in data.iter_mut().rev() {
            if entry["type"] != "message" || entry["role"] != "assistant" {
                continue;
            }
            // Tool invocations are separate `function_call` items, so the
            // message's own content list just gains a trailing text unit.
            match &mut entry["content"] {
                Value::String(existing) => {
                    let combined = format!("{existing}\n\n{text}");
                    entry["content"] = json!(combined);
                }
                Value::Array(units) => {
                    units.push(json!({"type": "output_text", "text": text}));
                }
                _ => {
                    entry["content"] = json!([{"type": "output_text", "text": text}]);
                }
            }
            return true;
        }
        false
    }

    fn extract_tool_outputs(&self, data: &[Value], cache: &ToolMetadataCache) -> Vec<ToolOutputRef> {
        let mut outputs = Vec::new();
        for item in data {
            if item["type"] != "function_call_output" {
                continue;
            }
            if let Some(id) = item["call_id"].as_str() {
                let id = id.to_lowercase();
                let tool_name = cache.get(&id).map(|r| r.tool.clone());
                outputs.push(ToolOutputRef { id, tool_name });
            }
        }
        outputs
    }

    fn replace_tool_output(&self, data: &mut [Value], id: &str, replacement: &str) -> bool {
        let mut replaced = false;
        for item in data.iter_mut() {
            if item["type"] != "function_call_output" {
                continue;
            }
            let matches = item["call_id"]
                .as_str()
                .is_some_and(|cid| cid.eq_ignore_ascii_case(id));
            if matches {
                item["output"] = json!(replacement);
                replaced = true;
            }
        }
        replaced
    }

    fn has_tool_outputs(&self, data: &[Value]) -> bool {
        data.iter().any(|item| item["type"] == "function_call_output")
    }
}
