//! Gemini generateContent: top-level `contents` with `user`/`model` roles,
//! `functionCall` parts on model turns, `functionResponse` parts on user
//! turns. System text lives in `systemInstruction`.

use serde_json::{json, Value};

use whittle_core::state::ToolMetadataCache;

use crate::{FormatVariant, ToolOutputRef, WireFormat};

pub struct GeminiFormat;

/// The id a functionResponse part goes by: the explicit `id` when present
/// (parallel calling), otherwise the function name.
fn response_id(part: &Value) -> Option<&str> {
    let response = part.get("functionResponse")?;
    response["id"].as_str().or_else(|| response["name"].as_str())
}

impl WireFormat for GeminiFormat {
    fn variant(&self) -> FormatVariant {
        FormatVariant::Gemini
    }

    fn detect(&self, body: &Value) -> bool {
        body["contents"].is_array()
    }

    fn data_array<'a>(&self, body: &'a mut Value) -> Option<&'a mut Vec<Value>> {
        body.get_mut("contents")?.as_array_mut()
    }

    fn inject_system_message(&self, body: &mut Value, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        // systemInstruction is a Content object; a bare string upgrades to
        // one so the existing instruction keeps its place.
        if let Some(existing) = body["systemInstruction"].as_str() {
            body["systemInstruction"] = json!({"parts": [{"text": existing}]});
        } else if body["systemInstruction"].get("parts").is_none() {
            body["systemInstruction"] = json!({"parts": []});
        }
        if let Some(parts) = body["systemInstruction"]["parts"].as_array_mut() {
            parts.push(json!({"text": text}));
        }
        true
    }

    fn append_to_last_assistant(&self, data: &mut [Value], text: &str) -> bool {
        for entry in data.iter_mut().rev() {
            if entry["role"] != "model" {
                continue;
            }
            let Some(parts) = entry["parts"].as_array_mut() else {
                entry["parts"] = json!([{"text": text}]);
                return true;
            };
            let at = parts
                .iter()
                .position(|p| p.get("functionCall").is_some())
                .unwrap_or(parts.len());
            parts.insert(at, json!({"text": text}));
            return true;
        }
        false
    }

    fn extract_tool_outputs(&self, data: &[Value], cache: &ToolMetadataCache) -> Vec<ToolOutputRef> {
        let mut outputs = Vec::new();
        for entry in data {
            let Some(parts) = entry["parts"].as_array() else {
                continue;
            };
            for part in parts {
                if let Some(id) = response_id(part) {
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
            let Some(parts) = entry["parts"].as_array_mut() else {
                continue;
            };
            for part in parts {
                let matches = response_id(part).is_some_and(|pid| pid.eq_ignore_ascii_case(id));
                if matches {
                    // The protocol requires `response` to stay an object, so
                    // the literal replacement is wrapped as its sole output.
                    part["functionResponse"]["response"] = json!({"output": replacement});
                    replaced = true;
                }
            }
        }
        replaced
    }

    fn has_tool_outputs(&self, data: &[Value]) -> bool {
        data.iter().any(|entry| {
            entry["parts"]
                .as_array()
                .is_some_and(|parts| parts.iter().any(|p| p.get("functionResponse").is_some()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> Value {
        json!({
            "contents": [
                {"role": "user", "parts": [{"text": "grep for the port"}]},
                {"role": "model", "parts": [
                    {"text": "Searching."},
                    {"functionCall": {"name": "grep", "args": {"pattern": "port"}}},
                ]},
                {"role": "user", "parts": [
                    {"functionResponse": {"id": "Call_AAA", "name": "grep", "response": {"result": "port = 8080"}}},
                ]},
            ],
        })
    }

    #[test]
    fn detects_contents_array() {
        let fmt = GeminiFormat;
        assert!(fmt.detect(&body()));
        assert!(!fmt.detect(&json!({"messages": []})));
    }

    #[test]
    fn inject_system_upgrades_string_instruction() {
        let fmt = GeminiFormat;
        let mut b = json!({"contents": [], "systemInstruction": "Base."});
        assert!(fmt.inject_system_message(&mut b, "Notice."));
        let parts = b["systemInstruction"]["parts"].as_array().unwrap();
        assert_eq!(parts[0]["text"], "Base.");
        assert_eq!(parts[1]["text"], "Notice.");
    }

    #[test]
    fn inject_system_creates_missing_instruction() {
        let fmt = GeminiFormat;
        let mut b = body();
        assert!(fmt.inject_system_message(&mut b, "Notice."));
        assert_eq!(b["systemInstruction"]["parts"][0]["text"], "Notice.");
    }

    #[test]
    fn append_lands_before_function_call() {
        let fmt = GeminiFormat;
        let mut b = body();
        let data = fmt.data_array(&mut b).unwrap();
        assert!(fmt.append_to_last_assistant(data, "Nudge."));
        let parts = data[1]["parts"].as_array().unwrap();
        assert_eq!(parts[0]["text"], "Searching.");
        assert_eq!(parts[1]["text"], "Nudge.");
        assert!(parts[2].get("functionCall").is_some());
    }

    #[test]
    fn append_fails_without_model_entry() {
        let fmt = GeminiFormat;
        let mut data = vec![json!({"role": "user", "parts": [{"text": "hi"}]})];
        assert!(!fmt.append_to_last_assistant(&mut data, "Nudge."));
    }

    #[test]
    fn extract_prefers_explicit_id() {
        let fmt = GeminiFormat;
        let mut b = body();
        let data = fmt.data_array(&mut b).unwrap();
        let outputs = fmt.extract_tool_outputs(data, &ToolMetadataCache::new());
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].id, "call_aaa");
    }

    #[test]
    fn extract_falls_back_to_function_name() {
        let fmt = GeminiFormat;
        let data = vec![json!({"role": "user", "parts": [
            {"functionResponse": {"name": "Grep", "response": {"result": "x"}}},
        ]})];
        let outputs = fmt.extract_tool_outputs(&data, &ToolMetadataCache::new());
        assert_eq!(outputs[0].id, "grep");
    }

    #[test]
    fn replace_wraps_literal_in_output_object() {
        let fmt = GeminiFormat;
        let mut b = body();
        let data = fmt.data_array(&mut b).unwrap();
        assert!(fmt.replace_tool_output(data, "call_aaa", "[pruned]"));
        let response = &data[2]["parts"][0]["functionResponse"]["response"];
        assert_eq!(response["output"], "[pruned]");
        assert!(response.get("result").is_none());
    }

    #[test]
    fn replace_misses_leave_body_untouched() {
        let fmt = GeminiFormat;
        let mut b = body();
        let data = fmt.data_array(&mut b).unwrap();
        assert!(!fmt.replace_tool_output(data, "call_zzz", "[pruned]"));
        assert_eq!(
            data[2]["parts"][0]["functionResponse"]["response"]["result"],
            "port = 8080"
        );
    }

    #[test]
    fn has_tool_outputs_finds_function_response() {
        let fmt = GeminiFormat;
        let mut b = body();
        let data = fmt.data_array(&mut b).unwrap();
        assert!(fmt.has_tool_outputs(data));
        assert!(!fmt.has_tool_outputs(&[json!({"role": "user", "parts": [{"text": "hi"}]})]));
    }
}
