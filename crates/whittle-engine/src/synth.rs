//! Injection of a synthetic instruction into the latest real user entry of a
//! wire body. Entries the engine itself produced (flagged `synthetic` or
//! `ignored`) never receive the instruction, and an instruction already
//! present is never duplicated.

use serde_json::{json, Value};

/// A user entry the injector must skip: explicitly flagged ignored, flagged
/// synthetic, or array content whose every sub-unit is flagged ignored.
pub fn is_ignored_user_entry(entry: &Value) -> bool {
    if entry["role"] != "user" {
        return false;
    }
    if entry["ignored"].as_bool().unwrap_or(false)
        || entry["synthetic"].as_bool().unwrap_or(false)
    {
        return true;
    }
    if let Some(parts) = entry["content"].as_array() {
        if !parts.is_empty()
            && parts.iter().all(|p| p["ignored"].as_bool().unwrap_or(false))
        {
            return true;
        }
    }
    false
}

/// Append `instruction` to the most recent non-ignored user entry. String
/// content is extended in place; array content gains one text unit. Returns
/// false when no eligible entry exists or the instruction is already there.
pub fn inject_synth_instruction(data: &mut [Value], instruction: &str) -> bool {
    for entry in data.iter_mut().rev() {
        if entry["role"] != "user" || is_ignored_user_entry(entry) {
            continue;
        }
        match &mut entry["content"] {
            Value::String(text) => {
                if text.contains(instruction) {
                    return false;
                }
                text.push_str("\n\n");
                text.push_str(instruction);
            }
            Value::Array(parts) => {
                let already_present = parts.iter().any(|p| {
                    p["type"] == "text"
                        && p["text"].as_str().is_some_and(|t| t.contains(instruction))
                });
                if already_present {
                    return false;
                }
                parts.push(json!({"type": "text", "text": instruction}));
            }
            _ => continue,
        }
        return true;
    }
    false
}
