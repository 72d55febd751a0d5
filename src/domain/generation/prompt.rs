//! Deterministic prompt assembly for Section Generator (C3), step 1.
//!
//! Concatenation order is fixed so that identical inputs always produce a
//! byte-identical prompt: `structural_path`, `prompt_config`,
//! `hierarchy_context`, `client_data`, `surrounding_context`.

use serde_json::Value;

use crate::domain::foundation::sha256_hex_canonical_json;

/// The per-section fields a `GenerationInput` carries, as needed to build a
/// prompt. Borrowed rather than owned since the caller already holds the
/// `GenerationInput` this is assembled from.
pub struct PromptInputs<'a> {
    pub structural_path: &'a str,
    pub prompt_config: &'a Value,
    pub hierarchy_context: &'a Value,
    pub client_data: &'a Value,
    pub surrounding_context: &'a Value,
}

/// Builds the prompt text in the fixed order §4.3 mandates.
pub fn assemble_prompt(inputs: &PromptInputs<'_>) -> String {
    let mut prompt = String::new();
    prompt.push_str("structural_path: ");
    prompt.push_str(inputs.structural_path);
    prompt.push('\n');

    prompt.push_str("prompt_config: ");
    prompt.push_str(&inputs.prompt_config.to_string());
    prompt.push('\n');

    prompt.push_str("hierarchy_context: ");
    prompt.push_str(&inputs.hierarchy_context.to_string());
    prompt.push('\n');

    prompt.push_str("client_data: ");
    prompt.push_str(&inputs.client_data.to_string());
    prompt.push('\n');

    prompt.push_str("surrounding_context: ");
    prompt.push_str(&inputs.surrounding_context.to_string());

    prompt
}

/// The fingerprint of a single section's input, used by the Batch Executor
/// for content addressing and by the Regeneration Planner for reuse
/// decisions: `hash(section_id, canonicalized client_data merged with
/// per-section override)`.
pub fn input_hash(section_id_str: &str, client_data: &Value, section_override: Option<&Value>) -> Result<String, serde_json::Error> {
    let mut merged = client_data.clone();
    if let Some(over) = section_override {
        merge_json(&mut merged, over);
    }
    let keyed = serde_json::json!({ "section_id": section_id_str, "client_data": merged });
    sha256_hex_canonical_json(&keyed)
}

fn merge_json(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (k, v) in overlay_map {
                merge_json(base_map.entry(k.clone()).or_insert(Value::Null), v);
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_inputs_produce_byte_identical_prompts() {
        let prompt_config = json!({"tone": "formal"});
        let hierarchy = json!({"parent": "body"});
        let client_data = json!({"client_name": "Acme Corp"});
        let surrounding = json!({"previous_heading": "Scope"});

        let a = assemble_prompt(&PromptInputs {
            structural_path: "body/introduction",
            prompt_config: &prompt_config,
            hierarchy_context: &hierarchy,
            client_data: &client_data,
            surrounding_context: &surrounding,
        });
        let b = assemble_prompt(&PromptInputs {
            structural_path: "body/introduction",
            prompt_config: &prompt_config,
            hierarchy_context: &hierarchy,
            client_data: &client_data,
            surrounding_context: &surrounding,
        });
        assert_eq!(a, b);
    }

    #[test]
    fn input_hash_is_order_independent_over_client_data_keys() {
        let a = json!({"client_name": "Acme", "matter": "NDA"});
        let b = json!({"matter": "NDA", "client_name": "Acme"});
        assert_eq!(input_hash("sec-1", &a, None).unwrap(), input_hash("sec-1", &b, None).unwrap());
    }

    #[test]
    fn input_hash_changes_with_override() {
        let base = json!({"client_name": "Acme"});
        let without = input_hash("sec-1", &base, None).unwrap();
        let with = input_hash("sec-1", &base, Some(&json!({"client_name": "Zenith"}))).unwrap();
        assert_ne!(without, with);
    }
}
