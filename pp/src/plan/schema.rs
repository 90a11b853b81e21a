//! JSON schema for the plan shape
//!
//! Sent with every completion request so the model is constrained to strict,
//! schema-conforming JSON. Matches the serialized form of `DiagnosePlan`.
//! Only keywords strict structured outputs accept appear here; non-blank
//! strings are left to the validator.

use serde_json::{Value, json};

use super::validator::{MAX_RETEST_HOURS, MIN_RETEST_HOURS};

/// Name the schema is registered under in the completion request
pub const SCHEMA_NAME: &str = "pool_diagnose_plan";

fn string_list() -> Value {
    json!({
        "type": "array",
        "minItems": 1,
        "items": { "type": "string" }
    })
}

/// The plan schema
pub fn plan_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": [
            "diagnosis",
            "confidence",
            "steps",
            "chemical_additions",
            "safety_notes",
            "retest_in_hours",
            "when_to_call_pro"
        ],
        "properties": {
            "diagnosis": { "type": "string" },
            "confidence": { "type": "string", "enum": ["High", "Medium", "Low"] },
            "steps": string_list(),
            "chemical_additions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["chemical", "amount", "unit", "instructions"],
                    "properties": {
                        "chemical": { "type": "string" },
                        "amount": { "type": "string" },
                        "unit": { "type": "string" },
                        "instructions": { "type": "string" }
                    }
                }
            },
            "safety_notes": string_list(),
            "retest_in_hours": {
                "type": "integer",
                "minimum": MIN_RETEST_HOURS,
                "maximum": MAX_RETEST_HOURS
            },
            "when_to_call_pro": string_list()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_matches_properties() {
        let schema = plan_schema();
        let props = schema["properties"].as_object().unwrap();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(required.len(), props.len());
        for name in required {
            assert!(props.contains_key(name), "{} missing from properties", name);
        }
    }

    #[test]
    fn test_fallback_plan_matches_schema_fields() {
        let plan = serde_json::to_value(crate::plan::fallback::build("x", None)).unwrap();
        let schema = plan_schema();
        let props = schema["properties"].as_object().unwrap();
        for key in plan.as_object().unwrap().keys() {
            assert!(props.contains_key(key), "{} not in schema", key);
        }
        assert_eq!(schema["properties"]["retest_in_hours"]["maximum"], 48);
    }

    fn collect_keys(value: &Value, keys: &mut Vec<String>) {
        match value {
            Value::Object(map) => {
                for (k, v) in map {
                    keys.push(k.clone());
                    collect_keys(v, keys);
                }
            }
            Value::Array(items) => items.iter().for_each(|v| collect_keys(v, keys)),
            _ => {}
        }
    }

    #[test]
    fn test_no_string_length_keywords() {
        let mut keys = Vec::new();
        collect_keys(&plan_schema(), &mut keys);
        for keyword in ["minLength", "maxLength", "pattern", "format"] {
            assert!(!keys.iter().any(|k| k == keyword), "{} not allowed in strict schema", keyword);
        }
        assert!(keys.iter().any(|k| k == "minItems"));
        assert!(keys.iter().any(|k| k == "additionalProperties"));
    }
}
