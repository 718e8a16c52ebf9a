#![allow(dead_code)]

use formwork_runtime::{Context, Value};

pub const SCHEMAS: &str = r#"{
    "Patient": {
        "type": "object",
        "primaryKey": "id",
        "properties": {
            "id": { "type": "integer" },
            "age": { "type": "integer", "minimum": 0 },
            "gender": { "type": "string" },
            "screened": { "type": "boolean", "default": false }
        },
        "required": ["age"]
    }
}"#;

pub const RULES: &str = r#"{
    "rule_sets": {
        "validation": {
            "age_present": { "condition": "context.age != null" },
            "adult": { "condition": "age >= 18" }
        },
        "business": {
            "needs_screening": {
                "condition": "age > 50",
                "action": "threshold < age",
                "params": { "threshold": 50 }
            }
        }
    }
}"#;

pub const WORKFLOWS: &str = r#"{
    "intake": {
        "id": "intake",
        "label": "Patient intake",
        "initialStep": "demographics",
        "steps": {
            "demographics": { "screenId": "demographics", "nextSteps": ["health_info"] },
            "health_info": {
                "screenId": "health",
                "nextSteps": ["senior_screening", "complete"],
                "conditions": { "senior_screening": "age > 50", "complete": "age <= 50" }
            },
            "senior_screening": { "screenId": "screening", "nextSteps": ["complete"] },
            "complete": { "screenId": "done", "nextSteps": [] }
        }
    }
}"#;

pub fn ctx(value: serde_json::Value) -> Context {
    Value::from(value).into_map().unwrap()
}
