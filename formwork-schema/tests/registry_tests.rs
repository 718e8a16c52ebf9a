use formwork_schema::{EntitySchema, FieldType, SchemaError, SchemaField, SchemaRegistry};
use formwork_types::Value;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const PATIENT: &str = r#"{
    "Patient": {
        "type": "object",
        "primaryKey": "id",
        "properties": {
            "id": { "type": "integer" },
            "name": { "type": "text", "maxLength": 80, "pattern": "^[A-Za-z ]+$" },
            "age": { "type": "int", "minimum": 0, "maximum": 130 },
            "weight": { "type": "double" },
            "smoker": { "type": "bool", "default": false },
            "gender": { "type": "string", "default": "Unknown" },
            "born": { "type": "string", "format": "date-time" },
            "visited": { "type": "date" }
        },
        "required": ["name", "age"]
    }
}"#;

// ── Loading & normalization ──────────────────────────────────────

#[test]
fn loads_and_normalizes_aliases() {
    let registry = SchemaRegistry::load(PATIENT).unwrap();
    let patient = registry.get("Patient").unwrap();

    let types: Vec<(&str, FieldType)> = patient
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.field_type))
        .collect();
    assert_eq!(
        types,
        vec![
            ("id", FieldType::Integer),
            ("name", FieldType::String),
            ("age", FieldType::Integer),
            ("weight", FieldType::Number),
            ("smoker", FieldType::Boolean),
            ("gender", FieldType::String),
            ("born", FieldType::DateTime),
            ("visited", FieldType::DateTime),
        ]
    );
    assert_eq!(patient.primary_key.as_deref(), Some("id"));
    assert_eq!(patient.table_name(), "patient");
}

#[test]
fn required_list_sets_flags() {
    let registry = SchemaRegistry::load(PATIENT).unwrap();
    let patient = registry.get("Patient").unwrap();
    assert!(patient.field("name").unwrap().required);
    assert!(patient.field("age").unwrap().required);
    assert!(!patient.field("weight").unwrap().required);
}

#[test]
fn defaults_and_constraints_are_carried() {
    let registry = SchemaRegistry::load(PATIENT).unwrap();
    let patient = registry.get("Patient").unwrap();

    assert_eq!(patient.field("smoker").unwrap().default, Some(Value::Bool(false)));
    assert_eq!(
        patient.field("gender").unwrap().default,
        Some(Value::String("Unknown".into()))
    );

    let name = patient.field("name").unwrap();
    assert_eq!(name.constraints.get("maxLength"), Some(&Value::Number(80.0)));
    assert_eq!(
        name.constraints.get("pattern"),
        Some(&Value::String("^[A-Za-z ]+$".into()))
    );
    assert!(!name.constraints.contains_key("type"));

    let age = patient.field("age").unwrap();
    assert_eq!(age.constraints.get("minimum"), Some(&Value::Number(0.0)));
    assert_eq!(age.constraints.get("maximum"), Some(&Value::Number(130.0)));
}

#[test]
fn lookup_is_case_insensitive() {
    let registry = SchemaRegistry::load(PATIENT).unwrap();
    assert!(registry.get("patient").is_ok());
    assert!(registry.get("PATIENT").is_ok());
    assert!(registry.contains("pAtIeNt"));
}

#[test]
fn unknown_entity_is_schema_not_found() {
    let registry = SchemaRegistry::load(PATIENT).unwrap();
    assert!(matches!(
        registry.get("Doctor"),
        Err(SchemaError::SchemaNotFound(name)) if name == "Doctor"
    ));
}

#[test]
fn preserves_entity_declaration_order() {
    let raw = r#"{
        "Zeta": { "type": "object", "properties": { "a": { "type": "string" } } },
        "Alpha": { "type": "object", "properties": { "b": { "type": "string" } } }
    }"#;
    let registry = SchemaRegistry::load(raw).unwrap();
    assert_eq!(registry.names(), vec!["Zeta".to_string(), "Alpha".to_string()]);
}

// ── Load-time rejection ──────────────────────────────────────────

#[test]
fn rejects_dangling_primary_key() {
    let raw = r#"{
        "Ok": { "type": "object", "properties": { "id": { "type": "integer" } }, "primaryKey": "id" },
        "Bad": { "type": "object", "properties": { "name": { "type": "string" } }, "primaryKey": "id" }
    }"#;
    let err = SchemaRegistry::load(raw).unwrap_err();
    assert!(matches!(
        err,
        SchemaError::InvalidPrimaryKey { ref entity, ref field } if entity == "Bad" && field == "id"
    ));
}

#[test]
fn rejects_unsupported_type() {
    let raw = r#"{ "T": { "type": "object", "properties": { "blob": { "type": "binary" } } } }"#;
    assert!(matches!(
        SchemaRegistry::load(raw),
        Err(SchemaError::UnsupportedFieldType { field_type, .. }) if field_type == "binary"
    ));
}

#[test]
fn rejects_unknown_required_field() {
    let raw = r#"{ "T": { "type": "object", "properties": {}, "required": ["ghost"] } }"#;
    assert!(matches!(
        SchemaRegistry::load(raw),
        Err(SchemaError::UnknownRequiredField { field, .. }) if field == "ghost"
    ));
}

#[test]
fn rejects_non_object_entity() {
    let raw = r#"{ "T": { "type": "array", "properties": {} } }"#;
    assert!(matches!(
        SchemaRegistry::load(raw),
        Err(SchemaError::InvalidDeclaration(_))
    ));
}

#[test]
fn rejects_case_colliding_names() {
    let raw = r#"{
        "Visit": { "type": "object", "properties": {} },
        "VISIT": { "type": "object", "properties": {} }
    }"#;
    assert!(matches!(
        SchemaRegistry::load(raw),
        Err(SchemaError::DuplicateEntity(_))
    ));
}

#[test]
fn rejects_malformed_json() {
    assert!(matches!(
        SchemaRegistry::load("{not json"),
        Err(SchemaError::InvalidDeclaration(_))
    ));
}

#[test]
fn from_schemas_validates_primary_key() {
    let schema = EntitySchema {
        name: "Note".into(),
        fields: vec![SchemaField::new("title", FieldType::String).required()],
        primary_key: Some("id".into()),
    };
    assert!(SchemaRegistry::from_schemas([schema]).is_err());
}

// ── Alias normalization ──────────────────────────────────────────

#[test]
fn string_with_plain_format_stays_string() {
    assert_eq!(
        FieldType::normalize("string", Some("email")),
        Some(FieldType::String)
    );
    assert_eq!(
        FieldType::normalize("string", Some("date")),
        Some(FieldType::DateTime)
    );
}

proptest! {
    #[test]
    fn alias_normalization_ignores_case(idx in 0usize..13, upper in any::<bool>()) {
        let table = [
            ("text", FieldType::String),
            ("string", FieldType::String),
            ("int", FieldType::Integer),
            ("integer", FieldType::Integer),
            ("decimal", FieldType::Number),
            ("float", FieldType::Number),
            ("double", FieldType::Number),
            ("number", FieldType::Number),
            ("bool", FieldType::Boolean),
            ("boolean", FieldType::Boolean),
            ("date", FieldType::DateTime),
            ("datetime", FieldType::DateTime),
            ("date-time", FieldType::DateTime),
        ];
        let (alias, expected) = table[idx];
        let declared = if upper { alias.to_uppercase() } else { alias.to_string() };
        prop_assert_eq!(FieldType::normalize(&declared, None), Some(expected));
    }
}
