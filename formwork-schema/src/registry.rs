//! Loading declaration documents into a [`SchemaRegistry`].

use crate::error::{SchemaError, SchemaResult};
use crate::schema::{EntitySchema, FieldType, SchemaField};
use formwork_types::Value;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Keys of a property declaration that shape the field itself. Everything
/// else on a property lands in the constraint bag.
const STRUCTURAL_KEYS: &[&str] = &["type", "format", "default", "required"];

#[derive(Debug, Deserialize)]
struct EntityDeclaration {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    properties: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    required: Vec<String>,
    #[serde(rename = "primaryKey", alias = "primary_key", default)]
    primary_key: Option<String>,
}

/// The loaded set of entity schemas, keyed case-insensitively by name.
///
/// Immutable once built; a reload produces a new registry.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<EntitySchema>>,
    order: Vec<String>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON declaration document (entity name → object schema).
    pub fn load(raw: &str) -> SchemaResult<Self> {
        let doc: serde_json::Value = serde_json::from_str(raw)?;
        Self::load_value(doc)
    }

    /// Builds a registry from an already-parsed declaration document.
    pub fn load_value(doc: serde_json::Value) -> SchemaResult<Self> {
        let serde_json::Value::Object(entities) = doc else {
            return Err(SchemaError::InvalidDeclaration(
                "schema document must be an object keyed by entity name".into(),
            ));
        };

        let mut schemas = Vec::with_capacity(entities.len());
        for (name, decl) in entities {
            let decl: EntityDeclaration = serde_json::from_value(decl).map_err(|e| {
                SchemaError::InvalidDeclaration(format!("entity '{name}': {e}"))
            })?;
            schemas.push(parse_entity(name, decl)?);
        }
        let registry = Self::from_schemas(schemas)?;
        info!(entities = registry.len(), "Loaded entity schemas");
        Ok(registry)
    }

    /// Builds a registry from schemas constructed in code. Primary keys are
    /// validated the same way as for parsed declarations.
    pub fn from_schemas(schemas: impl IntoIterator<Item = EntitySchema>) -> SchemaResult<Self> {
        let mut registry = Self::new();
        for schema in schemas {
            validate_primary_key(&schema)?;
            let key = schema.name.to_lowercase();
            if registry.schemas.contains_key(&key) {
                return Err(SchemaError::DuplicateEntity(schema.name));
            }
            registry.order.push(key.clone());
            registry.schemas.insert(key, Arc::new(schema));
        }
        Ok(registry)
    }

    /// Resolves an entity name (case-insensitive).
    pub fn get(&self, name: &str) -> SchemaResult<Arc<EntitySchema>> {
        self.schemas
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| SchemaError::SchemaNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(&name.to_lowercase())
    }

    /// Schemas in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<EntitySchema>> {
        self.order.iter().filter_map(|k| self.schemas.get(k))
    }

    /// Entity names in declaration order.
    pub fn names(&self) -> Vec<String> {
        self.iter().map(|s| s.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

fn parse_entity(name: String, decl: EntityDeclaration) -> SchemaResult<EntitySchema> {
    if let Some(kind) = decl.kind.as_deref() {
        if kind != "object" {
            return Err(SchemaError::InvalidDeclaration(format!(
                "entity '{name}' must have type 'object', got '{kind}'"
            )));
        }
    }

    let required: HashSet<&str> = decl.required.iter().map(String::as_str).collect();
    for field in &decl.required {
        if !decl.properties.contains_key(field) {
            return Err(SchemaError::UnknownRequiredField {
                entity: name,
                field: field.clone(),
            });
        }
    }

    let mut fields = Vec::with_capacity(decl.properties.len());
    for (field_name, prop) in &decl.properties {
        let required = required.contains(field_name.as_str());
        fields.push(parse_field(&name, field_name, prop, required)?);
    }

    debug!(entity = %name, fields = fields.len(), "Parsed entity declaration");
    Ok(EntitySchema {
        name,
        fields,
        primary_key: decl.primary_key,
    })
}

fn parse_field(
    entity: &str,
    field_name: &str,
    prop: &serde_json::Value,
    listed_required: bool,
) -> SchemaResult<SchemaField> {
    let serde_json::Value::Object(prop) = prop else {
        return Err(SchemaError::InvalidDeclaration(format!(
            "entity '{entity}' field '{field_name}' must be an object"
        )));
    };

    let declared = prop.get("type").and_then(|t| t.as_str()).ok_or_else(|| {
        SchemaError::InvalidDeclaration(format!(
            "entity '{entity}' field '{field_name}' is missing a string 'type'"
        ))
    })?;
    let format = prop.get("format").and_then(|f| f.as_str());
    let field_type =
        FieldType::normalize(declared, format).ok_or_else(|| SchemaError::UnsupportedFieldType {
            entity: entity.to_string(),
            field: field_name.to_string(),
            field_type: declared.to_string(),
        })?;

    let inline_required = prop.get("required").and_then(|r| r.as_bool()).unwrap_or(false);
    let default = prop.get("default").cloned().map(Value::from);
    let constraints: BTreeMap<String, Value> = prop
        .iter()
        .filter(|(k, _)| !STRUCTURAL_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), Value::from(v.clone())))
        .collect();

    Ok(SchemaField {
        name: field_name.to_string(),
        field_type,
        required: listed_required || inline_required,
        default,
        constraints,
    })
}

fn validate_primary_key(schema: &EntitySchema) -> SchemaResult<()> {
    match schema.primary_key.as_deref() {
        Some(pk) if !schema.has_field(pk) => Err(SchemaError::InvalidPrimaryKey {
            entity: schema.name.clone(),
            field: pk.to_string(),
        }),
        _ => Ok(()),
    }
}
