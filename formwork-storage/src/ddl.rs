//! Table definitions rendered from entity schemas.

use formwork_schema::{EntitySchema, FieldType, SchemaField};
use formwork_types::Value;

/// Quotes an identifier taken from schema metadata.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// SQLite column type for a canonical field type.
pub(crate) fn column_type(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::String => "TEXT",
        FieldType::Integer => "INTEGER",
        FieldType::Number => "REAL",
        FieldType::Boolean => "INTEGER",
        FieldType::DateTime => "INTEGER",
    }
}

/// Renders the `CREATE TABLE IF NOT EXISTS` statement for a schema.
///
/// The primary key column carries no `NOT NULL` so an `INTEGER PRIMARY KEY`
/// keeps aliasing the rowid and is generated on insert.
pub fn create_table_sql(schema: &EntitySchema) -> String {
    let columns: Vec<String> = schema
        .fields
        .iter()
        .map(|f| column_definition(f, schema.primary_key.as_deref() == Some(f.name.as_str())))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(&schema.table_name()),
        columns.join(", ")
    )
}

fn column_definition(field: &SchemaField, is_primary_key: bool) -> String {
    let mut def = format!("{} {}", quote_ident(&field.name), column_type(field.field_type));
    if is_primary_key {
        def.push_str(" PRIMARY KEY");
    } else if field.required {
        def.push_str(" NOT NULL");
    }
    if let Some(literal) = field.default.as_ref().and_then(default_literal) {
        def.push_str(" DEFAULT ");
        def.push_str(&literal);
    }
    def
}

/// Renders a default value as a SQL literal. Lists, maps and nulls have no
/// literal form and leave the column without a default.
fn default_literal(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(format!("'{}'", s.replace('\'', "''"))),
        Value::Number(n) => Some(match value.as_i64() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        }),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_defaults_by_kind() {
        assert_eq!(default_literal(&Value::String("O'Brien".into())).as_deref(), Some("'O''Brien'"));
        assert_eq!(default_literal(&Value::Number(3.0)).as_deref(), Some("3"));
        assert_eq!(default_literal(&Value::Number(2.5)).as_deref(), Some("2.5"));
        assert_eq!(default_literal(&Value::Bool(true)).as_deref(), Some("1"));
        assert_eq!(default_literal(&Value::Null), None);
        assert_eq!(default_literal(&Value::List(vec![])), None);
    }

    #[test]
    fn quotes_embedded_quotes() {
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
