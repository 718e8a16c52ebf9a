//! Filtered queries: options, their loosely-typed parsing, and SQL
//! rendering with bound parameters.

use crate::convert::to_sql;
use crate::ddl::quote_ident;
use crate::error::{StorageError, StorageResult};
use formwork_schema::{EntitySchema, FieldType, SchemaField};
use formwork_types::Value;
use rusqlite::types::Value as SqlValue;

/// Comparison operators accepted inside a `where` entry's operator map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Gt,
    Lt,
    Gte,
    Lte,
    Ne,
    Like,
}

impl Operator {
    /// Parses an operator key. Unrecognized keys yield `None` and are
    /// skipped by the query builder.
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "gt" => Some(Operator::Gt),
            "lt" => Some(Operator::Lt),
            "gte" => Some(Operator::Gte),
            "lte" => Some(Operator::Lte),
            "ne" => Some(Operator::Ne),
            "like" => Some(Operator::Like),
            _ => None,
        }
    }

    fn sql(&self) -> &'static str {
        match self {
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Ne => "<>",
            Operator::Like => "LIKE",
        }
    }
}

/// Predicate on one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals the literal (`IS NULL` for a null literal).
    Equals(Value),
    /// Every listed comparison must hold. An empty list contributes no
    /// predicate.
    Compare(Vec<(Operator, Value)>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Options for `find_all`. Multiple filters combine with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub filters: Vec<(String, Filter)>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<u64>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), Filter::Equals(value.into())));
        self
    }

    pub fn where_op(mut self, field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        self.filters
            .push((field.into(), Filter::Compare(vec![(op, value.into())])));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Parses the loosely-typed form used by action scripts:
    ///
    /// ```json
    /// { "where": { "age": { "gt": 18 }, "gender": "Female" },
    ///   "orderBy": { "field": "age", "direction": "desc" },
    ///   "limit": 10 }
    /// ```
    ///
    /// `orderBy` may also be a bare field name (ascending). A null value
    /// means no options.
    pub fn from_value(value: &Value) -> StorageResult<Self> {
        let map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Map(map) => map,
            other => {
                return Err(StorageError::InvalidQuery(format!(
                    "query options must be a map, got {}",
                    other.kind()
                )));
            }
        };

        let mut options = Self::default();

        match map.get("where") {
            None | Some(Value::Null) => {}
            Some(Value::Map(entries)) => {
                for (field, cond) in entries {
                    options.filters.push((field.clone(), parse_filter(cond)));
                }
            }
            Some(other) => {
                return Err(StorageError::InvalidQuery(format!(
                    "'where' must be a map, got {}",
                    other.kind()
                )));
            }
        }

        match map.get("orderBy").or_else(|| map.get("order_by")) {
            None | Some(Value::Null) => {}
            Some(Value::String(field)) => {
                options.order_by = Some(OrderBy {
                    field: field.clone(),
                    direction: Direction::Asc,
                });
            }
            Some(Value::Map(order)) => {
                let field = order.get("field").and_then(Value::as_str).ok_or_else(|| {
                    StorageError::InvalidQuery("'orderBy' map needs a string 'field'".into())
                })?;
                let direction = match order.get("direction").and_then(Value::as_str) {
                    None => Direction::Asc,
                    Some(d) if d.eq_ignore_ascii_case("asc") => Direction::Asc,
                    Some(d) if d.eq_ignore_ascii_case("desc") => Direction::Desc,
                    Some(d) => {
                        return Err(StorageError::InvalidQuery(format!(
                            "unknown sort direction '{d}'"
                        )));
                    }
                };
                options.order_by = Some(OrderBy {
                    field: field.to_string(),
                    direction,
                });
            }
            Some(other) => {
                return Err(StorageError::InvalidQuery(format!(
                    "'orderBy' must be a field name or map, got {}",
                    other.kind()
                )));
            }
        }

        match map.get("limit") {
            None | Some(Value::Null) => {}
            Some(v) => {
                let limit = v.as_i64().filter(|n| *n >= 0).ok_or_else(|| {
                    StorageError::InvalidQuery(format!("'limit' must be a non-negative integer, got {v}"))
                })?;
                options.limit = Some(limit as u64);
            }
        }

        Ok(options)
    }
}

/// A map value is an operator map (unrecognized keys dropped); anything
/// else is an equality literal.
fn parse_filter(cond: &Value) -> Filter {
    match cond {
        Value::Map(ops) => Filter::Compare(
            ops.iter()
                .filter_map(|(k, v)| Operator::parse(k).map(|op| (op, v.clone())))
                .collect(),
        ),
        literal => Filter::Equals(literal.clone()),
    }
}

/// Resolves a caller-supplied field name against the schema.
pub(crate) fn resolve_field<'a>(schema: &'a EntitySchema, name: &str) -> StorageResult<&'a SchemaField> {
    schema.field(name).ok_or_else(|| StorageError::UnknownField {
        entity: schema.name.clone(),
        field: name.to_string(),
    })
}

/// Comma-separated, quoted list of every declared column.
pub(crate) fn column_list(schema: &EntitySchema) -> String {
    schema
        .fields
        .iter()
        .map(|f| quote_ident(&f.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders the SELECT for `find_all` and the parameters to bind.
pub(crate) fn build_select(
    schema: &EntitySchema,
    options: &QueryOptions,
) -> StorageResult<(String, Vec<SqlValue>)> {
    let mut predicates = Vec::new();
    let mut params = Vec::new();

    for (name, filter) in &options.filters {
        let field = resolve_field(schema, name)?;
        let column = quote_ident(&field.name);
        match filter {
            Filter::Equals(Value::Null) => predicates.push(format!("{column} IS NULL")),
            Filter::Equals(value) => {
                predicates.push(format!("{column} = ?"));
                params.push(to_sql(&schema.name, field, value)?);
            }
            Filter::Compare(ops) => {
                for (op, value) in ops {
                    match (op, value) {
                        (Operator::Ne, Value::Null) => {
                            predicates.push(format!("{column} IS NOT NULL"));
                        }
                        (Operator::Like, _) => {
                            predicates.push(format!("{column} LIKE ?"));
                            params.push(like_pattern(field, value));
                        }
                        _ => {
                            predicates.push(format!("{column} {} ?", op.sql()));
                            params.push(to_sql(&schema.name, field, value)?);
                        }
                    }
                }
            }
        }
    }

    let mut sql = format!(
        "SELECT {} FROM {}",
        column_list(schema),
        quote_ident(&schema.table_name())
    );
    if !predicates.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" AND "));
    }
    if let Some(order) = &options.order_by {
        let field = resolve_field(schema, &order.field)?;
        let dir = match order.direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        sql.push_str(&format!(" ORDER BY {} {dir}", quote_ident(&field.name)));
    }
    if let Some(limit) = options.limit {
        sql.push_str(" LIMIT ?");
        params.push(SqlValue::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
    }

    Ok((sql, params))
}

/// LIKE patterns are matched as text regardless of the column type.
fn like_pattern(field: &SchemaField, value: &Value) -> SqlValue {
    match (field.field_type, value) {
        (_, Value::String(s)) => SqlValue::Text(s.clone()),
        (FieldType::Boolean, Value::Bool(b)) => SqlValue::Text(i64::from(*b).to_string()),
        (_, other) => SqlValue::Text(other.to_string()),
    }
}
