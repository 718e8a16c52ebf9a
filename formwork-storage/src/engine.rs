//! Generic CRUD over schema-shaped tables.

use crate::convert::{from_sql, to_sql};
use crate::ddl::{create_table_sql, quote_ident};
use crate::error::{StorageError, StorageResult};
use crate::query::{build_select, column_list, QueryOptions};
use formwork_schema::{EntitySchema, FieldType, SchemaField, SchemaRegistry};
use formwork_types::{Record, Value};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Column used to address rows of entities that declare no primary key.
const ROWID: &str = "rowid";

/// Schema-driven storage engine backed by a single SQLite connection.
pub struct StorageEngine {
    conn: Arc<Mutex<Connection>>,
    registry: RwLock<Arc<SchemaRegistry>>,
}

impl StorageEngine {
    /// Opens (or creates) a database file.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "Opened storage database");
        Ok(Self::from_connection(conn))
    }

    /// Opens an in-memory database.
    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            registry: RwLock::new(Arc::new(SchemaRegistry::new())),
        }
    }

    /// Installs the schema registry entity names are resolved against.
    /// The previous registry is replaced wholesale.
    pub fn set_registry(&self, registry: Arc<SchemaRegistry>) {
        match self.registry.write() {
            Ok(mut guard) => *guard = registry,
            Err(poisoned) => *poisoned.into_inner() = registry,
        }
    }

    /// Current registry snapshot.
    pub fn registry(&self) -> Arc<SchemaRegistry> {
        match self.registry.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn schema(&self, entity: &str) -> StorageResult<Arc<EntitySchema>> {
        self.registry()
            .get(entity)
            .map_err(|_| StorageError::SchemaNotFound(entity.to_string()))
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    // ── Tables ───────────────────────────────────────────────────

    /// Creates the backing table for `schema` if it does not exist yet.
    pub fn ensure_table(&self, schema: &EntitySchema) -> StorageResult<()> {
        let sql = create_table_sql(schema);
        self.conn()?.execute_batch(&sql)?;
        debug!(entity = %schema.name, "Ensured table");
        Ok(())
    }

    /// Runs [`ensure_table`](Self::ensure_table) for every registered schema.
    pub fn ensure_all(&self) -> StorageResult<()> {
        let registry = self.registry();
        for schema in registry.iter() {
            self.ensure_table(schema)?;
        }
        Ok(())
    }

    // ── CRUD ─────────────────────────────────────────────────────

    /// Inserts or updates a record.
    ///
    /// With a non-null primary key value in `record`, the other supplied
    /// fields are written to that row and the persisted row is read back.
    /// Otherwise the record is inserted and the generated key (if the
    /// entity declares one) is merged into the returned record.
    pub fn save(&self, entity: &str, record: Record) -> StorageResult<Record> {
        let schema = self.schema(entity)?;
        let mut bound = bind_record(&schema, &record)?;
        let conn = self.conn()?;

        if let Some(pk) = schema.primary_key.as_deref() {
            if let Some(id) = record.get(pk).filter(|v| !v.is_null()) {
                let key = key_param(&schema, id)?;
                bound.retain(|(field, _)| field.name != pk);
                update_row(&conn, &schema, pk, &bound, key.clone())?;
                debug!(entity = %schema.name, id = %id, "Updated record by key");
                return select_by_key(&conn, &schema, pk, key)?.ok_or_else(|| {
                    StorageError::RecordNotFound {
                        entity: schema.name.clone(),
                        id: id.to_string(),
                    }
                });
            }
        }

        let mut saved = record;
        if let Some(pk_field) = schema.primary_key_field() {
            bound.retain(|(field, _)| field.name != pk_field.name);
            if pk_field.field_type == FieldType::String {
                let generated = Uuid::now_v7().to_string();
                bound.push((pk_field, SqlValue::Text(generated.clone())));
                saved.insert(pk_field.name.clone(), Value::String(generated));
            }
        }

        insert_row(&conn, &schema, &bound)?;

        if let Some(pk_field) = schema.primary_key_field() {
            let rowid = conn.last_insert_rowid();
            let sql = format!(
                "SELECT {} FROM {} WHERE rowid = ?1",
                quote_ident(&pk_field.name),
                quote_ident(&schema.table_name())
            );
            let id = conn.query_row(&sql, [rowid], |row| {
                Ok(from_sql(pk_field.field_type, row.get_ref(0)?))
            })?;
            saved.insert(pk_field.name.clone(), id);
        }
        debug!(entity = %schema.name, "Inserted record");
        Ok(saved)
    }

    /// Looks up a row by primary key (or rowid for keyless entities).
    pub fn find_by_id(&self, entity: &str, id: &Value) -> StorageResult<Option<Record>> {
        let schema = self.schema(entity)?;
        let key = key_param(&schema, id)?;
        let conn = self.conn()?;
        select_by_key(&conn, &schema, key_column(&schema), key)
    }

    /// Returns the rows matching `options`.
    pub fn find_all(&self, entity: &str, options: &QueryOptions) -> StorageResult<Vec<Record>> {
        let schema = self.schema(entity)?;
        let (sql, params) = build_select(&schema, options)?;
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| read_record(&schema, row))?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        debug!(entity = %schema.name, rows = records.len(), "Queried records");
        Ok(records)
    }

    /// Writes `partial` to the row identified by `id` and returns the row
    /// as persisted.
    ///
    /// An empty `partial` writes nothing. When no row exists the result is
    /// a record holding only the key.
    pub fn update(&self, entity: &str, id: &Value, partial: Record) -> StorageResult<Record> {
        let schema = self.schema(entity)?;
        let key_name = key_column(&schema);
        let mut bound = bind_record(&schema, &partial)?;
        bound.retain(|(field, _)| field.name != key_name);
        let key = key_param(&schema, id)?;

        let conn = self.conn()?;
        update_row(&conn, &schema, key_name, &bound, key.clone())?;
        let row = select_by_key(&conn, &schema, key_name, key)?;
        Ok(row.unwrap_or_else(|| Record::from([(key_name.to_string(), id.clone())])))
    }

    /// Deletes the row identified by `id`.
    ///
    /// Returns true only when a row existed and is verifiably gone. Deleting
    /// an absent id returns false, as does an id that cannot be a key of
    /// this entity.
    pub fn delete(&self, entity: &str, id: &Value) -> StorageResult<bool> {
        let schema = self.schema(entity)?;
        let key_name = key_column(&schema);
        let key = match key_param(&schema, id) {
            Ok(key) => key,
            Err(StorageError::InvalidValue { reason, .. }) => {
                debug!(entity = %schema.name, id = %id, %reason, "Nothing to delete");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let conn = self.conn()?;
        let existed = select_by_key(&conn, &schema, key_name, key.clone())?.is_some();
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote_ident(&schema.table_name()),
            quote_ident(key_name)
        );
        conn.execute(&sql, [key.clone()])?;
        let gone = select_by_key(&conn, &schema, key_name, key)?.is_none();
        debug!(entity = %schema.name, id = %id, deleted = existed && gone, "Deleted record");
        Ok(existed && gone)
    }

    /// Number of rows stored for an entity.
    pub fn count(&self, entity: &str) -> StorageResult<usize> {
        let schema = self.schema(entity)?;
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(&schema.table_name()));
        let count: i64 = self.conn()?.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Name of the column rows are addressed by.
fn key_column(schema: &EntitySchema) -> &str {
    schema.primary_key.as_deref().unwrap_or(ROWID)
}

fn key_param(schema: &EntitySchema, id: &Value) -> StorageResult<SqlValue> {
    match schema.primary_key_field() {
        Some(field) => to_sql(&schema.name, field, id),
        None => id
            .as_i64()
            .map(SqlValue::Integer)
            .ok_or_else(|| StorageError::InvalidValue {
                entity: schema.name.clone(),
                field: ROWID.to_string(),
                reason: format!("{id} is not a row id"),
            }),
    }
}

/// Validates every key of `record` against the schema and converts the
/// values to column form.
fn bind_record<'a>(
    schema: &'a EntitySchema,
    record: &Record,
) -> StorageResult<Vec<(&'a SchemaField, SqlValue)>> {
    record
        .iter()
        .map(|(name, value)| {
            let field = schema.field(name).ok_or_else(|| StorageError::UnknownField {
                entity: schema.name.clone(),
                field: name.clone(),
            })?;
            Ok((field, to_sql(&schema.name, field, value)?))
        })
        .collect()
}

fn insert_row(
    conn: &Connection,
    schema: &EntitySchema,
    bound: &[(&SchemaField, SqlValue)],
) -> StorageResult<()> {
    let table = quote_ident(&schema.table_name());
    if bound.is_empty() {
        conn.execute(&format!("INSERT INTO {table} DEFAULT VALUES"), [])?;
        return Ok(());
    }
    let columns: Vec<String> = bound.iter().map(|(f, _)| quote_ident(&f.name)).collect();
    let placeholders = vec!["?"; bound.len()].join(", ");
    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders})",
        columns.join(", ")
    );
    conn.execute(&sql, params_from_iter(bound.iter().map(|(_, v)| v)))?;
    Ok(())
}

fn update_row(
    conn: &Connection,
    schema: &EntitySchema,
    key_name: &str,
    bound: &[(&SchemaField, SqlValue)],
    key: SqlValue,
) -> StorageResult<()> {
    if bound.is_empty() {
        return Ok(());
    }
    let assignments: Vec<String> = bound
        .iter()
        .map(|(f, _)| format!("{} = ?", quote_ident(&f.name)))
        .collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        quote_ident(&schema.table_name()),
        assignments.join(", "),
        quote_ident(key_name)
    );
    let params = bound.iter().map(|(_, v)| v.clone()).chain(std::iter::once(key));
    conn.execute(&sql, params_from_iter(params))?;
    Ok(())
}

fn select_by_key(
    conn: &Connection,
    schema: &EntitySchema,
    key_name: &str,
    key: SqlValue,
) -> StorageResult<Option<Record>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {} = ?1 LIMIT 1",
        column_list(schema),
        quote_ident(&schema.table_name()),
        quote_ident(key_name)
    );
    Ok(conn
        .query_row(&sql, [key], |row| read_record(schema, row))
        .optional()?)
}

fn read_record(schema: &EntitySchema, row: &Row<'_>) -> rusqlite::Result<Record> {
    let mut record = Record::new();
    for (idx, field) in schema.fields.iter().enumerate() {
        record.insert(field.name.clone(), from_sql(field.field_type, row.get_ref(idx)?));
    }
    Ok(record)
}
