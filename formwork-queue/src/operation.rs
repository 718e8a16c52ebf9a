use crate::error::{QueueError, QueueResult};
use formwork_storage::{QueryOptions, StorageEngine, StorageResult};
use formwork_types::{Record, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The storage primitive an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    Save,
    FindById,
    FindAll,
    Update,
    Delete,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Save => "save",
            OperationKind::FindById => "findById",
            OperationKind::FindAll => "findAll",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "save" => Ok(OperationKind::Save),
            "findById" | "find_by_id" => Ok(OperationKind::FindById),
            "findAll" | "find_all" => Ok(OperationKind::FindAll),
            "update" => Ok(OperationKind::Update),
            "delete" => Ok(OperationKind::Delete),
            other => Err(QueueError::InvalidRequest(format!(
                "unknown operation kind '{other}'"
            ))),
        }
    }
}

/// A storage operation with typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationRequest {
    Save { entity: String, record: Record },
    FindById { entity: String, id: Value },
    FindAll { entity: String, options: QueryOptions },
    Update { entity: String, id: Value, partial: Record },
    Delete { entity: String, id: Value },
}

impl OperationRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationRequest::Save { .. } => OperationKind::Save,
            OperationRequest::FindById { .. } => OperationKind::FindById,
            OperationRequest::FindAll { .. } => OperationKind::FindAll,
            OperationRequest::Update { .. } => OperationKind::Update,
            OperationRequest::Delete { .. } => OperationKind::Delete,
        }
    }

    pub fn entity(&self) -> &str {
        match self {
            OperationRequest::Save { entity, .. }
            | OperationRequest::FindById { entity, .. }
            | OperationRequest::FindAll { entity, .. }
            | OperationRequest::Update { entity, .. }
            | OperationRequest::Delete { entity, .. } => entity,
        }
    }

    /// Builds a request from a kind and a loosely-typed argument map:
    ///
    /// | kind | arguments |
    /// |------|-----------|
    /// | save | `entity`, `record` |
    /// | findById / delete | `entity`, `id` |
    /// | findAll | `entity`, optional `options` |
    /// | update | `entity`, `id`, optional `partial` |
    pub fn from_parts(kind: OperationKind, args: &Value) -> QueueResult<Self> {
        let entity = args
            .get("entity")
            .and_then(Value::as_str)
            .ok_or_else(|| QueueError::InvalidRequest("missing string argument 'entity'".into()))?
            .to_string();

        let id = || {
            args.get("id")
                .filter(|v| !v.is_null())
                .cloned()
                .ok_or_else(|| QueueError::InvalidRequest(format!("{kind} requires an 'id'")))
        };
        let map_arg = |name: &str, required: bool| -> QueueResult<Record> {
            match args.get(name) {
                Some(Value::Map(map)) => Ok(map.clone()),
                None | Some(Value::Null) if required => Err(QueueError::InvalidRequest(
                    format!("{kind} requires a '{name}' map"),
                )),
                None | Some(Value::Null) => Ok(Record::new()),
                Some(other) => Err(QueueError::InvalidRequest(format!(
                    "'{name}' must be a map, got {}",
                    other.kind()
                ))),
            }
        };

        Ok(match kind {
            OperationKind::Save => OperationRequest::Save {
                entity,
                record: map_arg("record", true)?,
            },
            OperationKind::FindById => OperationRequest::FindById { entity, id: id()? },
            OperationKind::FindAll => OperationRequest::FindAll {
                entity,
                options: QueryOptions::from_value(args.get("options").unwrap_or(&Value::Null))
                    .map_err(|e| QueueError::InvalidRequest(e.to_string()))?,
            },
            OperationKind::Update => OperationRequest::Update {
                entity,
                id: id()?,
                partial: map_arg("partial", false)?,
            },
            OperationKind::Delete => OperationRequest::Delete { entity, id: id()? },
        })
    }

    /// Runs the request against the storage engine.
    ///
    /// Records come back as maps, `findAll` as a list, a missing `findById`
    /// row as null, and `delete` as a boolean.
    pub(crate) fn execute(self, storage: &StorageEngine) -> StorageResult<Value> {
        match self {
            OperationRequest::Save { entity, record } => {
                storage.save(&entity, record).map(Value::Map)
            }
            OperationRequest::FindById { entity, id } => storage
                .find_by_id(&entity, &id)
                .map(|row| row.map(Value::Map).unwrap_or(Value::Null)),
            OperationRequest::FindAll { entity, options } => storage
                .find_all(&entity, &options)
                .map(|rows| Value::List(rows.into_iter().map(Value::Map).collect())),
            OperationRequest::Update {
                entity,
                id,
                partial,
            } => storage.update(&entity, &id, partial).map(Value::Map),
            OperationRequest::Delete { entity, id } => {
                storage.delete(&entity, &id).map(Value::Bool)
            }
        }
    }
}

/// Lifecycle of a submitted operation. Moves from `Pending` to one of the
/// settled states exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationStatus {
    Pending,
    Completed(Value),
    Failed(String),
}

impl OperationStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, OperationStatus::Pending)
    }

    /// The result value, when completed.
    pub fn result(&self) -> Option<&Value> {
        match self {
            OperationStatus::Completed(value) => Some(value),
            _ => None,
        }
    }

    /// The error message, when failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            OperationStatus::Failed(message) => Some(message),
            _ => None,
        }
    }
}
