//! TOML runtime configuration.
//!
//! ```toml
//! [database]
//! path = "records.db"
//!
//! [evaluator]
//! loop_iteration_limit = 100000
//!
//! [declarations]
//! schemas = "decl/schemas.json"
//! rules = "decl/rules.json"
//! workflows = "decl/workflows.json"
//!
//! [logging]
//! filter = "formwork=debug"
//! ```

use crate::error::{RuntimeError, RuntimeResult};
use formwork_eval::EvaluatorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub database: DatabaseConfig,
    pub evaluator: EvaluatorConfig,
    pub declarations: DeclarationPaths,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file. In-memory when absent.
    pub path: Option<PathBuf>,
}

/// Declaration documents loaded at startup. Each is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeclarationPaths {
    pub schemas: Option<PathBuf>,
    pub rules: Option<PathBuf>,
    pub workflows: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_toml(contents: &str) -> RuntimeResult<Self> {
        toml::from_str(contents).map_err(|e| RuntimeError::Config(e.to_string()))
    }

    /// Reads a config file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> RuntimeResult<Self> {
        if !path.exists() {
            info!("No runtime config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| RuntimeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&contents)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        info!("Loaded runtime config from {:?}", path);
        Ok(config)
    }

    /// Makes relative paths relative to `base` instead of the working
    /// directory.
    fn resolve_relative_to(&mut self, base: &Path) {
        let resolve = |p: &mut Option<PathBuf>| {
            if let Some(path) = p.as_mut().filter(|path| path.is_relative()) {
                *path = base.join(&*path);
            }
        };
        resolve(&mut self.database.path);
        resolve(&mut self.declarations.schemas);
        resolve(&mut self.declarations.rules);
        resolve(&mut self.declarations.workflows);
    }
}
