use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::model::{Exercise, ExercisePack};

pub const SUPPORTED_PACK_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding the content database and one namespace file per
    /// exercise.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Hard upper bound on concurrently open sandbox connections.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// How long a submission waits for a pooled connection before failing
    /// with PoolExhausted.
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
    /// Per-statement execution bound for candidate queries.
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,
    /// Optional namespace of reference tables visible to every exercise.
    /// Writes to it are rolled back like everything else.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_namespace: Option<PathBuf>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".sqldojo")
}

fn default_pool_size() -> usize {
    4
}

fn default_acquire_timeout_ms() -> u64 {
    500
}

fn default_statement_timeout_ms() -> u64 {
    2000
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            data_dir: default_data_dir(),
            pool_size: default_pool_size(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            statement_timeout_ms: default_statement_timeout_ms(),
            shared_namespace: None,
        }
    }
}

impl EngineConfig {
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        EngineConfig {
            data_dir: data_dir.into(),
            ..EngineConfig::default()
        }
    }

    /// Deterministic namespace name for an exercise.
    pub fn namespace_name(exercise_id: &str) -> String {
        format!("exercise_{}", exercise_id)
    }

    pub fn namespace_path(&self, exercise_id: &str) -> PathBuf {
        self.data_dir
            .join(format!("exercise_{}.db", exercise_id))
    }

    pub fn content_db_path(&self) -> PathBuf {
        self.data_dir.join("content.db")
    }
}

pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;
    let cfg: EngineConfig = serde_yaml::from_str(&raw)
        .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;
    if cfg.pool_size == 0 {
        return Err(ConfigError("pool_size must be at least 1".into()));
    }
    if cfg.statement_timeout_ms == 0 {
        return Err(ConfigError("statement_timeout_ms must be nonzero".into()));
    }
    Ok(cfg)
}

pub fn load_pack(path: &Path) -> Result<ExercisePack, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read pack {}: {}", path.display(), e)))?;
    let pack: ExercisePack = serde_yaml::from_str(&raw)
        .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;
    if pack.version != SUPPORTED_PACK_VERSION {
        return Err(ConfigError(format!(
            "unsupported pack version {} (supported: {})",
            pack.version, SUPPORTED_PACK_VERSION
        )));
    }
    if pack.exercises.is_empty() {
        return Err(ConfigError("pack has no exercises".into()));
    }
    for ex in &pack.exercises {
        Exercise::validate_id(&ex.id)?;
        if ex.schema_ddl.trim().is_empty() {
            return Err(ConfigError(format!(
                "exercise '{}' has an empty schema_ddl",
                ex.id
            )));
        }
    }
    Ok(pack)
}
