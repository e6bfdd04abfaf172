//! Out-of-band namespace provisioning.
//!
//! The only place durable writes to exercise namespaces happen. Not safe to
//! run concurrently with submissions against the same exercise; callers
//! serialize it externally (content deployment, not learner traffic).

use rusqlite::Connection;

use crate::config::EngineConfig;
use crate::errors::ProvisionError;
use crate::model::Exercise;

pub struct Provisioner {
    config: EngineConfig,
}

impl Provisioner {
    pub fn new(config: EngineConfig) -> Self {
        Provisioner { config }
    }

    /// Drops and rebuilds the exercise's namespace, then runs its schema
    /// DDL in one transaction. Idempotent on success; on failure the
    /// namespace is undefined and must be provisioned again before use.
    pub fn provision(&self, exercise: &Exercise) -> Result<(), ProvisionError> {
        Exercise::validate_id(&exercise.id)
            .map_err(|e| ProvisionError::new(&exercise.id, e.to_string()))?;

        std::fs::create_dir_all(&self.config.data_dir).map_err(|e| {
            ProvisionError::new(&exercise.id, format!("failed to create data dir: {}", e))
        })?;

        let path = self.config.namespace_path(&exercise.id);
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| {
                ProvisionError::new(&exercise.id, format!("failed to drop namespace: {}", e))
            })?;
        }

        let mut conn = Connection::open(&path)
            .map_err(|e| ProvisionError::new(&exercise.id, e.to_string()))?;
        let tx = conn
            .transaction()
            .map_err(|e| ProvisionError::new(&exercise.id, e.to_string()))?;
        tx.execute_batch(&exercise.schema_ddl)
            .map_err(|e| ProvisionError::new(&exercise.id, e.to_string()))?;
        tx.commit()
            .map_err(|e| ProvisionError::new(&exercise.id, e.to_string()))?;

        tracing::info!(exercise = %exercise.id, path = %path.display(), "provisioned namespace");
        Ok(())
    }
}
