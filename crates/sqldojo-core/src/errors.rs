use thiserror::Error;

/// Classification of a failed sandbox execution.
///
/// Every database-engine error is converted into one of these before it
/// leaves the sandbox; raw `rusqlite::Error`s never cross that boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecErrorKind {
    /// Candidate SQL failed to execute (syntax error, missing table,
    /// constraint violation). Message is safe to show the learner verbatim.
    Runtime,
    /// Candidate exceeded the statement execution bound.
    Timeout,
    /// Caller abandoned the submission; the in-flight statement was
    /// interrupted and the transaction rolled back.
    Cancelled,
    /// No pooled connection became available within the acquire wait.
    PoolExhausted,
    /// Pool, attach, or task failure. Message must not be surfaced raw.
    Infrastructure,
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ExecutionError {
    pub kind: ExecErrorKind,
    pub message: String,
}

impl ExecutionError {
    pub fn runtime(message: impl Into<String>) -> Self {
        ExecutionError {
            kind: ExecErrorKind::Runtime,
            message: message.into(),
        }
    }

    pub fn timeout(bound_ms: u64) -> Self {
        ExecutionError {
            kind: ExecErrorKind::Timeout,
            message: format!("query exceeded the {} ms execution bound", bound_ms),
        }
    }

    pub fn cancelled() -> Self {
        ExecutionError {
            kind: ExecErrorKind::Cancelled,
            message: "submission cancelled by caller".to_string(),
        }
    }

    pub fn pool_exhausted() -> Self {
        ExecutionError {
            kind: ExecErrorKind::PoolExhausted,
            message: "no database connection became available".to_string(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        ExecutionError {
            kind: ExecErrorKind::Infrastructure,
            message: message.into(),
        }
    }

    /// True for failures the orchestrator may retry once.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            ExecErrorKind::PoolExhausted | ExecErrorKind::Infrastructure
        )
    }
}

/// Schema setup failed; the namespace is undefined until re-provisioned.
#[derive(Debug, Error)]
#[error("provisioning exercise '{exercise_id}' failed: {message}")]
pub struct ProvisionError {
    pub exercise_id: String,
    pub message: String,
}

impl ProvisionError {
    pub fn new(exercise_id: &str, message: impl Into<String>) -> Self {
        ProvisionError {
            exercise_id: exercise_id.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ConfigError(pub String);
