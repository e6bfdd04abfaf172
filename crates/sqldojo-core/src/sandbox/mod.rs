//! Bounded, isolated, always-rolled-back execution of untrusted SQL.
//!
//! One submission = one pooled connection = one transaction. The exercise's
//! namespace (a per-exercise database file) is attached under
//! `exercise_<id>` before the transaction begins and detached after it is
//! rolled back; with an empty main database, unqualified table names
//! resolve into that namespace and nothing else is visible. Rollback is
//! unconditional, including on success.

pub mod guard;
pub mod pool;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rusqlite::{Batch, Connection, Statement};

use crate::config::EngineConfig;
use crate::errors::{ExecErrorKind, ExecutionError};
use crate::model::{Exercise, ResultSet};
use crate::value::SqlValue;
use pool::{CancelToken, PooledConn, SqlitePool};

/// Successful sandbox run: candidate output, reference output when the
/// exercise has one, and wall-clock time for the candidate batch only.
#[derive(Debug, Clone)]
pub struct Execution {
    pub candidate: ResultSet,
    pub reference: Option<ResultSet>,
    pub elapsed_ms: u64,
}

pub struct ExecutionSandbox {
    pool: SqlitePool,
    config: EngineConfig,
}

impl ExecutionSandbox {
    pub fn new(config: EngineConfig) -> Self {
        let pool = SqlitePool::new(
            config.pool_size,
            Duration::from_millis(config.acquire_timeout_ms),
        );
        ExecutionSandbox { pool, config }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Runs a candidate submission against an exercise namespace.
    ///
    /// Candidate and reference execute in the same transaction, candidate
    /// first, so both observe identical table state even if the candidate
    /// mutated it. The connection is released (or discarded) on every path.
    pub async fn execute(
        &self,
        exercise: &Exercise,
        candidate_sql: &str,
        cancel: &CancelToken,
    ) -> Result<Execution, ExecutionError> {
        let ns = EngineConfig::namespace_name(&exercise.id);
        let ns_path = self.config.namespace_path(&exercise.id);
        if !ns_path.exists() {
            return Err(ExecutionError::infrastructure(format!(
                "exercise '{}' has no provisioned namespace",
                exercise.id
            )));
        }
        let shared = self
            .config
            .shared_namespace
            .as_ref()
            .filter(|p| p.exists())
            .cloned();

        let conn = self.pool.acquire().await?;
        let job = SubmissionJob {
            namespace: ns,
            namespace_path: ns_path,
            shared_namespace: shared,
            candidate: candidate_sql.to_string(),
            reference: exercise.reference_query.clone(),
            statement_timeout: Duration::from_millis(self.config.statement_timeout_ms),
            statement_timeout_ms: self.config.statement_timeout_ms,
            cancel: cancel.clone(),
        };

        tokio::task::spawn_blocking(move || job.run(conn))
            .await
            .map_err(|e| ExecutionError::infrastructure(format!("sandbox task failed: {}", e)))?
    }
}

struct SubmissionJob {
    namespace: String,
    namespace_path: PathBuf,
    shared_namespace: Option<PathBuf>,
    candidate: String,
    reference: Option<String>,
    statement_timeout: Duration,
    statement_timeout_ms: u64,
    cancel: CancelToken,
}

impl SubmissionJob {
    fn run(&self, mut conn: PooledConn) -> Result<Execution, ExecutionError> {
        guard::check(&self.candidate)?;

        if let Err(e) = attach(&conn, &self.namespace, &self.namespace_path) {
            tracing::error!(namespace = %self.namespace, error = %e, "attach failed");
            conn.discard();
            return Err(ExecutionError::infrastructure(
                "failed to attach exercise namespace",
            ));
        }
        let mut attached = vec![self.namespace.clone()];
        if let Some(shared) = &self.shared_namespace {
            match attach(&conn, "shared", shared) {
                Ok(()) => attached.push("shared".to_string()),
                Err(e) => {
                    tracing::warn!(error = %e, "shared namespace unavailable; continuing without it");
                }
            }
        }

        let result = self.run_in_transaction(&mut conn);

        let mut dirty = false;
        for name in &attached {
            if let Err(e) = conn.execute_batch(&format!("DETACH DATABASE \"{}\"", name)) {
                tracing::warn!(namespace = %name, error = %e, "detach failed; discarding connection");
                dirty = true;
            }
        }
        if dirty {
            conn.discard();
        }

        result
    }

    fn run_in_transaction(&self, conn: &mut Connection) -> Result<Execution, ExecutionError> {
        let tx = conn
            .transaction()
            .map_err(|e| ExecutionError::infrastructure(format!("failed to begin: {}", e)))?;

        let run = (|| -> Result<Execution, ExecutionError> {
            let started = Instant::now();
            let candidate = {
                let _deadline = Watchdog::arm(&tx, self.statement_timeout, self.cancel.clone());
                run_batch(&tx, &self.candidate)
                    .map_err(|e| self.classify(e, &_deadline))?
            };
            let elapsed_ms = started.elapsed().as_millis() as u64;

            // Reference runs after the candidate, same transaction, same
            // snapshot, under its own fresh deadline. A failing or slow
            // reference is an authoring bug, not the learner's.
            let reference = match &self.reference {
                Some(q) => {
                    let _deadline = Watchdog::arm(&tx, self.statement_timeout, self.cancel.clone());
                    match run_batch(&tx, q) {
                        Ok(rs) => Some(rs),
                        Err(e) => {
                            let classified = self.classify(e, &_deadline);
                            if classified.kind == ExecErrorKind::Cancelled {
                                return Err(classified);
                            }
                            tracing::error!(error = %classified, "reference query failed");
                            return Err(ExecutionError::infrastructure(
                                "reference query failed",
                            ));
                        }
                    }
                }
                None => None,
            };

            Ok(Execution {
                candidate,
                reference,
                elapsed_ms,
            })
        })();

        // Core safety invariant: roll back even on success. A rollback
        // failure is logged, never escalated over the primary outcome.
        if let Err(e) = tx.rollback() {
            tracing::warn!(error = %e, "rollback failed");
        }

        run
    }

    fn classify(&self, e: rusqlite::Error, watchdog: &Watchdog) -> ExecutionError {
        if let rusqlite::Error::SqliteFailure(err, _) = &e {
            if err.code == rusqlite::ErrorCode::OperationInterrupted {
                if self.cancel.is_cancelled() {
                    return ExecutionError::cancelled();
                }
                if watchdog.timed_out() {
                    return ExecutionError::timeout(self.statement_timeout_ms);
                }
            }
            // Lock contention between concurrent submissions is the
            // service's problem, never the learner's; the orchestrator
            // retries transient failures once.
            if err.code == rusqlite::ErrorCode::DatabaseBusy
                || err.code == rusqlite::ErrorCode::DatabaseLocked
            {
                return ExecutionError::infrastructure(format!("engine contention: {}", e));
            }
        }
        ExecutionError::runtime(e.to_string())
    }
}

fn attach(conn: &Connection, name: &str, path: &Path) -> rusqlite::Result<()> {
    let path = path.to_string_lossy().replace('\'', "''");
    conn.execute_batch(&format!("ATTACH DATABASE '{}' AS \"{}\"", path, name))
}

/// Executes a statement batch verbatim, returning the rows of the last
/// row-producing statement (empty result set if none).
fn run_batch(conn: &Connection, sql: &str) -> rusqlite::Result<ResultSet> {
    let mut out = ResultSet::default();
    let mut batch = Batch::new(conn, sql);
    while let Some(mut stmt) = batch.next()? {
        if stmt.column_count() == 0 {
            stmt.execute([])?;
            continue;
        }
        out = collect_rows(&mut stmt)?;
    }
    Ok(out)
}

fn collect_rows(stmt: &mut Statement<'_>) -> rusqlite::Result<ResultSet> {
    let n = stmt.column_count();
    let (columns, decl_types): (Vec<String>, Vec<Option<String>>) = stmt
        .columns()
        .iter()
        .map(|c| (c.name().to_string(), c.decl_type().map(|d| d.to_string())))
        .unzip();

    let mut out = Vec::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut vals = Vec::with_capacity(n);
        for (i, decl) in decl_types.iter().enumerate() {
            vals.push(SqlValue::from_sqlite(row.get_ref(i)?, decl.as_deref()));
        }
        out.push(vals);
    }

    Ok(ResultSet {
        columns,
        rows: out,
    })
}

/// Per-statement execution bound. A detached thread holds the connection's
/// interrupt handle and fires it when the deadline passes or the caller
/// cancels; disarming happens on drop, after the guarded statement returns.
struct Watchdog {
    done: Arc<AtomicBool>,
    timed_out: Arc<AtomicBool>,
}

impl Watchdog {
    fn arm(conn: &Connection, budget: Duration, cancel: CancelToken) -> Watchdog {
        let done = Arc::new(AtomicBool::new(false));
        let timed_out = Arc::new(AtomicBool::new(false));
        let handle = conn.get_interrupt_handle();
        let deadline = Instant::now() + budget;
        let d = Arc::clone(&done);
        let t = Arc::clone(&timed_out);
        std::thread::spawn(move || {
            while !d.load(Ordering::Relaxed) {
                if cancel.is_cancelled() {
                    handle.interrupt();
                    return;
                }
                if Instant::now() >= deadline {
                    t.store(true, Ordering::Relaxed);
                    handle.interrupt();
                    return;
                }
                std::thread::sleep(Duration::from_millis(2));
            }
        });
        Watchdog { done, timed_out }
    }

    fn timed_out(&self) -> bool {
        self.timed_out.load(Ordering::Relaxed)
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.done.store(true, Ordering::Relaxed);
    }
}
