//! Verdict orchestration: one sandbox run, one verification, one verdict.

use crate::errors::ExecErrorKind;
use crate::model::{Verdict, VerdictStatus};
use crate::sandbox::pool::CancelToken;
use crate::sandbox::{Execution, ExecutionSandbox};
use crate::storage::Store;
use crate::verify;

pub struct SubmissionRunner {
    pub store: Store,
    pub sandbox: ExecutionSandbox,
}

impl SubmissionRunner {
    pub fn new(store: Store, sandbox: ExecutionSandbox) -> Self {
        SubmissionRunner { store, sandbox }
    }

    /// Grades one submission.
    ///
    /// `Ok(Verdict)` carries the learner-facing outcome. `Err` means the
    /// service itself failed (pool exhausted twice, infrastructure fault,
    /// caller cancelled) and no verdict exists; the message is generic, the
    /// detail lives in the logs.
    pub async fn submit(
        &self,
        learner_id: Option<&str>,
        exercise_id: &str,
        candidate_sql: &str,
        cancel: &CancelToken,
    ) -> anyhow::Result<Verdict> {
        let exercise = self
            .store
            .get_exercise_with_reference(exercise_id)?
            .ok_or_else(|| anyhow::anyhow!("unknown exercise: {}", exercise_id))?;

        let mut outcome = self.sandbox.execute(&exercise, candidate_sql, cancel).await;
        if let Err(e) = &outcome {
            if e.is_transient() {
                tracing::warn!(exercise = %exercise_id, error = %e, "transient sandbox failure; retrying once");
                outcome = self.sandbox.execute(&exercise, candidate_sql, cancel).await;
            }
        }

        let verdict = match outcome {
            Ok(exec) => self.judge(exec),
            Err(e) => match e.kind {
                ExecErrorKind::Runtime => Verdict::runtime_error(e.message),
                ExecErrorKind::Timeout => Verdict::timeout(e.message),
                ExecErrorKind::Cancelled => {
                    tracing::info!(exercise = %exercise_id, "submission cancelled");
                    anyhow::bail!("submission cancelled");
                }
                ExecErrorKind::PoolExhausted | ExecErrorKind::Infrastructure => {
                    tracing::error!(exercise = %exercise_id, error = %e, "sandbox infrastructure failure");
                    anyhow::bail!("service temporarily unavailable");
                }
            },
        };

        // Attempt logging is decoupled from verdict delivery: a storage
        // failure must not surface as a grading failure.
        if let Some(learner) = learner_id {
            if let Err(e) =
                self.store
                    .insert_attempt(learner, exercise_id, candidate_sql, &verdict)
            {
                tracing::warn!(exercise = %exercise_id, error = %e, "failed to record attempt");
            }
        }

        Ok(verdict)
    }

    fn judge(&self, exec: Execution) -> Verdict {
        match exec.reference {
            Some(reference) => {
                if verify::equivalent(&exec.candidate, &reference) {
                    Verdict::accepted(exec.candidate, Some(reference), exec.elapsed_ms)
                } else {
                    Verdict::wrong_answer(exec.candidate, reference, exec.elapsed_ms)
                }
            }
            // Ungraded playground: there is nothing to check against, so a
            // clean run always passes.
            None => Verdict {
                status: VerdictStatus::Accepted,
                candidate: Some(exec.candidate),
                reference: None,
                elapsed_ms: Some(exec.elapsed_ms),
                error: None,
            },
        }
    }
}
