use serde::{Deserialize, Serialize};

use crate::value::SqlValue;

pub const DEFAULT_STARTER_QUERY: &str = "-- Write your query here\nSELECT * FROM table_name;";

/// An authored SQL exercise. Immutable at runtime; read by the provisioner
/// (schema_ddl) and the sandbox (reference_query).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub prompt: String,
    /// Statements that create and seed this exercise's tables.
    pub schema_ddl: String,
    /// Hidden author solution. Never exposed to learners; only the
    /// privileged store accessor returns it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_query: Option<String>,
    #[serde(default = "default_starter_query")]
    pub starter_query: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,
}

fn default_starter_query() -> String {
    DEFAULT_STARTER_QUERY.to_string()
}

impl Exercise {
    /// Exercise ids double as namespace names, so the charset is restricted
    /// to what can be spliced into an identifier and a file name.
    pub fn validate_id(id: &str) -> Result<(), crate::errors::ConfigError> {
        let ok = !id.is_empty()
            && id.len() <= 64
            && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if ok {
            Ok(())
        } else {
            Err(crate::errors::ConfigError(format!(
                "invalid exercise id {:?}: expected [A-Za-z0-9_]{{1,64}}",
                id
            )))
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Easy,
        }
    }
}

/// A YAML content pack, the authoring input for `seed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExercisePack {
    #[serde(default, rename = "packVersion", alias = "version")]
    pub version: u32,
    pub exercises: Vec<Exercise>,
}

/// Summary projection for listings; never carries the reference query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseSummary {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
}

/// Rows exactly as the engine returned them. Column order is authoritative
/// for display; the verifier ignores it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl ResultSet {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.columns.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Accepted,
    WrongAnswer,
    RuntimeError,
    Timeout,
}

impl VerdictStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictStatus::Accepted => "accepted",
            VerdictStatus::WrongAnswer => "wrong_answer",
            VerdictStatus::RuntimeError => "runtime_error",
            VerdictStatus::Timeout => "timeout",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "accepted" => VerdictStatus::Accepted,
            "wrong_answer" => VerdictStatus::WrongAnswer,
            "timeout" => VerdictStatus::Timeout,
            _ => VerdictStatus::RuntimeError,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, VerdictStatus::Accepted)
    }
}

/// Final classification of one submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub status: VerdictStatus,
    /// Absent on fatal execution errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate: Option<ResultSet>,
    /// Reference output, shown as "expected" in results. Absent for
    /// ungraded exercises. The reference *query* is never included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ResultSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Verdict {
    pub fn accepted(candidate: ResultSet, reference: Option<ResultSet>, elapsed_ms: u64) -> Self {
        Verdict {
            status: VerdictStatus::Accepted,
            candidate: Some(candidate),
            reference,
            elapsed_ms: Some(elapsed_ms),
            error: None,
        }
    }

    pub fn wrong_answer(candidate: ResultSet, reference: ResultSet, elapsed_ms: u64) -> Self {
        Verdict {
            status: VerdictStatus::WrongAnswer,
            candidate: Some(candidate),
            reference: Some(reference),
            elapsed_ms: Some(elapsed_ms),
            error: None,
        }
    }

    pub fn runtime_error(message: String) -> Self {
        Verdict {
            status: VerdictStatus::RuntimeError,
            candidate: None,
            reference: None,
            elapsed_ms: None,
            error: Some(message),
        }
    }

    pub fn timeout(message: String) -> Self {
        Verdict {
            status: VerdictStatus::Timeout,
            candidate: None,
            reference: None,
            elapsed_ms: None,
            error: Some(message),
        }
    }
}

/// One persisted submission, written by the orchestrator after grading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: i64,
    pub learner_id: String,
    pub exercise_id: String,
    pub sql_text: String,
    pub sql_sha256: String,
    pub status: VerdictStatus,
    pub elapsed_ms: Option<u64>,
    pub error: Option<String>,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exercise_id_charset() {
        assert!(Exercise::validate_id("top_earners_1").is_ok());
        assert!(Exercise::validate_id("A9").is_ok());
        assert!(Exercise::validate_id("").is_err());
        assert!(Exercise::validate_id("bad-id").is_err());
        assert!(Exercise::validate_id("semi;colon").is_err());
        assert!(Exercise::validate_id(&"x".repeat(65)).is_err());
    }

    #[test]
    fn verdict_status_roundtrip() {
        for s in [
            VerdictStatus::Accepted,
            VerdictStatus::WrongAnswer,
            VerdictStatus::RuntimeError,
            VerdictStatus::Timeout,
        ] {
            assert_eq!(VerdictStatus::parse(s.as_str()), s);
        }
        assert_eq!(VerdictStatus::parse("garbage"), VerdictStatus::RuntimeError);
    }

    #[test]
    fn pack_parses_with_defaults() {
        let yaml = r#"
packVersion: 1
exercises:
  - id: scratchpad
    title: Scratchpad
    prompt: Try anything.
    schema_ddl: "CREATE TABLE t(x INTEGER);"
"#;
        let pack: ExercisePack = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(pack.version, 1);
        assert_eq!(pack.exercises.len(), 1);
        let ex = &pack.exercises[0];
        assert_eq!(ex.difficulty, Difficulty::Easy);
        assert!(ex.reference_query.is_none());
        assert_eq!(ex.starter_query, DEFAULT_STARTER_QUERY);
    }
}
