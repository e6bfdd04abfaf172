//! Content store: exercise metadata and attempt records.
//!
//! This is the document-store collaborator at the orchestration boundary.
//! The sandbox never touches it; exercise namespaces live in their own
//! database files.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};

use crate::fingerprint::sha256_hex;
use crate::model::{AttemptRecord, Difficulty, Exercise, ExerciseSummary, Verdict, VerdictStatus};

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path).context("failed to open content db")?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Store {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> anyhow::Result<Self> {
        let conn =
            Connection::open_in_memory().context("failed to open in-memory content db")?;
        Ok(Store {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(crate::storage::schema::DDL)?;
        Ok(())
    }

    pub fn upsert_exercise(&self, ex: &Exercise) -> anyhow::Result<()> {
        Exercise::validate_id(&ex.id)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO exercises(id, title, difficulty, prompt, schema_ddl, reference_query, starter_query, hints_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
               title=excluded.title,
               difficulty=excluded.difficulty,
               prompt=excluded.prompt,
               schema_ddl=excluded.schema_ddl,
               reference_query=excluded.reference_query,
               starter_query=excluded.starter_query,
               hints_json=excluded.hints_json",
            params![
                ex.id,
                ex.title,
                ex.difficulty.as_str(),
                ex.prompt,
                ex.schema_ddl,
                ex.reference_query,
                ex.starter_query,
                serde_json::to_string(&ex.hints)?,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Learner-facing read: the reference query is stripped.
    pub fn get_exercise(&self, id: &str) -> anyhow::Result<Option<Exercise>> {
        let mut ex = self.fetch_exercise(id)?;
        if let Some(ex) = &mut ex {
            ex.reference_query = None;
        }
        Ok(ex)
    }

    /// Privileged read for the orchestrator; includes the reference query.
    pub fn get_exercise_with_reference(&self, id: &str) -> anyhow::Result<Option<Exercise>> {
        self.fetch_exercise(id)
    }

    fn fetch_exercise(&self, id: &str) -> anyhow::Result<Option<Exercise>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT id, title, difficulty, prompt, schema_ddl, reference_query, starter_query, hints_json
                 FROM exercises WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, Option<String>>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, String>(7)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, title, difficulty, prompt, schema_ddl, reference_query, starter_query, hints_json)) = row
        else {
            return Ok(None);
        };

        Ok(Some(Exercise {
            id,
            title,
            difficulty: Difficulty::parse(&difficulty),
            prompt,
            schema_ddl,
            reference_query,
            starter_query,
            hints: serde_json::from_str(&hints_json).unwrap_or_default(),
        }))
    }

    pub fn list_exercises(&self) -> anyhow::Result<Vec<ExerciseSummary>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT id, title, difficulty FROM exercises ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(ExerciseSummary {
                id: row.get(0)?,
                title: row.get(1)?,
                difficulty: Difficulty::parse(&row.get::<_, String>(2)?),
            })
        })?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    pub fn insert_attempt(
        &self,
        learner_id: &str,
        exercise_id: &str,
        sql_text: &str,
        verdict: &Verdict,
    ) -> anyhow::Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO attempts(learner_id, exercise_id, sql_text, sql_sha256, status, elapsed_ms, error, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                learner_id,
                exercise_id,
                sql_text,
                sha256_hex(sql_text),
                verdict.status.as_str(),
                verdict.elapsed_ms.map(|v| v as i64),
                verdict.error,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Newest first.
    pub fn recent_attempts(
        &self,
        learner_id: &str,
        exercise_id: &str,
        limit: u32,
    ) -> anyhow::Result<Vec<AttemptRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, learner_id, exercise_id, sql_text, sql_sha256, status, elapsed_ms, error, created_at
             FROM attempts
             WHERE learner_id = ?1 AND exercise_id = ?2
             ORDER BY id DESC
             LIMIT ?3",
        )?;
        let rows = stmt.query_map(params![learner_id, exercise_id, limit], |row| {
            Ok(AttemptRecord {
                id: row.get(0)?,
                learner_id: row.get(1)?,
                exercise_id: row.get(2)?,
                sql_text: row.get(3)?,
                sql_sha256: row.get(4)?,
                status: VerdictStatus::parse(&row.get::<_, String>(5)?),
                elapsed_ms: row.get::<_, Option<i64>>(6)?.map(|v| v as u64),
                error: row.get(7)?,
                created_at: row.get(8)?,
            })
        })?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    pub fn count_attempts(&self) -> anyhow::Result<i64> {
        let conn = self.conn.lock().unwrap();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM attempts", [], |r| r.get(0))?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResultSet;

    fn sample_exercise() -> Exercise {
        Exercise {
            id: "top_earners".into(),
            title: "Top earners".into(),
            difficulty: Difficulty::Easy,
            prompt: "Find employees earning more than 80000.".into(),
            schema_ddl: "CREATE TABLE employees(name TEXT, salary INTEGER);".into(),
            reference_query: Some("SELECT name, salary FROM employees WHERE salary > 80000".into()),
            starter_query: "SELECT 1;".into(),
            hints: vec!["Use WHERE.".into()],
        }
    }

    #[test]
    fn exercise_roundtrip_and_reference_stripping() {
        let store = Store::memory().unwrap();
        store.init_schema().unwrap();
        store.upsert_exercise(&sample_exercise()).unwrap();

        let public = store.get_exercise("top_earners").unwrap().unwrap();
        assert!(public.reference_query.is_none());
        assert_eq!(public.hints.len(), 1);

        let privileged = store
            .get_exercise_with_reference("top_earners")
            .unwrap()
            .unwrap();
        assert!(privileged.reference_query.is_some());

        assert!(store.get_exercise("nope").unwrap().is_none());
    }

    #[test]
    fn upsert_overwrites() {
        let store = Store::memory().unwrap();
        store.init_schema().unwrap();
        let mut ex = sample_exercise();
        store.upsert_exercise(&ex).unwrap();
        ex.title = "Renamed".into();
        store.upsert_exercise(&ex).unwrap();

        let list = store.list_exercises().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].title, "Renamed");
    }

    #[test]
    fn attempts_are_recorded_newest_first() {
        let store = Store::memory().unwrap();
        store.init_schema().unwrap();

        let ok = Verdict::accepted(ResultSet::default(), None, 12);
        let bad = Verdict::runtime_error("no such table: t".into());
        store.insert_attempt("lea", "top_earners", "SELECT 1", &ok).unwrap();
        store.insert_attempt("lea", "top_earners", "SELECT x", &bad).unwrap();
        store.insert_attempt("other", "top_earners", "SELECT 2", &ok).unwrap();

        let attempts = store.recent_attempts("lea", "top_earners", 10).unwrap();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].status, VerdictStatus::RuntimeError);
        assert_eq!(attempts[0].error.as_deref(), Some("no such table: t"));
        assert_eq!(attempts[1].status, VerdictStatus::Accepted);
        assert_eq!(attempts[1].elapsed_ms, Some(12));
        assert_eq!(attempts[1].sql_sha256, sha256_hex("SELECT 1"));
    }
}
