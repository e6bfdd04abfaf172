pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS exercises (
  id TEXT PRIMARY KEY,
  title TEXT NOT NULL,
  difficulty TEXT NOT NULL,
  prompt TEXT NOT NULL,
  schema_ddl TEXT NOT NULL,
  reference_query TEXT,
  starter_query TEXT NOT NULL,
  hints_json TEXT NOT NULL DEFAULT '[]',
  created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS attempts (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  learner_id TEXT NOT NULL,
  exercise_id TEXT NOT NULL,
  sql_text TEXT NOT NULL,
  sql_sha256 TEXT NOT NULL,
  status TEXT NOT NULL,
  elapsed_ms INTEGER,
  error TEXT,
  created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_attempts_learner
  ON attempts(learner_id, exercise_id, id DESC);
"#;
