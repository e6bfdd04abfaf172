use sqldojo_core::config::EngineConfig;
use sqldojo_core::engine::runner::SubmissionRunner;
use sqldojo_core::model::{Difficulty, Exercise, VerdictStatus};
use sqldojo_core::provision::Provisioner;
use sqldojo_core::sandbox::pool::CancelToken;
use sqldojo_core::sandbox::ExecutionSandbox;
use sqldojo_core::storage::Store;

const EMPLOYEES_DDL: &str = "\
CREATE TABLE employees(name TEXT, salary INTEGER);
INSERT INTO employees VALUES ('Alice', 90000), ('Bob', 50000);";

fn employees_exercise(id: &str, reference: Option<&str>) -> Exercise {
    Exercise {
        id: id.into(),
        title: "Employees".into(),
        difficulty: Difficulty::Easy,
        prompt: "Who earns more than 80000?".into(),
        schema_ddl: EMPLOYEES_DDL.into(),
        reference_query: reference.map(|s| s.into()),
        starter_query: String::new(),
        hints: vec![],
    }
}

fn runner_for(dir: &std::path::Path, ex: &Exercise) -> SubmissionRunner {
    let config = EngineConfig::with_data_dir(dir);
    Provisioner::new(config.clone()).provision(ex).unwrap();
    let store = Store::memory().unwrap();
    store.init_schema().unwrap();
    store.upsert_exercise(ex).unwrap();
    SubmissionRunner::new(store, ExecutionSandbox::new(config))
}

#[tokio::test]
async fn swapped_projection_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let ex = employees_exercise(
        "grade_swap",
        Some("SELECT name, salary FROM employees WHERE salary > 80000"),
    );
    let runner = runner_for(dir.path(), &ex);

    let verdict = runner
        .submit(
            Some("lea"),
            "grade_swap",
            "SELECT salary, name FROM employees WHERE salary > 80000",
            &CancelToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(verdict.status, VerdictStatus::Accepted);
    let candidate = verdict.candidate.unwrap();
    assert_eq!(candidate.columns, vec!["salary", "name"]);
    assert_eq!(candidate.row_count(), 1);
    assert_eq!(verdict.reference.unwrap().row_count(), 1);
    assert!(verdict.elapsed_ms.is_some());
}

#[tokio::test]
async fn wrong_answer_keeps_both_result_sets() {
    let dir = tempfile::tempdir().unwrap();
    let ex = employees_exercise(
        "grade_wrong",
        Some("SELECT name FROM employees WHERE salary > 80000"),
    );
    let runner = runner_for(dir.path(), &ex);

    let verdict = runner
        .submit(Some("lea"), "grade_wrong", "SELECT name FROM employees", &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(verdict.status, VerdictStatus::WrongAnswer);
    assert_eq!(verdict.candidate.unwrap().row_count(), 2);
    assert_eq!(verdict.reference.unwrap().row_count(), 1);
}

#[tokio::test]
async fn runtime_error_surfaces_engine_message() {
    let dir = tempfile::tempdir().unwrap();
    let ex = employees_exercise("grade_err", Some("SELECT 1"));
    let runner = runner_for(dir.path(), &ex);

    let verdict = runner
        .submit(Some("lea"), "grade_err", "SELECT * FROM missing_table", &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(verdict.status, VerdictStatus::RuntimeError);
    assert!(verdict.candidate.is_none());
    assert!(verdict.error.unwrap().contains("missing_table"));
}

#[tokio::test]
async fn timeout_is_a_distinct_verdict() {
    let dir = tempfile::tempdir().unwrap();
    let ex = employees_exercise("grade_slow", Some("SELECT 1"));
    let config = EngineConfig {
        statement_timeout_ms: 100,
        ..EngineConfig::with_data_dir(dir.path())
    };
    Provisioner::new(config.clone()).provision(&ex).unwrap();
    let store = Store::memory().unwrap();
    store.init_schema().unwrap();
    store.upsert_exercise(&ex).unwrap();
    let runner = SubmissionRunner::new(store, ExecutionSandbox::new(config));

    let verdict = runner
        .submit(
            Some("lea"),
            "grade_slow",
            "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c) SELECT count(*) FROM c",
            &CancelToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(verdict.status, VerdictStatus::Timeout);

    let attempts = runner.store.recent_attempts("lea", "grade_slow", 10).unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].status, VerdictStatus::Timeout);
}

#[tokio::test]
async fn ungraded_exercise_always_passes() {
    let dir = tempfile::tempdir().unwrap();
    let ex = employees_exercise("grade_playground", None);
    let runner = runner_for(dir.path(), &ex);

    let verdict = runner
        .submit(None, "grade_playground", "SELECT salary * 2 AS doubled FROM employees", &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(verdict.status, VerdictStatus::Accepted);
    assert!(verdict.reference.is_none());
    assert_eq!(verdict.candidate.unwrap().columns, vec!["doubled"]);
}

#[tokio::test]
async fn attempts_only_recorded_for_known_learners() {
    let dir = tempfile::tempdir().unwrap();
    let ex = employees_exercise("grade_anon", None);
    let runner = runner_for(dir.path(), &ex);
    let cancel = CancelToken::new();

    runner.submit(None, "grade_anon", "SELECT 1", &cancel).await.unwrap();
    assert_eq!(runner.store.count_attempts().unwrap(), 0);

    runner.submit(Some("lea"), "grade_anon", "SELECT 1", &cancel).await.unwrap();
    assert_eq!(runner.store.count_attempts().unwrap(), 1);
}

#[tokio::test]
async fn unknown_exercise_is_a_service_error() {
    let dir = tempfile::tempdir().unwrap();
    let ex = employees_exercise("grade_known", None);
    let runner = runner_for(dir.path(), &ex);

    let err = runner
        .submit(None, "grade_missing", "SELECT 1", &CancelToken::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("unknown exercise"));
}

#[tokio::test]
async fn numeric_formatting_does_not_fail_learners() {
    let dir = tempfile::tempdir().unwrap();
    let ex = Exercise {
        id: "grade_float".into(),
        title: "Averages".into(),
        difficulty: Difficulty::Medium,
        prompt: "Average salary.".into(),
        schema_ddl: EMPLOYEES_DDL.into(),
        reference_query: Some("SELECT 70000.0 AS avg_salary".into()),
        starter_query: String::new(),
        hints: vec![],
    };
    let runner = runner_for(dir.path(), &ex);

    // Integer-typed result for a float-typed reference of equal value.
    let verdict = runner
        .submit(None, "grade_float", "SELECT avg(salary) FROM employees", &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(verdict.status, VerdictStatus::Accepted);
}

#[test]
fn provisioning_is_idempotent_and_reseeds() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::with_data_dir(dir.path());
    let prov = Provisioner::new(config.clone());
    let ex = employees_exercise("prov_twice", None);

    prov.provision(&ex).unwrap();
    prov.provision(&ex).unwrap();

    let conn = rusqlite::Connection::open(config.namespace_path("prov_twice")).unwrap();
    let n: i64 = conn
        .query_row("SELECT count(*) FROM employees", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 2);
}

#[test]
fn provisioning_reports_ddl_failures() {
    let dir = tempfile::tempdir().unwrap();
    let prov = Provisioner::new(EngineConfig::with_data_dir(dir.path()));
    let mut ex = employees_exercise("prov_bad", None);
    ex.schema_ddl = "CREATE TABLE t(x INTEGER); INSERT INTO nowhere VALUES (1);".into();

    let err = prov.provision(&ex).unwrap_err();
    assert_eq!(err.exercise_id, "prov_bad");
    assert!(err.message.contains("nowhere"), "{}", err.message);
}
