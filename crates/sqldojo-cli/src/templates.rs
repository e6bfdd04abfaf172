pub const SAMPLE_PACK: &str = r#"packVersion: 1
exercises:
  - id: top_earners
    title: "Top earners"
    difficulty: easy
    prompt: "Return the name and salary of every employee earning more than 80000."
    schema_ddl: |
      CREATE TABLE employees(name TEXT, salary INTEGER);
      INSERT INTO employees VALUES ('Alice', 90000), ('Bob', 50000);
    reference_query: "SELECT name, salary FROM employees WHERE salary > 80000"
    hints:
      - "Filter with a WHERE clause."

  - id: scratchpad
    title: "Scratchpad"
    difficulty: easy
    prompt: "Ungraded playground. Try anything against the employees table."
    schema_ddl: |
      CREATE TABLE employees(name TEXT, salary INTEGER);
      INSERT INTO employees VALUES ('Alice', 90000), ('Bob', 50000);
"#;

pub const GITIGNORE: &str = "/.sqldojo/\n*.db\n*.db-shm\n*.db-wal\n";
