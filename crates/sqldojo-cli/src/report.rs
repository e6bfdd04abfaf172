use sqldojo_core::model::{AttemptRecord, Exercise, ResultSet, Verdict, VerdictStatus};

pub fn print_verdict(verdict: &Verdict) {
    match verdict.status {
        VerdictStatus::Accepted => eprintln!("ACCEPTED"),
        VerdictStatus::WrongAnswer => eprintln!("WRONG ANSWER"),
        VerdictStatus::RuntimeError => eprintln!("RUNTIME ERROR"),
        VerdictStatus::Timeout => eprintln!("TIMEOUT"),
    }
    if let Some(ms) = verdict.elapsed_ms {
        eprintln!("elapsed: {} ms", ms);
    }
    if let Some(err) = &verdict.error {
        eprintln!("error: {}", err);
    }

    if let Some(candidate) = &verdict.candidate {
        println!("your output:");
        print_result_set(candidate);
    }
    if verdict.status == VerdictStatus::WrongAnswer {
        if let Some(reference) = &verdict.reference {
            println!("expected output:");
            print_result_set(reference);
        }
    }
}

fn print_result_set(rs: &ResultSet) {
    if rs.is_empty() {
        println!("  (no rows)");
        return;
    }
    println!("  {}", rs.columns.join(" | "));
    for row in &rs.rows {
        let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        println!("  {}", cells.join(" | "));
    }
    println!("  ({} rows)", rs.row_count());
}

pub fn print_exercise(ex: &Exercise) {
    println!("{} [{}]", ex.title, ex.difficulty.as_str());
    println!();
    println!("{}", ex.prompt);
    println!();
    println!("starter query:");
    println!("{}", ex.starter_query);
    if !ex.hints.is_empty() {
        println!();
        println!("hints:");
        for hint in &ex.hints {
            println!("- {}", hint);
        }
    }
}

pub fn print_attempts(attempts: &[AttemptRecord]) {
    for a in attempts {
        let elapsed = a
            .elapsed_ms
            .map(|ms| format!("{} ms", ms))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<20} {:<14} {:<8} {}",
            a.created_at,
            a.status.as_str(),
            elapsed,
            a.error.as_deref().unwrap_or("")
        );
    }
    eprintln!("{} attempts", attempts.len());
}
