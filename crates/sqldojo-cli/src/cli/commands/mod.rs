use std::path::Path;

use sqldojo_core::config::{load_config, load_pack, EngineConfig};
use sqldojo_core::engine::runner::SubmissionRunner;
use sqldojo_core::provision::Provisioner;
use sqldojo_core::sandbox::pool::CancelToken;
use sqldojo_core::sandbox::ExecutionSandbox;
use sqldojo_core::storage::Store;

use super::args::*;
use crate::report;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const REJECTED: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Init(args) => cmd_init(args),
        Command::Seed(args) => cmd_seed(args),
        Command::List(args) => cmd_list(args),
        Command::Show(args) => cmd_show(args),
        Command::Submit(args) => cmd_submit(args).await,
        Command::Attempts(args) => cmd_attempts(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

fn cmd_init(args: InitArgs) -> anyhow::Result<i32> {
    write_file_if_missing(&args.pack, crate::templates::SAMPLE_PACK)?;
    if args.gitignore {
        write_file_if_missing(Path::new(".gitignore"), crate::templates::GITIGNORE)?;
    }
    Ok(exit_codes::OK)
}

fn write_file_if_missing(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::write(path, content)?;
        eprintln!("created {}", path.display());
    } else {
        eprintln!("note: {} already exists (skipped)", path.display());
    }
    Ok(())
}

fn cmd_seed(args: SeedArgs) -> anyhow::Result<i32> {
    let pack = match load_pack(&args.pack) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("config error: {}", e);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let config = EngineConfig::with_data_dir(&args.data_dir);
    let store = open_store(&config)?;
    let provisioner = Provisioner::new(config);

    for ex in &pack.exercises {
        store.upsert_exercise(ex)?;
        provisioner.provision(ex)?;
        eprintln!("seeded {}", ex.id);
    }
    eprintln!("seeded {} exercises into {}", pack.exercises.len(), args.data_dir.display());
    Ok(exit_codes::OK)
}

fn cmd_list(args: ListArgs) -> anyhow::Result<i32> {
    let store = open_store(&EngineConfig::with_data_dir(&args.data_dir))?;
    let exercises = store.list_exercises()?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&exercises)?);
    } else {
        for ex in &exercises {
            println!("{:<24} {:<8} {}", ex.id, ex.difficulty.as_str(), ex.title);
        }
        eprintln!("{} exercises", exercises.len());
    }
    Ok(exit_codes::OK)
}

fn cmd_show(args: ShowArgs) -> anyhow::Result<i32> {
    let store = open_store(&EngineConfig::with_data_dir(&args.data_dir))?;
    let Some(ex) = store.get_exercise(&args.exercise_id)? else {
        eprintln!("unknown exercise: {}", args.exercise_id);
        return Ok(exit_codes::CONFIG_ERROR);
    };

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&ex)?);
    } else {
        report::print_exercise(&ex);
    }
    Ok(exit_codes::OK)
}

async fn cmd_submit(args: SubmitArgs) -> anyhow::Result<i32> {
    let sql = match (&args.sql, &args.file) {
        (Some(s), None) => s.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)?,
        _ => {
            eprintln!("config error: pass the query with --sql or --file");
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let mut config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("config error: {}", e);
                return Ok(exit_codes::CONFIG_ERROR);
            }
        },
        None => EngineConfig::with_data_dir(&args.data_dir),
    };
    if let Some(ms) = args.timeout_ms {
        if ms == 0 {
            eprintln!("config error: --timeout-ms must be nonzero");
            return Ok(exit_codes::CONFIG_ERROR);
        }
        config.statement_timeout_ms = ms;
    }

    let store = open_store(&config)?;
    let runner = SubmissionRunner::new(store, ExecutionSandbox::new(config));
    let verdict = runner
        .submit(args.learner.as_deref(), &args.exercise_id, &sql, &CancelToken::new())
        .await?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        report::print_verdict(&verdict);
    }

    if verdict.status.is_accepted() {
        Ok(exit_codes::OK)
    } else {
        Ok(exit_codes::REJECTED)
    }
}

fn cmd_attempts(args: AttemptsArgs) -> anyhow::Result<i32> {
    let store = open_store(&EngineConfig::with_data_dir(&args.data_dir))?;
    let attempts = store.recent_attempts(&args.learner, &args.exercise_id, args.last)?;
    report::print_attempts(&attempts);
    Ok(exit_codes::OK)
}

fn open_store(config: &EngineConfig) -> anyhow::Result<Store> {
    std::fs::create_dir_all(&config.data_dir)?;
    let store = Store::open(&config.content_db_path())?;
    store.init_schema()?;
    Ok(store)
}
