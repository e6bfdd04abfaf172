use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sqldojo",
    version,
    about = "Sandboxed SQL exercise execution and grading"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scaffold a starter exercise pack
    Init(InitArgs),
    /// Load an exercise pack and provision its namespaces
    Seed(SeedArgs),
    /// List seeded exercises
    List(ListArgs),
    /// Show one exercise as a learner sees it
    Show(ShowArgs),
    /// Run a query against an exercise and grade it
    Submit(SubmitArgs),
    /// Show recent attempts for a learner on an exercise
    Attempts(AttemptsArgs),
    Version,
}

#[derive(Parser, Clone)]
pub struct InitArgs {
    #[arg(long, default_value = "exercises.yaml")]
    pub pack: PathBuf,

    /// generate .gitignore for the data directory
    #[arg(long)]
    pub gitignore: bool,
}

#[derive(Parser, Clone)]
pub struct SeedArgs {
    #[arg(long, default_value = "exercises.yaml")]
    pub pack: PathBuf,

    #[arg(long, default_value = ".sqldojo")]
    pub data_dir: PathBuf,
}

#[derive(Parser, Clone)]
pub struct ListArgs {
    #[arg(long, default_value = ".sqldojo")]
    pub data_dir: PathBuf,

    /// Output format: text | json
    #[arg(long, default_value = "text")]
    pub format: String,
}

#[derive(Parser, Clone)]
pub struct ShowArgs {
    pub exercise_id: String,

    #[arg(long, default_value = ".sqldojo")]
    pub data_dir: PathBuf,

    /// Output format: text | json
    #[arg(long, default_value = "text")]
    pub format: String,
}

#[derive(Parser, Clone)]
pub struct SubmitArgs {
    pub exercise_id: String,

    /// Query text; mutually exclusive with --file
    #[arg(long)]
    pub sql: Option<String>,

    /// Read the query from a file
    #[arg(long, conflicts_with = "sql")]
    pub file: Option<PathBuf>,

    /// Learner identifier; attempts are only recorded when set
    #[arg(long, env = "SQLDOJO_LEARNER")]
    pub learner: Option<String>,

    #[arg(long, default_value = ".sqldojo")]
    pub data_dir: PathBuf,

    /// Engine config file (YAML); overrides --data-dir and the defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Per-statement execution bound in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Output format: text | json
    #[arg(long, default_value = "text")]
    pub format: String,
}

#[derive(Parser, Clone)]
pub struct AttemptsArgs {
    pub exercise_id: String,

    #[arg(long, env = "SQLDOJO_LEARNER")]
    pub learner: String,

    /// Number of recent attempts to show
    #[arg(long, default_value_t = 10)]
    pub last: u32,

    #[arg(long, default_value = ".sqldojo")]
    pub data_dir: PathBuf,
}
