use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod report;
mod templates;

use cli::args::Cli;
use cli::commands::dispatch;

fn init_logging() {
    let filter = EnvFilter::try_from_env("SQLDOJO_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    init_logging();
    let cli = Cli::parse();
    let code = match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fatal: {e:?}");
            cli::commands::exit_codes::CONFIG_ERROR
        }
    };
    std::process::exit(code);
}
