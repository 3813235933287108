// Entrypoint for the CLI application.
// - Keeps `main` small: parse flags, set up logging, build the client and
//   hand everything to the workflow loop.
// - Exit code 0 when the operator quits, 1 on any fatal error.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use lgxt_cli::config::CONFIG_FILE_NAME;
use lgxt_cli::ui::{TerminalConsole, ThreadPacer};
use lgxt_cli::{ApiClient, HttpTransport, JsonFileStore, Workflow};
use tracing_subscriber::EnvFilter;

/// Submit coursework on the lgxt platform from the terminal.
#[derive(Parser, Debug)]
#[command(name = "lgxt", version, about, long_about = None)]
struct Args {
    /// Settings file holding saved credentials and the bulk delay
    #[arg(short, long, value_name = "FILE", default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// API root (default: $LGXT_API_URL or the public platform)
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Enable verbose logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // RUST_LOG wins over --verbose; logs stay on stderr, off the prompts.
    let default_level = if args.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let transport = match args.base_url {
        Some(url) => HttpTransport::new(url)?,
        None => HttpTransport::from_env()?,
    };
    tracing::debug!(base_url = transport.base_url(), config = %args.config.display(), "starting");

    let mut workflow = Workflow::new(
        ApiClient::new(transport),
        TerminalConsole,
        JsonFileStore::new(args.config),
        ThreadPacer,
    );
    workflow.run()?;
    Ok(())
}
