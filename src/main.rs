//! hacceptance CLI - run interaction scripts from the command line.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use hacceptance::prelude::*;
use hacceptance::wait::as_millis;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hacceptance")]
#[command(author, version, about = "Scripted acceptance tests for interactive CLIs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a script against a live pty session
    Run {
        /// Path to the script
        script: PathBuf,

        /// JSON or YAML harness config
        #[arg(long)]
        config: Option<PathBuf>,

        /// Expectation timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Terminal width
        #[arg(long)]
        cols: Option<u16>,

        /// Terminal height
        #[arg(long)]
        rows: Option<u16>,

        /// Do not record the session
        #[arg(long)]
        no_record: bool,
    },

    /// Parse a script and print its steps as JSON
    Parse {
        /// Path to the script
        script: PathBuf,

        /// Print on a single line
        #[arg(long)]
        compact: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            script,
            config,
            timeout_ms,
            cols,
            rows,
            no_record,
        } => {
            let mut config = match config {
                Some(path) => HarnessConfig::load(&path)?,
                None => HarnessConfig::default(),
            };
            if let Some(timeout_ms) = timeout_ms {
                config.timeout_ms = timeout_ms;
            }
            if let Some(cols) = cols {
                config.cols = cols;
            }
            if let Some(rows) = rows {
                config.rows = rows;
            }
            if no_record {
                config.recorder.enabled = false;
            }

            run_script(&script, config).await?;
        }
        Commands::Parse { script, compact } => {
            let parsed = parse_file(&script)?;
            if compact {
                println!("{}", parsed.to_json_compact()?);
            } else {
                println!("{}", parsed.to_json()?);
            }
        }
    }

    Ok(())
}

async fn run_script(path: &Path, config: HarnessConfig) -> Result<()> {
    let script = parse_file(path)?;
    let started = std::time::Instant::now();

    Driver::new(config).execute(&script).await?;

    eprintln!(
        "{}: {} steps passed in {:.2?}",
        path.display(),
        script.len(),
        Duration::from_millis(as_millis(started.elapsed()))
    );
    Ok(())
}
