//! PipeWatch - terminal status watcher for AWS CodePipeline and CodeBuild.
//!
//! Polls the configured pipelines and build projects on a fixed interval
//! and keeps their status on screen with in-place cursor updates.
//!
//! ## Usage
//!
//! ```bash
//! # Watch everything in ~/.pipewatch/config.yaml
//! pipewatch
//!
//! # Explicit config and a slower cadence
//! pipewatch watch --config ./staging.yaml --interval 10
//!
//! # Print and validate the effective configuration
//! pipewatch config
//!
//! # Show version
//! pipewatch --version
//! ```

use std::io::Write;
use std::panic;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use pipewatch_core::{Config, WatchError, init_logging};
use pipewatch_fetch::{AwsCli, FetcherSet};
use pipewatch_tui::{AnsiTerminal, WatchSession};

/// PipeWatch status watcher
///
/// Watches AWS CodePipeline pipelines and CodeBuild projects in the
/// terminal, rewriting only the lines that changed each poll cycle.
#[derive(Parser, Debug)]
#[command(name = "pipewatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging (increases log level)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (defaults to ~/.pipewatch/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for log files (defaults to ~/.pipewatch/logs/)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch the configured pipelines and build projects (default)
    Watch {
        /// Override the poll interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Print and validate the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let watching = !matches!(cli.command, Some(Command::Config));

    // The watch display owns the terminal, so the console log layer stays
    // off while watching; everything still lands in the log file.
    let _guard = match init_logging(cli.log_dir.clone(), cli.verbose > 0, !watching) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::from(1);
        }
    };

    install_panic_hook();

    let result = match &cli.command {
        Some(Command::Config) => run_config(&cli),
        Some(Command::Watch { interval }) => run_watch(&cli, *interval).await,
        None => run_watch(&cli, None).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "pipewatch exited with error");
            eprintln!("Error: {e:#}");
            if let Some(watch_err) = e.downcast_ref::<WatchError>() {
                if let Some(guidance) = watch_err.guidance() {
                    eprintln!("Hint: {guidance}");
                }
            }
            ExitCode::from(1)
        }
    }
}

/// Install a panic hook that makes the cursor visible again before printing
/// the panic message.
///
/// The watch display hides the cursor for the whole session; without this,
/// a panic mid-cycle would leave the user's terminal without one.
fn install_panic_hook() {
    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_cursor();
        original_hook(panic_info);
    }));
}

/// Emit the cursor-visible sequence directly to stdout.
fn restore_cursor() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    crossterm::execute!(stdout, crossterm::cursor::Show)?;
    stdout.flush()
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    Ok(config)
}

/// Enter the poll loop with a fully validated entity list.
async fn run_watch(cli: &Cli, interval: Option<u64>) -> anyhow::Result<()> {
    let mut config = load_config(cli)?;
    if let Some(secs) = interval {
        config.poll_interval_secs = secs;
    }

    let aws = AwsCli::new(config.region.clone(), config.profile.clone());
    let fetcher = Arc::new(FetcherSet::aws(aws));

    info!(
        pipelines = config.pipelines.len(),
        build_projects = config.build_projects.len(),
        interval_secs = config.poll_interval_secs,
        "starting watch session"
    );

    let mut session = WatchSession::new(&config, fetcher, AnsiTerminal::new())?;
    session.run().await?;
    Ok(())
}

/// Print the effective configuration and validate it.
fn run_config(cli: &Cli) -> anyhow::Result<()> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };

    let config = Config::load(&path).with_context(|| format!("loading {}", path.display()))?;

    println!("# {}", path.display());
    print!(
        "{}",
        serde_yaml::to_string(&config).context("serializing configuration")?
    );

    config.validate()?;
    println!();
    println!(
        "Configuration OK: watching {} entities",
        config.entities().len()
    );
    Ok(())
}
