//! slotgate - CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use slotgate::demo::{run_queue_demo, TaskSpec, TracingSink};
use slotgate::util::config::{load_skipping, ENV_CONCURRENCY};
use slotgate::util::logger;
use slotgate::{ConcurrencyLimit, TaskRunner, NAME, VERSION};

/// Bounded-concurrency task runner and work-queue demo
#[derive(Parser, Debug)]
#[command(name = "slotgate")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ~/.config/slotgate/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bounded work-queue demo
    Demo {
        /// Maximum tasks running at once
        #[arg(short = 'n', long, value_name = "N", allow_negative_numbers = true)]
        concurrency: Option<i64>,

        /// Task durations in milliseconds
        #[arg(short, long, value_name = "MS", value_delimiter = ',')]
        tasks: Option<Vec<u64>>,

        /// Task id that should fail (repeatable)
        #[arg(short, long, value_name = "ID")]
        fail: Vec<usize>,
    },

    /// Print the effective configuration
    Config,

    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // CLI flags outrank the environment: don't even read what they replace.
    let superseded: &[&str] = match &args.command {
        Commands::Demo {
            concurrency: Some(_),
            ..
        } => &[ENV_CONCURRENCY],
        _ => &[],
    };
    let mut config = load_skipping(args.config.as_deref(), superseded)
        .context("Failed to load configuration")?;
    if args.verbose {
        config.log.level = logger::LogLevel::Debug;
    }
    logger::init_with_level(config.log.level);

    match args.command {
        Commands::Demo {
            concurrency,
            tasks,
            fail,
        } => {
            if let Some(limit) = concurrency {
                config.runner.concurrency =
                    ConcurrencyLimit::try_from(limit).context("Invalid --concurrency")?;
            }
            if let Some(tasks) = tasks {
                config.demo.tasks_ms = tasks;
            }
            if !fail.is_empty() {
                config.demo.fail = fail;
            }

            let specs = TaskSpec::from_millis(&config.demo.tasks_ms, &config.demo.fail);
            let runner = TaskRunner::with_limit(config.runner.concurrency);

            tracing::info!(
                "Starting task queue demo (concurrency: {})...",
                config.runner.concurrency
            );
            let report = run_queue_demo(&runner, &specs, Arc::new(TracingSink))
                .await
                .context("Demo run failed")?;

            for failure in &report.failures {
                tracing::warn!("{}", failure);
            }
            println!("{}", report);
        }
        Commands::Config => {
            print!("{}", config.to_toml().context("Failed to render configuration")?);
        }
        Commands::Version => {
            println!("{} {}", NAME, VERSION);
        }
    }

    Ok(())
}
