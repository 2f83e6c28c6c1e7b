// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]

mod commands;
mod format;

use anyhow::Result;
use clap::{Parser, Subcommand};
use runproc::CancelToken;
use runproc_config::{RunprocConfig, load_config, merge_configs};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::RunArgs;

#[derive(Parser, Debug)]
#[command(name = "runproc", version, about = "Run a process and report how it ended")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,

    /// Config file. Can be repeated; later files override earlier ones.
    #[arg(long, global = true)]
    config: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one process and mirror its exit status.
    Run(RunArgs),

    /// Run named requests from the config and report each outcome.
    Show {
        /// Request names (default: all, in name order).
        names: Vec<String>,
    },

    /// Validate the config and print warnings.
    Check,

    /// Print the JSON schema of the config file.
    Schema,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match real_main(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

async fn real_main(cli: Cli) -> Result<ExitCode> {
    let config = load_merged(&cli.config)?;
    init_tracing(cli.debug, &config);

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!(target: "runproc.cli", "interrupt received; cancelling");
                cancel.cancel();
            }
        });
    }

    match cli.command {
        Commands::Run(args) => commands::cmd_run(args, &config, &cancel).await,
        Commands::Show { names } => commands::cmd_show(names, &config, &cancel).await,
        Commands::Check => commands::cmd_check(&config),
        Commands::Schema => commands::cmd_schema(),
    }
}

fn load_merged(paths: &[PathBuf]) -> Result<RunprocConfig> {
    if paths.is_empty() {
        return Ok(load_config(None)?);
    }
    let mut merged: Option<RunprocConfig> = None;
    for path in paths {
        let next = load_config(Some(path))?;
        merged = Some(match merged {
            Some(base) => merge_configs(base, next),
            None => next,
        });
    }
    Ok(merged.unwrap_or_default())
}

fn init_tracing(debug: bool, config: &RunprocConfig) {
    let filter = if debug {
        EnvFilter::new("runproc=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = config.log_level.as_deref().unwrap_or("info");
            EnvFilter::new(format!("runproc={level}"))
        })
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
