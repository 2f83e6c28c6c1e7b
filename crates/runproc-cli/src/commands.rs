// SPDX-License-Identifier: MIT OR Apache-2.0
//! Subcommand implementations.

use anyhow::{Context, Result, bail};
use clap::Args;
use runproc::{CancelToken, Request, invoke};
use runproc_config::{RunprocConfig, validate_config};
use schemars::schema_for;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, warn};

use crate::format::{
    OutputFormat, exit_status_for, exit_status_for_error, format_invoke_error, format_json,
    format_report,
};

/// Arguments for `runproc run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Working directory for the child.
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Environment assignment as KEY=VALUE. Can be repeated.
    #[arg(long = "env")]
    pub env_vars: Vec<String>,

    /// Start the child with only the `--env` variables.
    #[arg(long)]
    pub clear_env: bool,

    /// File whose contents become the child's stdin.
    #[arg(long, conflicts_with = "stdin_text")]
    pub stdin_file: Option<PathBuf>,

    /// Literal text written to the child's stdin.
    #[arg(long)]
    pub stdin_text: Option<String>,

    /// Kill the child after this many milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// How to print the result.
    #[arg(long, value_enum, default_value_t = OutputFormat::Raw)]
    pub format: OutputFormat,

    /// Executable to run.
    pub path: String,

    /// Arguments passed to the executable.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Parse a `KEY=VALUE` pair.
pub fn parse_env_pair(pair: &str) -> Result<(String, String)> {
    match pair.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => bail!("invalid --env '{pair}': expected KEY=VALUE"),
    }
}

fn token_for(cancel: &CancelToken, timeout: Option<Duration>) -> CancelToken {
    match timeout {
        Some(timeout) => cancel.limited_to(timeout),
        None => cancel.clone(),
    }
}

/// `runproc run`: invoke once and mirror the child's exit status.
pub async fn cmd_run(
    args: RunArgs,
    config: &RunprocConfig,
    cancel: &CancelToken,
) -> Result<ExitCode> {
    let env = args
        .env_vars
        .iter()
        .map(|pair| parse_env_pair(pair))
        .collect::<Result<Vec<_>>>()?;

    let mut request = Request::new(&args.path)
        .args(args.args)
        .envs(env)
        .inherit_env(!args.clear_env);
    if let Some(dir) = args.dir {
        request = request.dir(dir);
    }
    if let Some(file) = args.stdin_file {
        request = request.stdin_file(file);
    } else if let Some(text) = args.stdin_text {
        request = request.stdin(text);
    }

    let timeout = args
        .timeout_ms
        .or(config.default_timeout_ms)
        .map(Duration::from_millis);
    let token = token_for(cancel, timeout);
    debug!(target: "runproc.cli", path = %args.path, ?timeout, "run");

    let resp = match invoke(&request, &token).await {
        Ok(resp) => resp,
        Err(err) => {
            eprint!("{}", format_invoke_error(None, &err));
            return Ok(ExitCode::from(exit_status_for_error(&err)));
        }
    };

    match args.format {
        OutputFormat::Raw => {
            std::io::stdout()
                .write_all(&resp.stdout)
                .context("write stdout")?;
            std::io::stderr()
                .write_all(&resp.stderr)
                .context("write stderr")?;
            if let Some(term) = resp.err {
                warn!(target: "runproc.cli", path = %args.path, "{term}");
            }
        }
        OutputFormat::Text => print!("{}", format_report(None, &resp)),
        OutputFormat::Json => println!("{}", format_json(&resp, false)?),
        OutputFormat::JsonPretty => println!("{}", format_json(&resp, true)?),
    }

    Ok(ExitCode::from(exit_status_for(&resp)))
}

/// `runproc show`: run named requests from the config and print a report for
/// each. With no names, every configured request runs in name order.
pub async fn cmd_show(
    names: Vec<String>,
    config: &RunprocConfig,
    cancel: &CancelToken,
) -> Result<ExitCode> {
    let names = if names.is_empty() {
        config.requests.keys().cloned().collect()
    } else {
        names
    };
    if names.is_empty() {
        bail!("no requests configured; pass --config with a [requests.<name>] table");
    }

    let mut failures = 0usize;
    for name in &names {
        let entry = config.request(name)?;
        let token = token_for(cancel, config.timeout_for(entry));
        match invoke(&entry.to_request(), &token).await {
            Ok(resp) => print!("\n{}", format_report(Some(name), &resp)),
            Err(err) => {
                failures += 1;
                print!("\n{}", format_invoke_error(Some(name), &err));
            }
        }
    }

    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// `runproc check`: validate the merged config and print warnings.
pub fn cmd_check(config: &RunprocConfig) -> Result<ExitCode> {
    let warnings = validate_config(config)?;
    for warning in &warnings {
        println!("warning: {warning}");
    }
    println!(
        "ok: {} request(s), {} warning(s)",
        config.requests.len(),
        warnings.len()
    );
    Ok(ExitCode::SUCCESS)
}

/// Return the JSON schema of [`RunprocConfig`] as a pretty-printed string.
pub fn schema_json() -> Result<String> {
    let value = serde_json::to_value(schema_for!(RunprocConfig))?;
    serde_json::to_string_pretty(&value).context("serialize schema")
}

/// `runproc schema`: print the config JSON schema.
pub fn cmd_schema() -> Result<ExitCode> {
    println!("{}", schema_json()?);
    Ok(ExitCode::SUCCESS)
}
