// SPDX-License-Identifier: MIT OR Apache-2.0
//! Output formatting utilities for the runproc CLI.

use clap::ValueEnum;
use runproc::{InvokeError, Response};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

/// Supported output formats for `runproc run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Copy the child's stdout and stderr to our own streams.
    Raw,
    /// Four-line `Err`/`Code`/`Stdout`/`Stderr` report.
    Text,
    /// Compact JSON (single line).
    Json,
    /// Pretty-printed JSON.
    JsonPretty,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Raw => "raw",
            Self::Text => "text",
            Self::Json => "json",
            Self::JsonPretty => "json-pretty",
        };
        f.write_str(s)
    }
}

/// Serializable view of a [`Response`].
#[derive(Debug, Serialize)]
pub struct ResponseView<'a> {
    /// Exit code, or -1 when signaled.
    pub code: i32,
    /// Terminating signal number.
    pub signal: Option<i32>,
    /// Signal description.
    pub err: Option<String>,
    /// Captured stdout, lossily decoded.
    pub stdout: Cow<'a, str>,
    /// Captured stderr, lossily decoded.
    pub stderr: Cow<'a, str>,
}

impl<'a> From<&'a Response> for ResponseView<'a> {
    fn from(resp: &'a Response) -> Self {
        Self {
            code: resp.code,
            signal: resp.err.map(|e| e.signal()),
            err: resp.err.map(|e| e.to_string()),
            stdout: resp.stdout_lossy(),
            stderr: resp.stderr_lossy(),
        }
    }
}

/// Render a response as JSON.
pub fn format_json(resp: &Response, pretty: bool) -> serde_json::Result<String> {
    let view = ResponseView::from(resp);
    if pretty {
        serde_json::to_string_pretty(&view)
    } else {
        serde_json::to_string(&view)
    }
}

/// Render the four-field report, each line prefixed with `label` when given.
pub fn format_report(label: Option<&str>, resp: &Response) -> String {
    let prefix = label.map(|l| format!("{l:?} ")).unwrap_or_default();
    let err = resp
        .err
        .map(|e| e.to_string())
        .unwrap_or_else(|| "none".into());
    format!(
        "{prefix}Err:\t{err}\n{prefix}Code:\t{}\n{prefix}Stdout:\t{:?}\n{prefix}Stderr:\t{:?}\n",
        resp.code,
        resp.stdout_lossy(),
        resp.stderr_lossy(),
    )
}

/// Render an invocation error, prefixed with `label` when given.
pub fn format_invoke_error(label: Option<&str>, err: &InvokeError) -> String {
    let prefix = label.map(|l| format!("{l:?} ")).unwrap_or_default();
    format!("{prefix}invocation err:\t{err}\n")
}

/// Exit status mirroring the child: its code, or 128 + signal when signaled.
pub fn exit_status_for(resp: &Response) -> u8 {
    match resp.err {
        Some(term) => u8::try_from(128 + term.signal()).unwrap_or(u8::MAX),
        None => u8::try_from(resp.code).unwrap_or(1),
    }
}

/// Exit status reported when the child could not be run or reaped.
pub fn exit_status_for_error(err: &InvokeError) -> u8 {
    match err.kind() {
        runproc::ErrorKind::SpawnFailure => 127,
        _ => 125,
    }
}
