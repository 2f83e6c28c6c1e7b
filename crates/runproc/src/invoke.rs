// SPDX-License-Identifier: MIT OR Apache-2.0
//! The cancellation-aware invoke protocol.

use std::io;
use std::process::ExitStatus;
use tokio::process::Child;
use tracing::{debug, warn};

use crate::capture;
use crate::error::{InvokeError, SpawnCause};
use crate::outcome::WaitOutcome;
use crate::request::Request;
use crate::response::Response;
use runproc_cancel::CancelToken;

/// Spawn `request`, feed its input, capture its output, and wait for it.
///
/// If `cancel` has already fired, nothing is spawned. If it fires while the
/// process runs, the process is killed and the returned response reports the
/// signal. Feeding stdin, draining stdout and stderr, and waiting all progress
/// together on the calling task, so a child that fills a pipe cannot
/// deadlock the invocation.
pub async fn invoke(request: &Request, cancel: &CancelToken) -> Result<Response, InvokeError> {
    let path = request.path.display();

    if let Some(cause) = cancel.cause() {
        debug!(target: "runproc.invoke", %path, %cause, "not spawning");
        return Err(InvokeError::Spawn(SpawnCause::Cancelled(cause)));
    }

    let mut child = request
        .command()
        .and_then(|mut cmd| cmd.spawn())
        .map_err(|err| {
            debug!(target: "runproc.invoke", %path, error = %err, "spawn failed");
            InvokeError::Spawn(SpawnCause::Io(err))
        })?;

    debug!(target: "runproc.invoke", %path, pid = ?child.id(), "spawned");

    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (status, fed, out, err) = tokio::join!(
        wait_or_kill(&mut child, cancel),
        capture::feed(stdin, request.input_bytes()),
        capture::drain(stdout),
        capture::drain(stderr),
    );

    let response = match (WaitOutcome::classify(status), capture::settle(fed, out, err)) {
        (WaitOutcome::Failed(err), _) | (_, Err(err)) => {
            warn!(target: "runproc.invoke", %path, error = %err, "wait failed");
            return Err(InvokeError::Wait(err));
        }
        (WaitOutcome::Exited(code), Ok(captured)) => Response::exited(code, captured),
        (WaitOutcome::Signaled(signal), Ok(captured)) => Response::signaled(signal, captured),
    };

    debug!(
        target: "runproc.invoke",
        %path,
        code = response.code,
        signaled = response.is_signaled(),
        stdout_len = response.stdout.len(),
        stderr_len = response.stderr.len(),
        "finished"
    );
    Ok(response)
}

impl Request {
    /// Invoke this request; see [`invoke`].
    pub async fn run(&self, cancel: &CancelToken) -> Result<Response, InvokeError> {
        invoke(self, cancel).await
    }
}

/// Wait for `child`, killing it once if `cancel` fires first.
async fn wait_or_kill(child: &mut Child, cancel: &CancelToken) -> io::Result<ExitStatus> {
    tokio::select! {
        status = child.wait() => status,
        () = cancel.cancelled() => {
            debug!(target: "runproc.invoke", pid = ?child.id(), cause = ?cancel.cause(), "cancelled; killing child");
            if let Err(err) = child.start_kill() {
                warn!(target: "runproc.invoke", error = %err, "failed to deliver kill");
            }
            child.wait().await
        }
    }
}
