// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for process invocation.

use runproc_cancel::CancelCause;
use std::fmt;
use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// The three mutually exclusive ways an invocation can go wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The process could not be created or started.
    SpawnFailure,
    /// The process ran and was terminated by a signal.
    SignalTermination,
    /// The process ran but its status or output could not be collected.
    WaitFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SpawnFailure => "spawn_failure",
            Self::SignalTermination => "signal_termination",
            Self::WaitFailure => "wait_failure",
        };
        f.write_str(s)
    }
}

/// Why a process could not be spawned.
#[derive(Debug, Error)]
pub enum SpawnCause {
    /// The operating system refused to create the process.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The cancellation token fired before the process was started.
    #[error("{0}")]
    Cancelled(CancelCause),
}

/// Errors returned instead of a [`Response`](crate::Response).
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The process never ran.
    #[error("cannot spawn process: {0}")]
    Spawn(#[source] SpawnCause),

    /// The process ran but its termination status or output could not be
    /// collected.
    #[error("cannot wait for process to terminate: {0}")]
    Wait(#[source] io::Error),
}

impl InvokeError {
    /// The kind of failure, for branching without string matching.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Spawn(_) => ErrorKind::SpawnFailure,
            Self::Wait(_) => ErrorKind::WaitFailure,
        }
    }

    /// Returns `true` if spawning was skipped because the token had fired.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_cause().is_some()
    }

    /// The cancellation cause, when spawning was skipped because of it.
    pub fn cancel_cause(&self) -> Option<CancelCause> {
        match self {
            Self::Spawn(SpawnCause::Cancelled(cause)) => Some(*cause),
            _ => None,
        }
    }

    /// The underlying operating-system error, if there is one.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::Spawn(SpawnCause::Io(err)) | Self::Wait(err) => Some(err),
            Self::Spawn(SpawnCause::Cancelled(_)) => None,
        }
    }
}

/// A process was terminated by a signal.
///
/// Carried inside a [`Response`](crate::Response) whose `code` is
/// [`SIGNALED_EXIT_CODE`](crate::SIGNALED_EXIT_CODE). Displays the status the
/// operating system reported, e.g. `signal: 9 (SIGKILL)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{status}")]
pub struct SignalTermination {
    status: ExitStatus,
    signal: i32,
}

impl SignalTermination {
    /// Build from a wait status, or `None` if the status does not report a
    /// terminating signal.
    #[cfg(unix)]
    pub fn from_status(status: ExitStatus) -> Option<Self> {
        use std::os::unix::process::ExitStatusExt;
        status.signal().map(|signal| Self { status, signal })
    }

    /// Build from a wait status; signals are never reported on this platform.
    #[cfg(not(unix))]
    pub fn from_status(_status: ExitStatus) -> Option<Self> {
        None
    }

    /// The number of the signal that terminated the process.
    pub fn signal(&self) -> i32 {
        self.signal
    }

    /// The raw status reported by the operating system.
    pub fn status(&self) -> ExitStatus {
        self.status
    }

    /// Returns `true` if the process dumped core when it was terminated.
    #[cfg(unix)]
    pub fn core_dumped(&self) -> bool {
        use std::os::unix::process::ExitStatusExt;
        self.status.core_dumped()
    }

    /// Always [`ErrorKind::SignalTermination`].
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::SignalTermination
    }
}
