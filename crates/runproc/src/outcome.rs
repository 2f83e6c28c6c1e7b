// SPDX-License-Identifier: MIT OR Apache-2.0
//! Classification of a finished wait into a tagged outcome.

use crate::error::SignalTermination;
use crate::response::SIGNALED_EXIT_CODE;
use std::io;
use std::process::ExitStatus;

/// How a wait on a spawned process ended.
#[derive(Debug)]
pub enum WaitOutcome {
    /// The process exited on its own with this code.
    Exited(i32),
    /// The process was terminated by a signal.
    Signaled(SignalTermination),
    /// The wait itself failed, or reported a status that is neither an exit
    /// code nor a signal.
    Failed(io::Error),
}

impl WaitOutcome {
    /// Classify the result of waiting on a child process.
    ///
    /// A reported exit code equal to [`SIGNALED_EXIT_CODE`] can only come from
    /// a platform that does not follow unix wait semantics; it is treated as
    /// [`WaitOutcome::Failed`] so that `-1` in a response always means a signal.
    pub fn classify(result: io::Result<ExitStatus>) -> Self {
        let status = match result {
            Ok(status) => status,
            Err(err) => return Self::Failed(err),
        };

        match status.code() {
            Some(SIGNALED_EXIT_CODE) => Self::Failed(io::Error::other(format!(
                "{status} collides with the signaled sentinel"
            ))),
            Some(code) => Self::Exited(code),
            None => match SignalTermination::from_status(status) {
                Some(signal) => Self::Signaled(signal),
                None => Self::Failed(io::Error::other(format!(
                    "{status} reports neither an exit code nor a signal"
                ))),
            },
        }
    }
}
