// SPDX-License-Identifier: MIT OR Apache-2.0
//! The normalized result of a process that was spawned.

use crate::capture::Captured;
use crate::error::SignalTermination;
use std::borrow::Cow;

/// Exit code reported for a process terminated by a signal.
pub const SIGNALED_EXIT_CODE: i32 = -1;

/// Outcome of a process that was successfully spawned.
///
/// `code` is either the process's own exit code, or [`SIGNALED_EXIT_CODE`]
/// paired with `err: Some(..)` when a signal ended it. Output buffers are
/// always present, empty when the process wrote nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Everything the process wrote to standard output.
    pub stdout: Vec<u8>,
    /// Everything the process wrote to standard error.
    pub stderr: Vec<u8>,
    /// Exit code, or [`SIGNALED_EXIT_CODE`].
    pub code: i32,
    /// Set only when the process was terminated by a signal.
    pub err: Option<SignalTermination>,
}

impl Response {
    pub(crate) fn exited(code: i32, captured: Captured) -> Self {
        Self {
            stdout: captured.stdout,
            stderr: captured.stderr,
            code,
            err: None,
        }
    }

    pub(crate) fn signaled(signal: SignalTermination, captured: Captured) -> Self {
        Self {
            stdout: captured.stdout,
            stderr: captured.stderr,
            code: SIGNALED_EXIT_CODE,
            err: Some(signal),
        }
    }

    /// Returns `true` for a clean exit with code 0.
    pub fn success(&self) -> bool {
        self.code == 0 && self.err.is_none()
    }

    /// Returns `true` if the process was terminated by a signal.
    pub fn is_signaled(&self) -> bool {
        self.err.is_some()
    }

    /// Standard output decoded as UTF-8, replacing invalid sequences.
    pub fn stdout_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    /// Standard error decoded as UTF-8, replacing invalid sequences.
    pub fn stderr_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured(stdout: &[u8], stderr: &[u8]) -> Captured {
        Captured {
            stdout: stdout.to_vec(),
            stderr: stderr.to_vec(),
        }
    }

    #[test]
    fn exited_keeps_code_and_output() {
        let resp = Response::exited(13, captured(b"out", b"err"));
        assert_eq!(resp.code, 13);
        assert!(resp.err.is_none());
        assert!(!resp.success());
        assert!(!resp.is_signaled());
        assert_eq!(resp.stdout_lossy(), "out");
        assert_eq!(resp.stderr_lossy(), "err");
    }

    #[test]
    fn zero_exit_is_success() {
        let resp = Response::exited(0, captured(b"", b""));
        assert!(resp.success());
        assert!(resp.stdout.is_empty());
        assert!(resp.stderr.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn signaled_uses_sentinel_code() {
        use std::os::unix::process::ExitStatusExt;
        use std::process::ExitStatus;

        let term = SignalTermination::from_status(ExitStatus::from_raw(15)).expect("signaled");
        let resp = Response::signaled(term, captured(b"", b""));
        assert_eq!(resp.code, SIGNALED_EXIT_CODE);
        assert!(resp.is_signaled());
        assert!(!resp.success());
        assert_eq!(resp.err.map(|e| e.signal()), Some(15));
    }

    #[test]
    fn lossy_decoding_replaces_invalid_utf8() {
        let resp = Response::exited(0, captured(&[0x66, 0xff, 0x6f], b""));
        assert_eq!(resp.stdout_lossy(), "f\u{fffd}o");
    }
}
