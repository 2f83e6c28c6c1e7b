// SPDX-License-Identifier: MIT OR Apache-2.0
//! runproc
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Spawn a child process, feed it optional stdin, capture stdout and stderr in
//! full, and normalize how it ended.
//!
//! [`invoke`] returns exactly one of:
//!
//! * `Err(InvokeError::Spawn(..))` when the process never ran,
//! * `Ok(Response)` with `err: None` and the real exit code when the process
//!   exited on its own (a non-zero code is data, not a failure),
//! * `Ok(Response)` with `code == -1` and `err: Some(SignalTermination)` when
//!   the process was killed by a signal, including the kill delivered when the
//!   [`CancelToken`] fires,
//! * `Err(InvokeError::Wait(..))` when the process ran but its status or
//!   output could not be collected.

pub mod capture;
pub mod error;
pub mod invoke;
pub mod outcome;
pub mod request;
pub mod response;

pub use error::{ErrorKind, InvokeError, SignalTermination, SpawnCause};
pub use invoke::invoke;
pub use outcome::WaitOutcome;
pub use request::{Input, Request};
pub use response::{Response, SIGNALED_EXIT_CODE};
pub use runproc_cancel::{CancelCause, CancelToken};
