// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cooperative cancellation token shared between a caller and an invocation.
//!
//! A [`CancelToken`] fires either when [`CancelToken::cancel`] is called on any
//! clone, or when its optional deadline passes. Waiting on it never spawns a
//! background task.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::fmt;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Why a [`CancelToken`] fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelCause {
    /// [`CancelToken::cancel`] was called.
    Cancelled,
    /// The token's deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for CancelCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("invocation cancelled"),
            Self::DeadlineExceeded => f.write_str("invocation deadline exceeded"),
        }
    }
}

/// Cloneable cancellation signal with an optional deadline.
///
/// Clones share the cancelled flag; calling [`cancel`](CancelToken::cancel)
/// on any clone wakes every waiter.
#[derive(Clone, Debug)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// Create a new, non-cancelled token without a deadline.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
            deadline: None,
        }
    }

    /// Create a token that fires at `deadline` unless cancelled sooner.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::new()
        }
    }

    /// Create a token that fires `timeout` from now unless cancelled sooner.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Derive a token sharing this token's cancelled flag whose deadline is at
    /// most `timeout` from now.
    ///
    /// An earlier deadline already set on `self` is kept.
    pub fn limited_to(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing <= candidate => existing,
            _ => candidate,
        };
        Self {
            cancelled: Arc::clone(&self.cancelled),
            notify: Arc::clone(&self.notify),
            deadline: Some(deadline),
        }
    }

    /// The deadline of this token, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Signal cancellation to all waiters.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Returns `true` if cancellation has been signalled or the deadline passed.
    pub fn is_cancelled(&self) -> bool {
        self.cause().is_some()
    }

    /// Why the token fired, or `None` while it is still live.
    pub fn cause(&self) -> Option<CancelCause> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Some(CancelCause::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelCause::DeadlineExceeded),
            _ => None,
        }
    }

    /// Wait until the token fires (returns immediately if it already has).
    pub async fn cancelled(&self) {
        // Register interest before checking the flag so a concurrent
        // `cancel` cannot slip between the check and the await.
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if self.cancelled.load(Ordering::SeqCst) {
            return;
        }

        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = notified => {}
                    () = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => notified.await,
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
