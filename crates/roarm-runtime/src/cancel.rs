//! Cooperative cancellation.
//!
//! A [`CancelToken`] is a one-shot flag shared between the thread that
//! notices the operator's cancel key and the orchestrator polling it.  An
//! [`InterruptSource`] arms a token for the duration of one routine; the
//! returned [`WatchGuard`] disarms it on drop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::warn;

/// Shared one-shot cancellation flag.  Never reset; make a new one per
/// invocation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Something that can turn an operator action into a cancellation.
pub trait InterruptSource: Send + Sync {
    /// Cancel `token` when the operator asks to stop, until the returned
    /// guard is dropped.
    fn watch(&self, token: CancelToken) -> WatchGuard;
}

/// Keeps a watcher alive.  Dropping it stops the watcher and waits for its
/// thread, if it has one.
pub struct WatchGuard {
    done: CancelToken,
    handle: Option<JoinHandle<()>>,
}

impl WatchGuard {
    /// A guard for a watcher without a thread of its own.
    pub fn detached() -> Self {
        Self {
            done: CancelToken::new(),
            handle: None,
        }
    }

    /// A guard for a watcher thread.  The thread must return soon after
    /// `done` is cancelled.
    pub fn new(done: CancelToken, handle: JoinHandle<()>) -> Self {
        Self {
            done,
            handle: Some(handle),
        }
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        self.done.cancel();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!(target: "roarm::cancel", "interrupt watcher panicked");
        }
    }
}

/// An interrupt source that never fires.  Routines run until they finish on
/// their own.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInterrupt;

impl InterruptSource for NoInterrupt {
    fn watch(&self, _token: CancelToken) -> WatchGuard {
        WatchGuard::detached()
    }
}
