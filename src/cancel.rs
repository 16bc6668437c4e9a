//! Cooperative cancellation: a single shared stop signal every suspension
//! point in the engine races against (§4.7, §5).

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::Duration;

struct Inner {
    stopped: Mutex<bool>,
    condvar: Condvar,
}

/// A cloneable, thread-safe stop signal.
///
/// This is the Rust-native replacement for the original `asyncio.Event`
/// used as the trace-wide cancellation root: any wait that could outlive
/// `stop` (socket receive, sleep-based polling) is expressed as a
/// `wait_timeout` on this handle so a `set()` wakes it immediately rather
/// than after the next poll tick.
#[derive(Clone)]
pub struct StopHandle(Arc<Inner>);

impl StopHandle {
    /// Create a new, unset stop handle.
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(Inner {
            stopped: Mutex::new(false),
            condvar: Condvar::new(),
        }))
    }

    /// Signal stop. Idempotent; wakes every thread blocked in
    /// `wait_timeout`.
    pub fn set(&self) {
        let mut stopped = self.0.stopped.lock();
        *stopped = true;
        self.0.condvar.notify_all();
    }

    /// Whether stop has been signaled.
    #[must_use]
    pub fn is_set(&self) -> bool {
        *self.0.stopped.lock()
    }

    /// Block for up to `timeout`, returning early (with `true`) as soon
    /// as `set()` is called elsewhere. Returns `false` if the timeout
    /// elapsed without a stop signal.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut stopped = self.0.stopped.lock();
        if *stopped {
            return true;
        }
        let result = self.0.condvar.wait_for(&mut stopped, timeout);
        *stopped || !result.timed_out()
    }
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of [`race_poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceOutcome<T> {
    /// `step` produced a value before `stop` was signaled.
    Completed(T),
    /// `stop` was signaled before `step` produced a value.
    Cancelled,
}

/// Race a non-blocking "try once" closure against a stop signal.
///
/// Calls `step()` repeatedly; between calls it waits on `stop` for up to
/// `poll_interval`, which doubles as the race: a `set()` elsewhere wakes
/// the wait immediately regardless of `poll_interval`; only a genuine
/// timeout triggers the next `step()`. This is the structured-concurrency
/// primitive §4.7/§9 call for, built on `parking_lot`'s condvar rather
/// than a second runtime task.
pub fn race_poll<T>(
    stop: &StopHandle,
    poll_interval: Duration,
    mut step: impl FnMut() -> Option<T>,
) -> RaceOutcome<T> {
    loop {
        if let Some(value) = step() {
            return RaceOutcome::Completed(value);
        }
        if stop.wait_timeout(poll_interval) {
            return RaceOutcome::Cancelled;
        }
    }
}
