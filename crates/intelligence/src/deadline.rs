//! Deadline-bounded calls to external collaborators
//!
//! Each call runs on its own named worker thread and the caller waits on a
//! channel with `recv_timeout`. The deadline is measured from the moment
//! the call is spawned, so work done on the calling thread in the meantime
//! (lexical search while the vector call is in flight) counts against it.
//!
//! A call that misses its deadline is abandoned, not cancelled: the worker
//! runs to completion in the background and its result is dropped. A
//! [`CallLane`] caps how many workers one stage may have alive at once, so
//! a hung collaborator costs at most `limit` threads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Why a deadline-bounded call produced no value
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    /// The worker did not answer within its deadline
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// The worker exited without answering (panicked)
    #[error("worker thread exited without a result")]
    WorkerLost,
    /// The worker thread could not be started
    #[error("failed to spawn worker thread: {0}")]
    Spawn(String),
    /// The stage already has its maximum number of live workers
    #[error("{0} calls already in flight")]
    Saturated(usize),
}

/// A call running on a worker thread
#[derive(Debug)]
pub struct PendingCall<T> {
    rx: mpsc::Receiver<T>,
    started: Instant,
    timeout: Duration,
}

impl<T> PendingCall<T> {
    /// Block until the call answers or its deadline passes
    pub fn wait(self) -> Result<T, CallError> {
        let remaining = self.timeout.saturating_sub(self.started.elapsed());
        match self.rx.recv_timeout(remaining) {
            Ok(value) => Ok(value),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(CallError::Timeout(self.timeout)),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(CallError::WorkerLost),
        }
    }

    /// Time since the call was spawned
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Start `work` on a named worker thread with the given deadline
pub fn spawn_call<T, F>(name: &str, timeout: Duration, work: F) -> Result<PendingCall<T>, CallError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(1);
    let started = Instant::now();
    thread::Builder::new()
        .name(format!("retrieval-{}", name))
        .spawn(move || {
            // Receiver may be gone after a timeout; nothing to do then.
            let _ = tx.send(work());
        })
        .map_err(|e| CallError::Spawn(e.to_string()))?;

    Ok(PendingCall {
        rx,
        started,
        timeout,
    })
}

/// Run `work` on a worker thread and wait for it with a deadline
pub fn call_with_deadline<T, F>(name: &str, timeout: Duration, work: F) -> Result<T, CallError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    spawn_call(name, timeout, work)?.wait()
}

// ============================================================================
// CallLane
// ============================================================================

/// Bounded set of workers for one stage
///
/// Clones share the same counter. A worker holds its slot until its
/// closure returns or panics, including after its caller has timed out.
#[derive(Debug, Clone)]
pub struct CallLane {
    name: &'static str,
    limit: usize,
    in_flight: Arc<AtomicUsize>,
}

/// One occupied slot; released on drop
struct LaneSlot(Arc<AtomicUsize>);

impl Drop for LaneSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl CallLane {
    /// Lane named `name` allowing `limit` live workers (minimum 1)
    pub fn new(name: &'static str, limit: usize) -> Self {
        CallLane {
            name,
            limit: limit.max(1),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Lane name, also the worker thread suffix
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Maximum live workers
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Workers currently alive, abandoned ones included
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    fn try_acquire(&self) -> Option<LaneSlot> {
        self.in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.limit).then_some(n + 1)
            })
            .ok()
            .map(|_| LaneSlot(Arc::clone(&self.in_flight)))
    }

    /// Start `work` if a slot is free, otherwise fail with `Saturated`
    pub fn spawn<T, F>(&self, timeout: Duration, work: F) -> Result<PendingCall<T>, CallError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let slot = self.try_acquire().ok_or(CallError::Saturated(self.limit))?;
        spawn_call(self.name, timeout, move || {
            let _slot = slot;
            work()
        })
    }

    /// `spawn` then wait for the deadline
    pub fn call<T, F>(&self, timeout: Duration, work: F) -> Result<T, CallError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        self.spawn(timeout, work)?.wait()
    }
}
