//! Error taxonomy (spec §7): recoverable conditions are reported, never
//! unwound; unrecoverable ones terminate the offending thread (or, during
//! setup, the process) after logging.

use thiserror::Error;

/// Failures from [`crate::queue::EventQueue`] operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The queue has been closed; enqueue/dequeue can no longer proceed.
    #[error("queue is shutting down")]
    ShuttingDown,
    /// Enqueue failed under resource exhaustion. The enclosing broadcast
    /// treats this as non-fatal for the other queues.
    #[error("queue out of capacity")]
    OutOfCapacity,
}

/// Failures from [`crate::timer::TimerService`] operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// `create_timer` was called with an `id` already present.
    #[error("timer {0} already exists")]
    Duplicate(u32),
    /// An operation referenced a timer id that was never created.
    #[error("timer {0} not found")]
    NotFound(u32),
    /// The OS refused to arm a deadline for this timer. Fatal for that
    /// timer only; other timers continue (spec §7).
    #[error("timer {0} failed to arm: {1}")]
    ArmFailed(u32, String),
}

/// Failures from [`crate::runtime::Runtime`] lifecycle operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A worker with this name is already registered.
    #[error("worker {0:?} already registered")]
    DuplicateWorker(String),
    /// `register` was called after the registry has started broadcasting.
    #[error("registry is sealed; no workers may be registered after setup")]
    Sealed,
    /// A worker thread panicked; its join handle returned an error.
    #[error("worker {0:?} panicked during shutdown")]
    WorkerPanicked(String),
}

/// Fatal failures that can occur only during setup, before any FSM runs.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to spawn worker thread: {0}")]
    ThreadSpawn(String),
    #[error("failed to start timer service: {0}")]
    TimerServiceStart(String),
    #[error("invalid argument: {0}")]
    BadArgument(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
