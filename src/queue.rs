//! Per-worker event queue: unbounded FIFO, blocking dequeue, synchronized enqueue.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use crate::error::QueueError;
use crate::Event;

struct Inner<E: Event> {
    events: VecDeque<E>,
    closed: bool,
}

/// A first-in-first-out queue of events belonging to exactly one worker.
///
/// `enqueue` is non-blocking and wakes any thread suspended in `dequeue`.
/// For a single producer, events appear to `dequeue` in the exact order
/// `enqueue` was called; concurrent producers are serialized by the
/// internal mutex, so each pair of calls has a well-defined happens-before
/// order (spec §4.1).
///
/// No priority, no coalescing: three enqueued `Timer` events yield three
/// dequeued `Timer` events.
pub struct EventQueue<E: Event> {
    state: Mutex<Inner<E>>,
    not_empty: Condvar,
}

impl<E: Event> EventQueue<E> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(Inner {
                events: VecDeque::new(),
                closed: false,
            }),
            not_empty: Condvar::new(),
        }
    }

    /// Appends `event` and wakes one blocked receiver, if any.
    ///
    /// Fails with [`QueueError::ShuttingDown`] iff the queue has already
    /// been closed (only happens during teardown).
    pub fn enqueue(&self, event: E) -> Result<(), QueueError> {
        let mut inner = self.state.lock().expect("event queue mutex poisoned");
        if inner.closed {
            return Err(QueueError::ShuttingDown);
        }
        inner.events.push_back(event);
        drop(inner);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Blocks until at least one event is available, then returns it.
    ///
    /// Fails with [`QueueError::ShuttingDown`] only when the queue has been
    /// closed and is empty — there is nothing left to wait for.
    pub fn dequeue(&self) -> Result<E, QueueError> {
        let mut inner = self.state.lock().expect("event queue mutex poisoned");
        loop {
            if let Some(event) = inner.events.pop_front() {
                return Ok(event);
            }
            if inner.closed {
                return Err(QueueError::ShuttingDown);
            }
            inner = self
                .not_empty
                .wait(inner)
                .expect("event queue condvar poisoned");
        }
    }

    /// Number of events currently queued. Non-blocking, racy by nature —
    /// for diagnostics only.
    pub fn len(&self) -> usize {
        self.state.lock().expect("event queue mutex poisoned").events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Marks the queue closed: further `enqueue` calls fail, and `dequeue`
    /// fails once the remaining backlog has drained. Called only during
    /// registry teardown.
    pub fn close(&self) {
        let mut inner = self.state.lock().expect("event queue mutex poisoned");
        inner.closed = true;
        drop(inner);
        self.not_empty.notify_all();
    }
}

impl<E: Event> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}
