//! `Runtime`: the single explicit value tying the worker registry, the
//! timer service, and the shutdown coordinator together (spec §9: "forbid
//! any hidden globals").

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{RegistryError, TimerError};
use crate::registry::{self, RuntimeInner, WorkerSnapshot};
use crate::table::FsmTable;
use crate::timer::TimerService;
use crate::worker::WorkerHandle;
use crate::Event;

/// The runtime: one per process (or per test). Construct it in `main`
/// (or in a test), register every FSM worker against it, then drive it
/// through the lifecycle described in spec §4.4/§4.5.
///
/// Cloning a `Runtime` is cheap (it's a handle around an `Arc`); every
/// clone refers to the same registry, timers, and workers.
pub struct Runtime<E: Event> {
    inner: Arc<RuntimeInner<E>>,
}

impl<E: Event> Clone for Runtime<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Event> Runtime<E> {
    /// Builds a fresh runtime: an empty worker registry and a running
    /// timer-service thread, both owned by this value — no process-wide
    /// globals are created.
    pub fn new() -> Self {
        let inner = Arc::new_cyclic(|weak| RuntimeInner {
            workers: Mutex::new(Vec::new()),
            sealed: AtomicBool::new(false),
            timers: TimerService::spawn(weak.clone()),
            debug_flags: AtomicU32::new(0),
        });
        Self { inner }
    }

    /// Sets the spec §6 `-d <hex>` debug-flags bitmask (see
    /// [`crate::registry::debug_flags`]).
    pub fn set_debug_flags(&self, flags: u32) {
        self.inner.debug_flags.store(flags, Ordering::Relaxed);
    }

    pub fn debug_flags(&self) -> u32 {
        self.inner.debug_flags.load(Ordering::Relaxed)
    }

    /// Spawns a worker thread running `table` starting from `ctx`, and adds
    /// it to the registry in insertion order (spec §4.4 `register`). Fails
    /// if a worker with this name already exists, or if the registry has
    /// already been sealed by an earlier `broadcast` (spec §3: "List may
    /// only be mutated during setup, before any broadcast may occur").
    pub fn register<C>(
        &self,
        name: &str,
        table: Arc<FsmTable<C, E>>,
        ctx: C,
    ) -> Result<(), RegistryError>
    where
        C: Send + 'static,
    {
        self.inner
            .register(Arc::downgrade(&self.inner), name, table, ctx)
    }

    /// Enqueues `event` into every worker's queue in registry order. Seals
    /// the registry against further `register` calls (spec §3/§4.4).
    pub fn broadcast(&self, event: E) {
        self.inner.seal();
        self.inner.broadcast(event);
    }

    pub fn find_by_name(&self, name: &str) -> Option<WorkerSnapshot> {
        self.inner.find_by_name(name)
    }

    /// Returns the handle belonging to the calling thread's own worker, if
    /// the caller is running on a worker thread (spec §4.4 `self_handle()`).
    pub fn self_handle(&self) -> Option<WorkerHandle<E>> {
        registry::self_handle::<E>()
    }

    /// A diagnostic snapshot of every worker's name and current state
    /// (spec §4.4 `show()`).
    pub fn show(&self) -> Vec<WorkerSnapshot> {
        self.inner.show()
    }

    /// Joins every worker thread. Must be called exactly once, after at
    /// least one `broadcast(Done)` (spec §4.4 `join_all()`). Does not stop
    /// the timer service — call [`Runtime::shutdown`] for the full
    /// teardown sequence.
    pub fn join_all(&self) -> Result<(), RegistryError> {
        self.inner.join_all()
    }

    /// Registers a new timer; fails with [`TimerError::Duplicate`] if `id`
    /// is already present (spec §4.3 `create_timer`).
    pub fn create_timer(&self, id: u32, event_on_expiry: E) -> Result<(), TimerError> {
        self.inner.timers.create_timer(id, event_on_expiry)
    }

    pub fn set_timer(&self, id: u32, period_ms: u64) -> Result<(), TimerError> {
        self.inner.timers.set_timer(id, period_ms)
    }

    pub fn toggle_timer(&self, id: u32) -> Result<(), TimerError> {
        self.inner.timers.toggle_timer(id)
    }

    pub fn get_timer(&self, id: u32) -> Result<u64, TimerError> {
        self.inner.timers.get_remaining(id)
    }

    pub fn get_period(&self, id: u32) -> Result<u64, TimerError> {
        self.inner.timers.get_period(id)
    }

    /// The full shutdown coordinator (spec §2 item 10): broadcasts `Done`,
    /// joins every worker, then stops the timer service. After this
    /// returns, no worker thread remains alive and no timer continues to
    /// fire (spec invariant 6).
    pub fn shutdown(&self, done: E) -> Result<(), RegistryError> {
        self.broadcast(done);
        let result = self.join_all();
        self.inner.timers.shutdown();
        result
    }

    /// Builds a [`WorkerHandle`] not attached to any registered worker, for
    /// use in unit tests that exercise guards/actions directly without
    /// spinning up a full worker thread.
    #[doc(hidden)]
    pub fn test_handle(&self) -> WorkerHandle<E> {
        WorkerHandle {
            name: Arc::from("test"),
            id: u64::MAX,
            runtime: Arc::downgrade(&self.inner),
            exit_requested: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl<E: Event> Default for Runtime<E> {
    fn default() -> Self {
        Self::new()
    }
}
