//! The worker registry: the process-wide (but explicit, not global — see
//! spec §9) ordered collection of workers that makes broadcast and
//! lifecycle operations possible.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::error::RegistryError;
use crate::table::FsmTable;
use crate::timer::TimerService;
use crate::worker::{self, WorkerEntry, WorkerHandle};
use crate::Event;

/// A point-in-time snapshot of one worker's identity and current state,
/// for diagnostics (spec §4.4 `show()`, §6 `s`/`w` commands).
#[derive(Debug, Clone)]
pub struct WorkerSnapshot {
    pub name: String,
    pub current_state: &'static str,
}

/// Debug-flag bits recognized by spec §6's `-d <hex>` argument. Callers
/// toggle these on a live [`crate::Runtime`] to cheaply enable/disable
/// trace categories independent of the `log` crate's own level filter.
pub mod debug_flags {
    pub const TRANSITIONS: u32 = 0x01;
    pub const EVENTS: u32 = 0x02;
    pub const TIMERS: u32 = 0x04;
    pub const WORKER_LIFECYCLE: u32 = 0x10;
    pub const VERBOSE: u32 = 0x20;
}

/// The runtime's shared, reference-counted interior. Never exposed
/// directly — callers interact through [`crate::Runtime`], which wraps an
/// `Arc<RuntimeInner<E>>`.
pub struct RuntimeInner<E: Event> {
    pub(crate) workers: Mutex<Vec<WorkerEntry<E>>>,
    pub(crate) sealed: AtomicBool,
    pub(crate) timers: TimerService<E>,
    pub(crate) debug_flags: AtomicU32,
}

impl<E: Event> RuntimeInner<E> {
    /// Enqueues `event` into every worker's queue, in registry (insertion)
    /// order. Not atomic across queues (spec §4.4 "Broadcast ordering"): a
    /// per-queue enqueue failure is logged and does not stop the others.
    pub(crate) fn broadcast(&self, event: E) {
        if self.debug_flags.load(Ordering::Relaxed) & debug_flags::EVENTS != 0 {
            log::debug!("broadcast {event:?}");
        }
        let workers = self.workers.lock().expect("registry mutex poisoned");
        for worker in workers.iter() {
            if let Err(e) = worker.queue.enqueue(event) {
                log::warn!("broadcast {event:?} to {:?} failed: {e}", worker.name);
            }
        }
    }

    pub(crate) fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    pub(crate) fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    pub(crate) fn find_by_name(&self, name: &str) -> Option<WorkerSnapshot> {
        let workers = self.workers.lock().expect("registry mutex poisoned");
        workers.iter().find(|w| &*w.name == name).map(|w| WorkerSnapshot {
            name: w.name.to_string(),
            current_state: *w.current_state.lock().expect("state mutex poisoned"),
        })
    }

    pub(crate) fn show(&self) -> Vec<WorkerSnapshot> {
        let workers = self.workers.lock().expect("registry mutex poisoned");
        workers
            .iter()
            .map(|w| WorkerSnapshot {
                name: w.name.to_string(),
                current_state: *w.current_state.lock().expect("state mutex poisoned"),
            })
            .collect()
    }

    /// Joins every worker thread. Must be called exactly once during
    /// shutdown, after at least one `broadcast(Done)` has been issued
    /// (spec §4.4 `join_all()`).
    pub(crate) fn join_all(&self) -> Result<(), RegistryError> {
        let mut workers = self.workers.lock().expect("registry mutex poisoned");
        let mut first_err = None;
        for worker in workers.iter_mut() {
            worker.queue.close();
            let handle = worker
                .join
                .lock()
                .expect("join mutex poisoned")
                .take();
            if let Some(handle) = handle {
                if handle.join().is_err() {
                    log::error!("worker {:?} panicked", worker.name);
                    if first_err.is_none() {
                        first_err = Some(RegistryError::WorkerPanicked(worker.name.to_string()));
                    }
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub(crate) fn register<C>(
        &self,
        weak_self: Weak<Self>,
        name: &str,
        table: Arc<FsmTable<C, E>>,
        ctx: C,
    ) -> Result<(), RegistryError>
    where
        C: Send + 'static,
    {
        if self.is_sealed() {
            return Err(RegistryError::Sealed);
        }
        let mut workers = self.workers.lock().expect("registry mutex poisoned");
        if workers.iter().any(|w| &*w.name == name) {
            return Err(RegistryError::DuplicateWorker(name.to_string()));
        }

        let name: Arc<str> = Arc::from(name);
        let id = workers.len() as u64;
        let queue = Arc::new(crate::queue::EventQueue::new());
        let current_state = Arc::new(Mutex::new(table.state_name(table.initial_state())));
        let exit_requested = Arc::new(AtomicBool::new(false));

        let join = worker::spawn(
            weak_self,
            Arc::clone(&name),
            id,
            table,
            ctx,
            Arc::clone(&queue),
            Arc::clone(&current_state),
            Arc::clone(&exit_requested),
        )
        .map_err(|e| RegistryError::WorkerPanicked(format!("spawn failed: {e}")))?;

        workers.push(WorkerEntry {
            name,
            id,
            queue,
            current_state,
            exit_requested,
            join: Mutex::new(Some(join)),
        });
        Ok(())
    }
}

/// A handle to the calling thread's own worker, if any is found (spec §4.4
/// `self_handle()`).
pub fn self_handle<E: Event>() -> Option<WorkerHandle<E>> {
    worker::current_handle::<E>()
}
