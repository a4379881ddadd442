//! Workers: one thread owning one FSM instance and one event queue, plus the
//! `WorkerHandle` capability actions and guards use to reach back into the
//! runtime (broadcast, timers, self-exit).

use std::any::Any;
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::thread::JoinHandle;

use crate::error::QueueError;
use crate::instance::FsmInstance;
use crate::queue::EventQueue;
use crate::registry::RuntimeInner;
use crate::table::FsmTable;
use crate::Event;

thread_local! {
    /// Lets `Runtime::self_handle()` find "the handle belonging to whichever
    /// worker thread is calling" without threading an explicit parameter
    /// through arbitrary helper functions (spec §4.4 `self_handle()`).
    static CURRENT_HANDLE: RefCell<Option<Arc<dyn Any + Send + Sync>>> = RefCell::new(None);
}

/// The capability an entry/exit action or guard is given: broadcast into
/// every worker's queue, arm/toggle timers, or request this worker's own
/// exit. Cheap to clone (every field is an `Arc`/`Weak` or a name).
pub struct WorkerHandle<E: Event> {
    pub(crate) name: Arc<str>,
    pub(crate) id: u64,
    pub(crate) runtime: Weak<RuntimeInner<E>>,
    pub(crate) exit_requested: Arc<AtomicBool>,
}

impl<E: Event> Clone for WorkerHandle<E> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            id: self.id,
            runtime: self.runtime.clone(),
            exit_requested: Arc::clone(&self.exit_requested),
        }
    }
}

impl<E: Event> WorkerHandle<E> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Enqueues `event` into every worker's queue, including this worker's
    /// own (spec §4.4 self-delivery). Non-fatal if the runtime has already
    /// been torn down: the broadcast is silently dropped (spec §7 "shutdown
    /// races").
    pub fn broadcast(&self, event: E) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.broadcast(event);
        } else {
            log::debug!("broadcast({event:?}) dropped: runtime already torn down");
        }
    }

    /// Arms/disarms/reschedules timer `id` (spec §4.3 `set_timer`).
    pub fn set_timer(&self, id: u32, period_ms: u64) {
        if let Some(runtime) = self.runtime.upgrade() {
            if let Err(e) = runtime.timers.set_timer(id, period_ms) {
                log::warn!("set_timer({id}, {period_ms}) failed: {e}");
            }
        }
    }

    /// Toggles timer `id` between armed and disarmed (spec §4.3 `toggle_timer`).
    pub fn toggle_timer(&self, id: u32) {
        if let Some(runtime) = self.runtime.upgrade() {
            if let Err(e) = runtime.timers.toggle_timer(id) {
                log::warn!("toggle_timer({id}) failed: {e}");
            }
        }
    }

    /// Milliseconds remaining before timer `id` next fires, or 0 if disarmed
    /// or unknown (spec §4.3 `get_timer`).
    pub fn timer_remaining_ms(&self, id: u32) -> u64 {
        self.runtime
            .upgrade()
            .and_then(|runtime| runtime.timers.get_remaining(id).ok())
            .unwrap_or(0)
    }

    /// Current configured period for timer `id`, or 0 if unknown
    /// (spec §4.3 `get_period`).
    pub fn timer_period_ms(&self, id: u32) -> u64 {
        self.runtime
            .upgrade()
            .and_then(|runtime| runtime.timers.get_period(id).ok())
            .unwrap_or(0)
    }

    /// Requests that this worker's loop end after the current action
    /// returns (spec §4.2 "Termination"). Idempotent.
    pub fn exit_worker(&self) {
        self.exit_requested.store(true, Ordering::Release);
    }
}

/// Returns the [`WorkerHandle`] belonging to the calling thread, if it is a
/// worker thread (spec §4.4 `self_handle()`).
pub(crate) fn current_handle<E: Event>() -> Option<WorkerHandle<E>> {
    CURRENT_HANDLE.with(|cell| {
        cell.borrow()
            .as_ref()
            .and_then(|any| any.downcast_ref::<WorkerHandle<E>>())
            .cloned()
    })
}

pub(crate) struct WorkerEntry<E: Event> {
    pub(crate) name: Arc<str>,
    pub(crate) id: u64,
    pub(crate) queue: Arc<EventQueue<E>>,
    pub(crate) current_state: Arc<Mutex<&'static str>>,
    pub(crate) exit_requested: Arc<AtomicBool>,
    pub(crate) join: Mutex<Option<JoinHandle<()>>>,
}

/// Spawns the worker thread for one FSM instance. Runs spec §4.5's loop:
/// entry-action of the initial state, then `dequeue -> step` forever until
/// the queue closes or an action calls `exit_worker()`.
pub(crate) fn spawn<C, E>(
    runtime: Weak<RuntimeInner<E>>,
    name: Arc<str>,
    id: u64,
    table: Arc<FsmTable<C, E>>,
    mut ctx: C,
    queue: Arc<EventQueue<E>>,
    current_state: Arc<Mutex<&'static str>>,
    exit_requested: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>>
where
    C: Send + 'static,
    E: Event,
{
    std::thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let handle = WorkerHandle {
                name: Arc::clone(&name),
                id,
                runtime,
                exit_requested: Arc::clone(&exit_requested),
            };
            CURRENT_HANDLE.with(|cell| {
                *cell.borrow_mut() = Some(Arc::new(handle.clone()) as Arc<dyn Any + Send + Sync>);
            });

            let mut instance = FsmInstance::new(table);
            log::info!("[{name}] starting in state {:?}", instance.current_state_name());
            instance.init(&mut ctx, &handle);
            *current_state.lock().expect("current_state mutex poisoned") =
                instance.current_state_name();

            loop {
                if exit_requested.load(Ordering::Acquire) {
                    log::info!("[{name}] exit_worker() requested, stopping");
                    break;
                }
                match queue.dequeue() {
                    Ok(event) => {
                        let outcome = instance.step(&mut ctx, event, &handle);
                        *current_state.lock().expect("current_state mutex poisoned") =
                            instance.current_state_name();
                        log::trace!(
                            "[{name}] evt={event:?} -> {outcome:?} (state={:?})",
                            instance.current_state_name()
                        );
                        if exit_requested.load(Ordering::Acquire) {
                            log::info!("[{name}] exit_worker() requested, stopping");
                            break;
                        }
                    }
                    Err(QueueError::ShuttingDown) => {
                        log::info!("[{name}] queue closed, stopping");
                        break;
                    }
                    Err(other) => {
                        log::warn!("[{name}] dequeue error: {other}");
                        break;
                    }
                }
            }
            log::info!("[{name}] joined");
        })
}
