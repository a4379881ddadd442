//! The timer service: one background thread multiplexing every armed
//! timer's deadline and turning expiries into broadcast events (spec §4.3).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, Weak};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::error::TimerError;
use crate::registry::RuntimeInner;
use crate::Event;

/// The multiplexed wait's bound (spec §4.3 "Multiplexing design"): the
/// service wakes at least this often even with no timer due, so shutdown
/// is never more than this far away.
const MAX_WAIT: Duration = Duration::from_millis(200);

struct TimerRecord<E> {
    event: E,
    period_ms: u64,
    previous_period_ms: u64,
    next_deadline: Option<Instant>,
    /// Insertion order, used to break ties deterministically when several
    /// timers expire in the same wake (spec §4.3 "order of OS-reported
    /// readiness").
    order: u64,
}

struct Table<E> {
    timers: HashMap<u32, TimerRecord<E>>,
    next_order: u64,
}

struct TimerCore<E> {
    table: Mutex<Table<E>>,
    wake: Condvar,
    shutdown: AtomicBool,
}

/// One OS-timer-multiplexing thread serving every timer created through
/// [`crate::Runtime::create_timer`]. On each expiry it broadcasts
/// `event_on_expiry` via the (weak) runtime reference it was started with.
pub struct TimerService<E: Event> {
    core: Arc<TimerCore<E>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl<E: Event> TimerService<E> {
    /// Builds the service and immediately spawns its background thread,
    /// which holds only a `Weak<RuntimeInner<E>>` back-reference so it
    /// never keeps the runtime alive by itself.
    pub(crate) fn spawn(runtime: Weak<RuntimeInner<E>>) -> Self {
        let core = Arc::new(TimerCore {
            table: Mutex::new(Table {
                timers: HashMap::new(),
                next_order: 0,
            }),
            wake: Condvar::new(),
            shutdown: AtomicBool::new(false),
        });
        let thread_core = Arc::clone(&core);
        let handle = std::thread::Builder::new()
            .name("timer-service".to_string())
            .spawn(move || timer_loop(thread_core, runtime))
            .expect("failed to spawn timer service thread");
        Self {
            core,
            thread: Mutex::new(Some(handle)),
        }
    }

    /// Registers a new timer; fails with [`TimerError::Duplicate`] if `id`
    /// is already present (spec §4.3 `create_timer`, §9 "non-fatal variant").
    pub fn create_timer(&self, id: u32, event: E) -> Result<(), TimerError> {
        let mut table = self.core.table.lock().expect("timer table mutex poisoned");
        if table.timers.contains_key(&id) {
            return Err(TimerError::Duplicate(id));
        }
        let order = table.next_order;
        table.next_order += 1;
        table.timers.insert(
            id,
            TimerRecord {
                event,
                period_ms: 0,
                previous_period_ms: 0,
                next_deadline: None,
                order,
            },
        );
        Ok(())
    }

    /// Arms the timer to fire every `period_ms`; `0` disarms it (spec §4.3
    /// `set_timer`; invariant 7: repeated disarms are idempotent).
    pub fn set_timer(&self, id: u32, period_ms: u64) -> Result<(), TimerError> {
        let mut table = self.core.table.lock().expect("timer table mutex poisoned");
        let record = table.timers.get_mut(&id).ok_or(TimerError::NotFound(id))?;
        if period_ms == 0 {
            record.next_deadline = None;
        } else {
            record.previous_period_ms = period_ms;
            record.next_deadline = Some(Instant::now() + Duration::from_millis(period_ms));
        }
        record.period_ms = period_ms;
        drop(table);
        self.core.wake.notify_one();
        Ok(())
    }

    /// If armed, disarms and remembers the period; if disarmed, restores the
    /// last nonzero period (spec §4.3 `toggle_timer`; invariant 8: a
    /// toggle/toggle round-trip with no intervening `set_timer` restores the
    /// original period).
    pub fn toggle_timer(&self, id: u32) -> Result<(), TimerError> {
        let mut table = self.core.table.lock().expect("timer table mutex poisoned");
        let record = table.timers.get_mut(&id).ok_or(TimerError::NotFound(id))?;
        if record.period_ms == 0 {
            let restore = record.previous_period_ms;
            if restore > 0 {
                record.period_ms = restore;
                record.next_deadline = Some(Instant::now() + Duration::from_millis(restore));
            }
        } else {
            record.previous_period_ms = record.period_ms;
            record.period_ms = 0;
            record.next_deadline = None;
        }
        drop(table);
        self.core.wake.notify_one();
        Ok(())
    }

    /// Milliseconds remaining before next fire, or 0 if disarmed (spec §4.3
    /// `get_timer`).
    pub fn get_remaining(&self, id: u32) -> Result<u64, TimerError> {
        let table = self.core.table.lock().expect("timer table mutex poisoned");
        let record = table.timers.get(&id).ok_or(TimerError::NotFound(id))?;
        Ok(match record.next_deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()).as_millis() as u64,
            None => 0,
        })
    }

    /// Current configured period (spec §4.3 `get_period`).
    pub fn get_period(&self, id: u32) -> Result<u64, TimerError> {
        let table = self.core.table.lock().expect("timer table mutex poisoned");
        Ok(table.timers.get(&id).ok_or(TimerError::NotFound(id))?.period_ms)
    }

    /// Cancels the background thread and discards any pending timers (spec
    /// §4.3 "Shutdown"). Callers must stop issuing `set_timer` once this
    /// has been called.
    pub(crate) fn shutdown(&self) {
        self.core.shutdown.store(true, Ordering::Release);
        self.core.wake.notify_all();
        if let Some(handle) = self.thread.lock().expect("thread mutex poisoned").take() {
            let _ = handle.join();
        }
    }
}

/// The background loop: waits on the multiplexed deadline with a bounded
/// timeout, broadcasts every timer that's due, and reschedules it for the
/// next period. Exits when `shutdown()` is called or the runtime has been
/// dropped (its `Weak` reference stops upgrading).
fn timer_loop<E: Event>(core: Arc<TimerCore<E>>, runtime: Weak<RuntimeInner<E>>) {
    loop {
        let mut table = core.table.lock().expect("timer table mutex poisoned");
        if core.shutdown.load(Ordering::Acquire) {
            return;
        }

        let now = Instant::now();
        let mut wait = MAX_WAIT;
        for record in table.timers.values() {
            if let Some(deadline) = record.next_deadline {
                let remaining = deadline.saturating_duration_since(now);
                if remaining < wait {
                    wait = remaining;
                }
            }
        }

        let (guard, _timed_out) = core
            .wake
            .wait_timeout(table, wait)
            .expect("timer condvar poisoned");
        table = guard;

        if core.shutdown.load(Ordering::Acquire) {
            return;
        }

        let now = Instant::now();
        let mut due: Vec<(u64, E)> = Vec::new();
        for record in table.timers.values_mut() {
            if let Some(deadline) = record.next_deadline {
                if now >= deadline {
                    due.push((record.order, record.event));
                    record.next_deadline = Some(now + Duration::from_millis(record.period_ms));
                }
            }
        }
        due.sort_by_key(|(order, _)| *order);
        drop(table);

        let Some(rt) = runtime.upgrade() else {
            return;
        };
        for (_, event) in due {
            log::trace!("timer fired -> {event:?}");
            rt.broadcast(event);
        }
    }
}
