//! States and the action/guard capability types actions and guards use.

use std::fmt;
use std::sync::Arc;

use crate::worker::WorkerHandle;
use crate::Event;

/// An entry or exit action: a side-effecting callable run on entering or
/// leaving a state. May call `broadcast`, `set_timer`/`toggle_timer`, or
/// `exit_worker` through the [`WorkerHandle`] it's given. Must not call
/// `step` recursively and must not block indefinitely (spec §4.2).
pub type Action<C, E> = Arc<dyn Fn(&mut C, &WorkerHandle<E>) + Send + Sync>;

/// A guard: a side-effect-free predicate over externally observable state
/// (context fields, remaining time on a timer) gating a transition. Must
/// return the same answer for the same observable state (spec invariant 4).
pub type Guard<C, E> = Arc<dyn Fn(&C, &WorkerHandle<E>) -> bool + Send + Sync>;

/// Opaque handle identifying one state within an [`crate::table::FsmTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(pub(crate) usize);

/// An immutable state record: a name (for diagnostics) plus optional entry
/// and exit actions (spec §3).
pub struct State<C, E: Event> {
    pub(crate) name: &'static str,
    pub(crate) entry: Option<Action<C, E>>,
    pub(crate) exit: Option<Action<C, E>>,
}

impl<C, E: Event> State<C, E> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entry: None,
            exit: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<C, E: Event> fmt::Debug for State<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("name", &self.name)
            .field("has_entry", &self.entry.is_some())
            .field("has_exit", &self.exit.is_some())
            .finish()
    }
}
