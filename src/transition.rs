//! Transitions: immutable `(from, event, guard?, to)` records.

use std::fmt;

use crate::state::{Guard, StateId};
use crate::Event;

/// An immutable transition edge: `from_state` + `event` (+ optional guard)
/// → `to_state` (spec §3).
///
/// For determinism (spec invariant 1), at most one `Transition` may exist
/// per `(from, event)` pair within a single [`crate::table::FsmTable`];
/// this is checked once at table-construction time, not on every dispatch.
pub struct Transition<C, E: Event> {
    pub(crate) from: StateId,
    pub(crate) event: E,
    pub(crate) guard: Option<Guard<C, E>>,
    pub(crate) to: StateId,
}

impl<C, E: Event> Transition<C, E> {
    pub(crate) fn new(from: StateId, event: E, guard: Option<Guard<C, E>>, to: StateId) -> Self {
        Self {
            from,
            event,
            guard,
            to,
        }
    }
}

impl<C, E: Event> fmt::Debug for Transition<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("from", &self.from)
            .field("event", &self.event)
            .field("guarded", &self.guard.is_some())
            .field("to", &self.to)
            .finish()
    }
}
