//! `FsmInstance`: a mutable current-state cursor over an immutable [`FsmTable`].

use std::sync::Arc;

use crate::state::StateId;
use crate::table::FsmTable;
use crate::worker::WorkerHandle;
use crate::Event;

/// Outcome of one `step()` call (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The matching transition fired: exit-action, cursor write, entry-action
    /// ran in that order.
    Transitioned,
    /// A transition matched but its guard returned `false`; the event was
    /// discarded and the state is unchanged.
    Blocked,
    /// No transition exists for `(current_state, event)`; the event was
    /// silently discarded.
    NoMatch,
}

/// A live FSM: a current-state cursor plus a reference to its immutable
/// transition table (spec §3). Exclusively owned and mutated by the
/// [`crate::worker::Worker`] thread that runs it.
pub struct FsmInstance<C, E: Event> {
    current: StateId,
    table: Arc<FsmTable<C, E>>,
}

impl<C, E: Event> FsmInstance<C, E> {
    pub fn new(table: Arc<FsmTable<C, E>>) -> Self {
        Self {
            current: table.initial_state(),
            table,
        }
    }

    pub fn current_state_name(&self) -> &'static str {
        self.table.state_name(self.current)
    }

    /// Runs the initial state's entry action. Must be called exactly once,
    /// before the worker's first `dequeue` (spec §4.2 "Init").
    pub fn init(&mut self, ctx: &mut C, handle: &WorkerHandle<E>) {
        if let Some(entry) = self.table.state(self.current).entry.clone() {
            entry(ctx, handle);
        }
    }

    /// Implements the step algorithm exactly as spec §4.2 describes it:
    /// scan for a unique `(current, event)` match, evaluate its guard if
    /// any, then exit-action(old) → cursor write → entry-action(new).
    pub fn step(&mut self, ctx: &mut C, event: E, handle: &WorkerHandle<E>) -> StepOutcome {
        let transition = match self.table.find_transition(self.current, event) {
            Some(t) => t,
            None => return StepOutcome::NoMatch,
        };

        if let Some(guard) = &transition.guard {
            if !guard(ctx, handle) {
                return StepOutcome::Blocked;
            }
        }

        let to = transition.to;
        let exit = self.table.state(self.current).exit.clone();
        let entry = self.table.state(to).entry.clone();

        if let Some(exit) = exit {
            exit(ctx, handle);
        }
        self.current = to;
        if let Some(entry) = entry {
            entry(ctx, handle);
        }
        StepOutcome::Transitioned
    }
}
