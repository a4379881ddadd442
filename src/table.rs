//! `FsmTable`: the immutable, shared transition table an [`crate::instance::FsmInstance`]
//! interprets, plus the builder used to assemble one.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SetupError;
use crate::state::{Action, Guard, State, StateId};
use crate::transition::Transition;
use crate::worker::WorkerHandle;
use crate::Event;

/// An immutable transition table shared (via `Arc`) by every instance of a
/// given FSM. Built once at setup; never mutated afterward (spec §3).
pub struct FsmTable<C, E: Event> {
    states: Vec<State<C, E>>,
    transitions: Vec<Transition<C, E>>,
    initial: StateId,
}

impl<C, E: Event> FsmTable<C, E> {
    pub fn state_name(&self, id: StateId) -> &'static str {
        self.states[id.0].name
    }

    pub fn initial_state(&self) -> StateId {
        self.initial
    }

    pub(crate) fn state(&self, id: StateId) -> &State<C, E> {
        &self.states[id.0]
    }

    /// Linear scan for the unique `(from, event)` match (spec §4.2 step 1).
    /// Tables are small (a handful of states); a scan is simpler and just
    /// as fast as a hash lookup at this scale, and matches the spec's
    /// literal wording.
    pub(crate) fn find_transition(&self, from: StateId, event: E) -> Option<&Transition<C, E>> {
        self.transitions
            .iter()
            .find(|t| t.from == from && t.event == event)
    }
}

/// Assembles an [`FsmTable`], mirroring the shape of a declarative state
/// table: name states, attach entry/exit actions, wire transitions, then
/// `build()` against a named initial state.
///
/// ```
/// use fsm_runtime::{FsmTableBuilder};
/// # #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// # enum Ev { Tick }
/// # struct Ctx;
/// let table = FsmTableBuilder::<Ctx, Ev>::new()
///     .state("Off")
///     .state("On")
///     .transition("Off", Ev::Tick, "On")
///     .transition("On", Ev::Tick, "Off")
///     .build("Off")
///     .unwrap();
/// ```
pub struct FsmTableBuilder<C, E: Event> {
    states: Vec<State<C, E>>,
    name_to_id: HashMap<&'static str, StateId>,
    transitions: Vec<PendingTransition<C, E>>,
}

struct PendingTransition<C, E: Event> {
    from: &'static str,
    event: E,
    guard: Option<Guard<C, E>>,
    to: &'static str,
}

impl<C, E: Event> FsmTableBuilder<C, E> {
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            name_to_id: HashMap::new(),
            transitions: Vec::new(),
        }
    }

    /// Declares a state. Names must be unique within the table (spec §3).
    pub fn state(mut self, name: &'static str) -> Self {
        let id = StateId(self.states.len());
        self.states.push(State::new(name));
        self.name_to_id.insert(name, id);
        self
    }

    /// Attaches an entry action to an already-declared state.
    pub fn on_entry<F>(mut self, name: &'static str, action: F) -> Self
    where
        F: Fn(&mut C, &WorkerHandle<E>) + Send + Sync + 'static,
    {
        let id = self.require_state(name);
        self.states[id.0].entry = Some(Arc::new(action) as Action<C, E>);
        self
    }

    /// Attaches an exit action to an already-declared state.
    pub fn on_exit<F>(mut self, name: &'static str, action: F) -> Self
    where
        F: Fn(&mut C, &WorkerHandle<E>) + Send + Sync + 'static,
    {
        let id = self.require_state(name);
        self.states[id.0].exit = Some(Arc::new(action) as Action<C, E>);
        self
    }

    /// Adds an unguarded `(from, event) -> to` transition.
    pub fn transition(mut self, from: &'static str, event: E, to: &'static str) -> Self {
        self.transitions.push(PendingTransition {
            from,
            event,
            guard: None,
            to,
        });
        self
    }

    /// Adds a guarded `(from, event) -> to` transition. The guard is
    /// evaluated before the transition fires (spec §4.2 step 2, §4.6).
    pub fn guarded_transition<G>(
        mut self,
        from: &'static str,
        event: E,
        to: &'static str,
        guard: G,
    ) -> Self
    where
        G: Fn(&C, &WorkerHandle<E>) -> bool + Send + Sync + 'static,
    {
        self.transitions.push(PendingTransition {
            from,
            event,
            guard: Some(Arc::new(guard) as Guard<C, E>),
            to,
        });
        self
    }

    fn require_state(&self, name: &'static str) -> StateId {
        *self
            .name_to_id
            .get(name)
            .unwrap_or_else(|| panic!("fsm table: state {name:?} was never declared with .state(...)"))
    }

    /// Resolves state names, checks determinism (spec invariant 1: at most
    /// one transition per `(from, event)`), and produces the immutable
    /// table. This is a setup-time failure (spec §7), not a runtime one.
    pub fn build(self, initial: &'static str) -> Result<FsmTable<C, E>, SetupError> {
        let initial_id = *self.name_to_id.get(initial).ok_or_else(|| {
            SetupError::BadArgument(format!("initial state {initial:?} was never declared"))
        })?;

        let mut transitions = Vec::with_capacity(self.transitions.len());
        let mut seen: Vec<(StateId, E)> = Vec::with_capacity(self.transitions.len());
        for pending in self.transitions {
            let from_id = *self.name_to_id.get(pending.from).ok_or_else(|| {
                SetupError::BadArgument(format!(
                    "transition references undeclared state {:?}",
                    pending.from
                ))
            })?;
            let to_id = *self.name_to_id.get(pending.to).ok_or_else(|| {
                SetupError::BadArgument(format!(
                    "transition references undeclared state {:?}",
                    pending.to
                ))
            })?;
            if seen.iter().any(|(f, e)| *f == from_id && *e == pending.event) {
                return Err(SetupError::BadArgument(format!(
                    "non-deterministic table: more than one transition from {:?} on {:?}",
                    pending.from, pending.event
                )));
            }
            seen.push((from_id, pending.event));
            transitions.push(Transition::new(from_id, pending.event, pending.guard, to_id));
        }

        Ok(FsmTable {
            states: self.states,
            transitions,
            initial: initial_id,
        })
    }
}

impl<C, E: Event> Default for FsmTableBuilder<C, E> {
    fn default() -> Self {
        Self::new()
    }
}
