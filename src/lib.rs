//! # fsm-runtime: an event-driven finite state machine runtime
//!
//! A small kernel that hosts one or more deterministic finite state
//! machines (DFSMs), each running on its own worker thread, wired together
//! by a shared broadcast event stream and a timer service that turns
//! real-time expiries into events re-entering that same stream.
//!
//! ## Design
//!
//! - **Event-driven:** every worker blocks on a per-queue `dequeue()` and
//!   reacts only to events, never polls.
//! - **FSM-agnostic:** state tables, entry/exit actions, and guards are
//!   ordinary data built with [`FsmTableBuilder`] — the runtime interprets
//!   them, it doesn't hard-code any particular workload.
//! - **No hidden globals:** every worker, queue, and timer lives behind one
//!   explicit [`Runtime`] value you construct and pass around.
//!
//! ## Quick Start
//!
//! ```
//! use fsm_runtime::{FsmTableBuilder, Runtime};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! enum Event {
//!     TurnOn,
//!     TurnOff,
//!     Done,
//! }
//!
//! struct LightContext {
//!     brightness: u8,
//! }
//!
//! let table = FsmTableBuilder::<LightContext, Event>::new()
//!     .state("Off")
//!     .state("On")
//!     .state("Exited")
//!     .on_entry("Off", |ctx, _h| ctx.brightness = 0)
//!     .on_entry("On", |ctx, _h| ctx.brightness = 100)
//!     .on_entry("Exited", |_ctx, h| h.exit_worker())
//!     .transition("Off", Event::TurnOn, "On")
//!     .transition("On", Event::TurnOff, "Off")
//!     .transition("Off", Event::Done, "Exited")
//!     .transition("On", Event::Done, "Exited")
//!     .build("Off")
//!     .unwrap();
//!
//! let runtime = Runtime::new();
//! runtime
//!     .register("light", Arc::new(table), LightContext { brightness: 0 })
//!     .unwrap();
//!
//! runtime.broadcast(Event::TurnOn);
//! std::thread::sleep(Duration::from_millis(10));
//! assert_eq!(runtime.find_by_name("light").unwrap().current_state, "On");
//!
//! runtime.shutdown(Event::Done).unwrap();
//! ```
//!
//! See the `demos/` directory for a complete stoplight + crosswalk
//! cooperating-FSM example driven by timers and a guarded button press.

mod error;
mod event;
mod instance;
mod queue;
mod registry;
mod runtime;
mod state;
mod table;
mod timer;
mod transition;
mod worker;

pub use error::{QueueError, RegistryError, SetupError, TimerError};
pub use event::Event;
pub use instance::{FsmInstance, StepOutcome};
pub use queue::EventQueue;
pub use registry::{debug_flags, WorkerSnapshot};
pub use runtime::Runtime;
pub use state::{Action, Guard, State, StateId};
pub use table::{FsmTable, FsmTableBuilder};
pub use transition::Transition;
pub use worker::WorkerHandle;
