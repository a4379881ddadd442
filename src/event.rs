//! Events: the closed, payload-free discriminators dispatched through the runtime.

use std::fmt::Debug;

/// A tagged discriminator drawn from a closed enumeration known at build time.
///
/// Events carry no payload (see spec Non-goals). They are cheap to copy and
/// structurally comparable, which is what lets [`crate::queue::EventQueue`]
/// and [`crate::runtime::Runtime::broadcast`] clone one event into every
/// worker's queue without cost.
///
/// Any `Copy + Eq + Debug + Send + Sync + 'static` type qualifies
/// automatically — usually a plain `#[derive(Debug, Clone, Copy, PartialEq, Eq)]`
/// enum:
///
/// ```
/// use fsm_runtime::Event;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// enum TrafficEvent {
///     Init,
///     Done,
///     LightTimer,
///     Button,
/// }
///
/// fn assert_event<E: Event>() {}
/// assert_event::<TrafficEvent>();
/// ```
pub trait Event: Copy + Eq + Debug + Send + Sync + 'static {}

impl<T> Event for T where T: Copy + Eq + Debug + Send + Sync + 'static {}
