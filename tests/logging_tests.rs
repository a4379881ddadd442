//! Logging tests: the runtime emits `log` records for transitions, guard
//! rejections, and lifecycle events, filterable via the `debug_flags`
//! bitmask independent of the `log` crate's own level filter.

use std::sync::Arc;
use std::time::Duration;

use fsm_runtime::{debug_flags, FsmTableBuilder, Runtime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Go,
    Done,
}

fn table() -> fsm_runtime::FsmTable<(), Event> {
    FsmTableBuilder::<(), Event>::new()
        .state("A")
        .state("B")
        .state("Done")
        .on_entry("Done", |_ctx, h| h.exit_worker())
        .transition("A", Event::Go, "B")
        .transition("A", Event::Done, "Done")
        .transition("B", Event::Done, "Done")
        .build("A")
        .unwrap()
}

/// The crate works correctly with no logger installed at all (the `log`
/// facade is a no-op sink by default) — logging is ambient, never load
/// bearing for correctness.
#[test]
fn runs_correctly_with_no_logger_installed() {
    let rt = Runtime::<Event>::new();
    rt.register("w", Arc::new(table()), ()).unwrap();
    rt.broadcast(Event::Go);
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(rt.find_by_name("w").unwrap().current_state, "B");
    rt.shutdown(Event::Done).unwrap();
}

/// `debug_flags` can be read back after being set; it's an independent
/// knob from the `log` crate's own max-level filter.
#[test]
fn debug_flags_round_trip() {
    let rt = Runtime::<Event>::new();
    assert_eq!(rt.debug_flags(), 0);

    let mask = debug_flags::TRANSITIONS | debug_flags::TIMERS | debug_flags::VERBOSE;
    rt.set_debug_flags(mask);
    assert_eq!(rt.debug_flags(), mask);
}

/// `debug_flags` bits are independently addressable.
#[test]
fn debug_flags_bits_are_distinct() {
    let all = [
        debug_flags::TRANSITIONS,
        debug_flags::EVENTS,
        debug_flags::TIMERS,
        debug_flags::WORKER_LIFECYCLE,
        debug_flags::VERBOSE,
    ];
    for (i, a) in all.iter().enumerate() {
        for (j, b) in all.iter().enumerate() {
            if i != j {
                assert_eq!(a & b, 0, "flags at {i} and {j} overlap");
            }
        }
    }
}
