//! Timer service tests: arming, disarming, toggling, and periodic re-fire,
//! driven through a live `Runtime` rather than the service's own unit tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fsm_runtime::{FsmTableBuilder, Runtime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Start,
    Tick,
    Done,
}

const TIMER_ID: u32 = 7;

fn counting_table(counter: Arc<AtomicU32>) -> fsm_runtime::FsmTable<(), Event> {
    FsmTableBuilder::<(), Event>::new()
        .state("Idle")
        .state("Running")
        .state("Done")
        .on_entry("Running", move |_ctx, h| h.set_timer(TIMER_ID, 20))
        .on_entry("Done", |_ctx, h| h.exit_worker())
        .transition("Idle", Event::Start, "Running")
        .transition("Idle", Event::Done, "Done")
        .transition("Running", Event::Done, "Done")
        .guarded_transition("Running", Event::Tick, "Running", move |_ctx, _h| {
            counter.fetch_add(1, Ordering::SeqCst);
            false
        })
        .build("Idle")
        .unwrap()
}

/// A periodic timer fires repeatedly at its configured period until
/// disarmed, each firing observed as a broadcast `Tick` event.
#[test]
fn periodic_timer_fires_repeatedly() {
    let counter = Arc::new(AtomicU32::new(0));
    let rt = Runtime::<Event>::new();
    rt.register("w", Arc::new(counting_table(Arc::clone(&counter))), ())
        .unwrap();
    rt.create_timer(TIMER_ID, Event::Tick).unwrap();

    rt.broadcast(Event::Start);
    std::thread::sleep(Duration::from_millis(130));

    assert!(
        counter.load(Ordering::SeqCst) >= 3,
        "expected several periodic fires, got {}",
        counter.load(Ordering::SeqCst)
    );

    rt.shutdown(Event::Done).unwrap();
}

/// Invariant 7: repeated `set_timer(id, 0)` calls are idempotent.
#[test]
fn set_timer_zero_is_idempotent() {
    let rt = Runtime::<Event>::new();
    rt.register("w", Arc::new(counting_table(Arc::new(AtomicU32::new(0)))), ())
        .unwrap();
    rt.create_timer(TIMER_ID, Event::Tick).unwrap();

    rt.set_timer(TIMER_ID, 50).unwrap();
    rt.set_timer(TIMER_ID, 0).unwrap();
    rt.set_timer(TIMER_ID, 0).unwrap();
    assert_eq!(rt.get_timer(TIMER_ID).unwrap(), 0);

    rt.shutdown(Event::Done).unwrap();
}

/// Invariant 8: a toggle/toggle round-trip with no intervening `set_timer`
/// restores the period that was in effect before the first toggle.
#[test]
fn toggle_round_trip_restores_period() {
    let rt = Runtime::<Event>::new();
    rt.register("w", Arc::new(counting_table(Arc::new(AtomicU32::new(0)))), ())
        .unwrap();
    rt.create_timer(TIMER_ID, Event::Tick).unwrap();
    rt.set_timer(TIMER_ID, 75).unwrap();

    rt.toggle_timer(TIMER_ID).unwrap();
    assert_eq!(rt.get_period(TIMER_ID).unwrap(), 0);

    rt.toggle_timer(TIMER_ID).unwrap();
    assert_eq!(rt.get_period(TIMER_ID).unwrap(), 75);

    rt.shutdown(Event::Done).unwrap();
}

/// `create_timer` with a duplicate id is a non-fatal error (spec §9's
/// preferred variant), not a process abort.
#[test]
fn duplicate_create_timer_is_non_fatal() {
    let rt = Runtime::<Event>::new();
    rt.register("w", Arc::new(counting_table(Arc::new(AtomicU32::new(0)))), ())
        .unwrap();
    rt.create_timer(TIMER_ID, Event::Tick).unwrap();
    assert!(rt.create_timer(TIMER_ID, Event::Tick).is_err());
    rt.shutdown(Event::Done).unwrap();
}

/// Shutdown completeness (invariant 6): after `shutdown`, no timer
/// continues firing (the counter does not advance further).
#[test]
fn shutdown_stops_periodic_timer() {
    let counter = Arc::new(AtomicU32::new(0));
    let rt = Runtime::<Event>::new();
    rt.register("w", Arc::new(counting_table(Arc::clone(&counter))), ())
        .unwrap();
    rt.create_timer(TIMER_ID, Event::Tick).unwrap();
    rt.broadcast(Event::Start);
    std::thread::sleep(Duration::from_millis(50));

    rt.shutdown(Event::Done).unwrap();
    let after_shutdown = counter.load(Ordering::SeqCst);
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(counter.load(Ordering::SeqCst), after_shutdown);
}
