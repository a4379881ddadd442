//! Guard-gated transitions: button-press scenarios from spec §8, plus the
//! guard-purity invariant.

use std::sync::Arc;
use std::time::Duration;

use fsm_runtime::{FsmTableBuilder, Runtime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Init,
    LightTimer,
    Button,
    Done,
}

struct Ctx {
    t_norm_ms: u64,
    t_but_ms: u64,
}

const LIGHT_TIMER: u32 = 1;

fn table() -> fsm_runtime::FsmTable<Ctx, Event> {
    FsmTableBuilder::<Ctx, Event>::new()
        .state("Init")
        .state("Green")
        .state("GreenWithButton")
        .state("Yellow")
        .state("Done")
        .on_entry("Green", |ctx, h| h.set_timer(LIGHT_TIMER, ctx.t_norm_ms))
        .on_entry("GreenWithButton", |ctx, h| h.set_timer(LIGHT_TIMER, ctx.t_but_ms))
        .on_entry("Done", |_ctx, h| h.exit_worker())
        .transition("Init", Event::Init, "Green")
        .transition("Green", Event::LightTimer, "Yellow")
        .transition("GreenWithButton", Event::LightTimer, "Yellow")
        .guarded_transition("Green", Event::Button, "GreenWithButton", |ctx, h| {
            h.timer_remaining_ms(LIGHT_TIMER) > ctx.t_but_ms
        })
        .transition("Init", Event::Done, "Done")
        .transition("Green", Event::Done, "Done")
        .transition("GreenWithButton", Event::Done, "Done")
        .transition("Yellow", Event::Done, "Done")
        .build("Init")
        .unwrap()
}

/// Scenario B: button pressed early in the Green phase, with plenty of
/// `LightTimer` remaining, is honored.
#[test]
fn scenario_b_button_press_honored() {
    let rt = Runtime::<Event>::new();
    rt.register(
        "light",
        Arc::new(table()),
        Ctx {
            t_norm_ms: 1000,
            t_but_ms: 100,
        },
    )
    .unwrap();
    rt.create_timer(LIGHT_TIMER, Event::LightTimer).unwrap();

    rt.broadcast(Event::Init);
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(rt.find_by_name("light").unwrap().current_state, "Green");

    rt.broadcast(Event::Button);
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(
        rt.find_by_name("light").unwrap().current_state,
        "GreenWithButton"
    );

    rt.shutdown(Event::Done).unwrap();
}

/// Scenario C: button pressed with only ~100ms left on a 1000ms timer (less
/// than `t_but_ms`) is rejected by the guard; state does not change.
#[test]
fn scenario_c_button_press_rejected_by_guard() {
    let rt = Runtime::<Event>::new();
    rt.register(
        "light",
        Arc::new(table()),
        Ctx {
            t_norm_ms: 1000,
            t_but_ms: 100,
        },
    )
    .unwrap();
    rt.create_timer(LIGHT_TIMER, Event::LightTimer).unwrap();

    rt.broadcast(Event::Init);
    std::thread::sleep(Duration::from_millis(900));
    assert_eq!(rt.find_by_name("light").unwrap().current_state, "Green");

    rt.broadcast(Event::Button);
    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(
        rt.find_by_name("light").unwrap().current_state,
        "Green",
        "guard should have rejected the button press"
    );

    rt.shutdown(Event::Done).unwrap();
}

/// Invariant 4: two consecutive evaluations of the same guard against the
/// same observable state return the same answer.
#[test]
fn guard_purity_same_state_same_answer() {
    let rt = Runtime::<Event>::new();
    let handle = rt.test_handle();
    let ctx = Ctx {
        t_norm_ms: 1000,
        t_but_ms: 100,
    };

    let guard = |ctx: &Ctx, h: &fsm_runtime::WorkerHandle<Event>| -> bool {
        h.timer_remaining_ms(LIGHT_TIMER) > ctx.t_but_ms
    };

    let first = guard(&ctx, &handle);
    let second = guard(&ctx, &handle);
    assert_eq!(first, second);
}

/// A guard returning false must not run the target state's entry action.
#[test]
fn guard_false_suppresses_entry_action() {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Ev {
        Go,
        Done,
    }
    let table = FsmTableBuilder::<std::sync::atomic::AtomicU32, Ev>::new()
        .state("A")
        .state("B")
        .state("Done")
        .on_entry("B", |ctx, _h| {
            ctx.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        })
        .on_entry("Done", |_ctx, h| h.exit_worker())
        .guarded_transition("A", Ev::Go, "B", |_ctx, _h| false)
        .transition("A", Ev::Done, "Done")
        .transition("B", Ev::Done, "Done")
        .build("A")
        .unwrap();

    let rt = Runtime::<Ev>::new();
    rt.register("w", Arc::new(table), std::sync::atomic::AtomicU32::new(0))
        .unwrap();
    rt.broadcast(Ev::Go);
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(rt.find_by_name("w").unwrap().current_state, "A");
    rt.shutdown(Ev::Done).unwrap();
}
