//! Integration tests for the event-driven FSM runtime: end-to-end scenarios
//! driving a real `Runtime` across real worker threads.

use std::sync::Arc;
use std::time::Duration;

use fsm_runtime::{FsmTableBuilder, Runtime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToggleEvent {
    Toggle,
    Done,
}

struct ToggleContext {
    toggle_count: u32,
}

fn toggle_table() -> fsm_runtime::FsmTable<ToggleContext, ToggleEvent> {
    FsmTableBuilder::<ToggleContext, ToggleEvent>::new()
        .state("Off")
        .state("On")
        .state("Exited")
        .on_entry("Off", |ctx, _h| ctx.toggle_count += 1)
        .on_entry("On", |ctx, _h| ctx.toggle_count += 1)
        .on_entry("Exited", |_ctx, h| h.exit_worker())
        .transition("Off", ToggleEvent::Toggle, "On")
        .transition("On", ToggleEvent::Toggle, "Off")
        .transition("Off", ToggleEvent::Done, "Exited")
        .transition("On", ToggleEvent::Done, "Exited")
        .build("Off")
        .unwrap()
}

#[test]
fn toggle_fsm_alternates_on_each_event() {
    let rt = Runtime::<ToggleEvent>::new();
    rt.register("toggle", Arc::new(toggle_table()), ToggleContext { toggle_count: 0 })
        .unwrap();

    rt.broadcast(ToggleEvent::Toggle);
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(rt.find_by_name("toggle").unwrap().current_state, "On");

    rt.broadcast(ToggleEvent::Toggle);
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(rt.find_by_name("toggle").unwrap().current_state, "Off");

    rt.shutdown(ToggleEvent::Done).unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoplightEvent {
    Init,
    LightTimer,
    Done,
}

struct StoplightContext {
    cycles: u32,
}

fn stoplight_table() -> fsm_runtime::FsmTable<StoplightContext, StoplightEvent> {
    FsmTableBuilder::<StoplightContext, StoplightEvent>::new()
        .state("Init")
        .state("Green")
        .state("Yellow")
        .state("Red")
        .state("Done")
        .on_entry("Green", |ctx, h| {
            ctx.cycles += 1;
            h.set_timer(1, 40);
        })
        .on_entry("Yellow", |_ctx, h| h.set_timer(1, 15))
        .on_entry("Red", |_ctx, h| h.set_timer(1, 40))
        .on_entry("Done", |_ctx, h| h.exit_worker())
        .transition("Init", StoplightEvent::Init, "Green")
        .transition("Green", StoplightEvent::LightTimer, "Yellow")
        .transition("Yellow", StoplightEvent::LightTimer, "Red")
        .transition("Red", StoplightEvent::LightTimer, "Green")
        .transition("Init", StoplightEvent::Done, "Done")
        .transition("Green", StoplightEvent::Done, "Done")
        .transition("Yellow", StoplightEvent::Done, "Done")
        .transition("Red", StoplightEvent::Done, "Done")
        .build("Init")
        .unwrap()
}

/// Scenario A (normal light cycle): after `Init` and enough time for at
/// least one full cycle, the light has advanced through several colors and
/// the timer remains armed.
#[test]
fn scenario_a_normal_light_cycle() {
    let rt = Runtime::<StoplightEvent>::new();
    rt.register("light", Arc::new(stoplight_table()), StoplightContext { cycles: 0 })
        .unwrap();
    rt.create_timer(1, StoplightEvent::LightTimer).unwrap();

    rt.broadcast(StoplightEvent::Init);
    std::thread::sleep(Duration::from_millis(50));

    let snapshot = rt.find_by_name("light").unwrap();
    assert_ne!(snapshot.current_state, "Init");
    assert!(rt.get_period(1).unwrap() > 0);

    rt.shutdown(StoplightEvent::Done).unwrap();
}

/// Scenario E (clean shutdown): after `broadcast(Done)` and `join_all`, no
/// worker remains alive (the call returns) and no timer continues to fire.
#[test]
fn scenario_e_clean_shutdown() {
    let rt = Runtime::<StoplightEvent>::new();
    rt.register("light", Arc::new(stoplight_table()), StoplightContext { cycles: 0 })
        .unwrap();
    rt.broadcast(StoplightEvent::Init);
    std::thread::sleep(Duration::from_millis(30));

    rt.shutdown(StoplightEvent::Done).unwrap();
    assert_eq!(rt.find_by_name("light").unwrap().current_state, "Done");
}

/// Scenario F (unknown event discarded): broadcasting an event no state in
/// the current table matches leaves state unchanged.
#[test]
fn scenario_f_unknown_event_discarded() {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Ev {
        Init,
        Unrelated,
        Done,
    }
    let table = FsmTableBuilder::<(), Ev>::new()
        .state("Init")
        .state("Green")
        .state("Done")
        .on_entry("Done", |_ctx, h| h.exit_worker())
        .transition("Init", Ev::Init, "Green")
        .transition("Init", Ev::Done, "Done")
        .transition("Green", Ev::Done, "Done")
        .build("Init")
        .unwrap();

    let rt = Runtime::<Ev>::new();
    rt.register("w", Arc::new(table), ()).unwrap();
    rt.broadcast(Ev::Init);
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(rt.find_by_name("w").unwrap().current_state, "Green");

    rt.broadcast(Ev::Unrelated);
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(rt.find_by_name("w").unwrap().current_state, "Green");

    rt.shutdown(Ev::Done).unwrap();
}

#[test]
fn two_independent_workers_do_not_observe_each_others_state() {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Ev {
        Go,
        Done,
    }
    fn table() -> fsm_runtime::FsmTable<u32, Ev> {
        FsmTableBuilder::<u32, Ev>::new()
            .state("Idle")
            .state("Running")
            .state("Done")
            .on_entry("Done", |_ctx, h| h.exit_worker())
            .transition("Idle", Ev::Go, "Running")
            .transition("Idle", Ev::Done, "Done")
            .transition("Running", Ev::Done, "Done")
            .build("Idle")
            .unwrap()
    }

    let rt = Runtime::<Ev>::new();
    rt.register("a", Arc::new(table()), 0u32).unwrap();
    rt.register("b", Arc::new(table()), 0u32).unwrap();

    // Broadcast reaches every worker; both should transition.
    rt.broadcast(Ev::Go);
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(rt.find_by_name("a").unwrap().current_state, "Running");
    assert_eq!(rt.find_by_name("b").unwrap().current_state, "Running");

    rt.shutdown(Ev::Done).unwrap();
}
