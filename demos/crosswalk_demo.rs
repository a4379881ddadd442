//! Crosswalk cooperating with the stoplight: two independent workers on one
//! `Runtime`, wired only by the color events the stoplight broadcasts.
//! Run with `cargo run --example crosswalk_demo`.

use std::sync::Arc;
use std::time::Duration;

use fsm_runtime::{FsmTable, FsmTableBuilder, Runtime};

const LIGHT_TIMER: u32 = 1;
const BLINK_TIMER: u32 = 2;
const WALK_TIMER: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Init,
    Done,
    LightTimer,
    BlinkTimer,
    WalkTimer,
    Button,
    Green,
    Yellow,
    Red,
}

pub struct StoplightContext {
    cycle_count: u32,
    t_norm_ms: u64,
    t_fast_ms: u64,
    t_but_ms: u64,
}

pub struct CrosswalkContext {
    t_walk_ms: u64,
}

fn stoplight_table() -> FsmTable<StoplightContext, Event> {
    FsmTableBuilder::<StoplightContext, Event>::new()
        .state("Init")
        .state("Green")
        .state("Yellow")
        .state("Red")
        .state("GreenWithButton")
        .state("Done")
        .on_entry("Green", |ctx, h| {
            ctx.cycle_count += 1;
            h.broadcast(Event::Green);
            h.set_timer(LIGHT_TIMER, ctx.t_norm_ms);
        })
        .on_entry("Yellow", |ctx, h| {
            h.broadcast(Event::Yellow);
            h.set_timer(LIGHT_TIMER, ctx.t_fast_ms);
        })
        .on_entry("Red", |ctx, h| {
            h.broadcast(Event::Red);
            h.set_timer(LIGHT_TIMER, ctx.t_norm_ms);
            h.set_timer(BLINK_TIMER, 200);
        })
        .on_exit("Red", |_ctx, h| h.set_timer(BLINK_TIMER, 0))
        .on_entry("GreenWithButton", |ctx, h| {
            h.set_timer(LIGHT_TIMER, ctx.t_but_ms);
        })
        .on_entry("Done", |_ctx, h| h.exit_worker())
        .transition("Init", Event::Init, "Green")
        .transition("Green", Event::LightTimer, "Yellow")
        .transition("Yellow", Event::LightTimer, "Red")
        .transition("Red", Event::LightTimer, "Green")
        .transition("Red", Event::BlinkTimer, "Red")
        .transition("GreenWithButton", Event::LightTimer, "Yellow")
        .guarded_transition("Green", Event::Button, "GreenWithButton", |_ctx, h| {
            h.timer_remaining_ms(LIGHT_TIMER) > 150
        })
        .transition("Init", Event::Done, "Done")
        .transition("Green", Event::Done, "Done")
        .transition("Yellow", Event::Done, "Done")
        .transition("Red", Event::Done, "Done")
        .transition("GreenWithButton", Event::Done, "Done")
        .build("Init")
        .expect("stoplight table must be well-formed")
}

/// Three states (spec §4.7's reference workload only names the stoplight in
/// detail; this mirrors the teacher's `PedestrianFSM` shape): `DontWalk`
/// while the light is anything but red, `Walk` once red is observed, then a
/// `Flash` warning phase timed off its own `WalkTimer` before reverting.
fn crosswalk_table() -> FsmTable<CrosswalkContext, Event> {
    FsmTableBuilder::<CrosswalkContext, Event>::new()
        .state("DontWalk")
        .state("Walk")
        .state("Flash")
        .state("Done")
        .on_entry("Walk", |ctx, h| {
            log::info!("[crosswalk] WALK");
            h.set_timer(WALK_TIMER, ctx.t_walk_ms);
        })
        .on_entry("Flash", |_ctx, h| {
            log::info!("[crosswalk] FLASHING");
            h.set_timer(WALK_TIMER, 150);
        })
        .on_entry("DontWalk", |_ctx, h| {
            log::info!("[crosswalk] DONT WALK");
            h.set_timer(WALK_TIMER, 0);
        })
        .on_entry("Done", |_ctx, h| h.exit_worker())
        .transition("DontWalk", Event::Red, "Walk")
        .transition("Walk", Event::WalkTimer, "Flash")
        .transition("Flash", Event::WalkTimer, "DontWalk")
        .transition("Walk", Event::Green, "DontWalk")
        .transition("Flash", Event::Green, "DontWalk")
        .transition("DontWalk", Event::Done, "Done")
        .transition("Walk", Event::Done, "Done")
        .transition("Flash", Event::Done, "Done")
        .build("DontWalk")
        .expect("crosswalk table must be well-formed")
}

fn main() {
    env_logger::init();

    let runtime = Runtime::<Event>::new();
    runtime
        .register(
            "stoplight",
            Arc::new(stoplight_table()),
            StoplightContext {
                cycle_count: 0,
                t_norm_ms: 1000,
                t_fast_ms: 300,
                t_but_ms: 100,
            },
        )
        .expect("register stoplight");
    runtime
        .register(
            "crosswalk",
            Arc::new(crosswalk_table()),
            CrosswalkContext { t_walk_ms: 500 },
        )
        .expect("register crosswalk");
    runtime
        .create_timer(LIGHT_TIMER, Event::LightTimer)
        .expect("create light timer");
    runtime
        .create_timer(BLINK_TIMER, Event::BlinkTimer)
        .expect("create blink timer");
    runtime
        .create_timer(WALK_TIMER, Event::WalkTimer)
        .expect("create walk timer");

    runtime.broadcast(Event::Init);

    std::thread::sleep(Duration::from_millis(1100));
    println!(
        "after one Green->Yellow: stoplight={:?} crosswalk={:?}",
        runtime.find_by_name("stoplight").unwrap().current_state,
        runtime.find_by_name("crosswalk").unwrap().current_state,
    );

    std::thread::sleep(Duration::from_millis(300));
    println!(
        "after the Yellow phase: stoplight={:?} crosswalk={:?}",
        runtime.find_by_name("stoplight").unwrap().current_state,
        runtime.find_by_name("crosswalk").unwrap().current_state,
    );

    runtime.shutdown(Event::Done).expect("clean shutdown");
}
