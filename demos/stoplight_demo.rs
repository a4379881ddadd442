//! Stoplight: the reference single-FSM workload.
//!
//! `Init -> Green -> Yellow -> Red -> Green -> ...`, with a guarded button
//! press that cuts the green phase short unless too little time remains on
//! the light timer. Run with `cargo run --example stoplight_demo`.

use std::sync::Arc;
use std::time::Duration;

use fsm_runtime::{FsmTableBuilder, Runtime};

const LIGHT_TIMER: u32 = 1;
const BLINK_TIMER: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Init,
    Done,
    LightTimer,
    BlinkTimer,
    Button,
    Green,
    Yellow,
    Red,
}

pub struct StoplightContext {
    pub cycle_count: u32,
    pub t_norm_ms: u64,
    pub t_fast_ms: u64,
    pub t_but_ms: u64,
}

fn build_table() -> fsm_runtime::FsmTable<StoplightContext, Event> {
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
            log::info!("[stoplight] cycle {} -> GREEN", ctx.cycle_count);
        })
        .on_entry("Yellow", |ctx, h| {
            h.broadcast(Event::Yellow);
            h.set_timer(LIGHT_TIMER, ctx.t_fast_ms);
            log::info!("[stoplight] -> YELLOW");
        })
        .on_entry("Red", |ctx, h| {
            h.broadcast(Event::Red);
            h.set_timer(LIGHT_TIMER, ctx.t_norm_ms);
            // Blinks the "don't walk" indicator the crosswalk watches for;
            // re-entering Red on its own BlinkTimer just keeps it blinking.
            h.set_timer(BLINK_TIMER, 200);
            log::info!("[stoplight] -> RED");
        })
        .on_exit("Red", |_ctx, h| {
            h.set_timer(BLINK_TIMER, 0);
        })
        .on_entry("GreenWithButton", |ctx, h| {
            h.set_timer(LIGHT_TIMER, ctx.t_but_ms);
            log::info!("[stoplight] button honored, light timer reset to {}ms", ctx.t_but_ms);
        })
        .on_entry("Done", |_ctx, h| {
            h.exit_worker();
        })
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

fn main() {
    env_logger::init();

    let runtime = Runtime::<Event>::new();
    let ctx = StoplightContext {
        cycle_count: 0,
        t_norm_ms: 1000,
        t_fast_ms: 300,
        t_but_ms: 100,
    };
    runtime
        .register("stoplight", Arc::new(build_table()), ctx)
        .expect("register stoplight");
    runtime
        .create_timer(LIGHT_TIMER, Event::LightTimer)
        .expect("create light timer");
    runtime
        .create_timer(BLINK_TIMER, Event::BlinkTimer)
        .expect("create blink timer");

    runtime.broadcast(Event::Init);
    std::thread::sleep(Duration::from_millis(3500));

    let snapshot = runtime.find_by_name("stoplight").unwrap();
    println!("stoplight is now in state {:?}", snapshot.current_state);

    runtime.shutdown(Event::Done).expect("clean shutdown");
}
