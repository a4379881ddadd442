//! Interactive driver for the stoplight + crosswalk runtime: parses the
//! program arguments and command language and turns them into
//! `broadcast`/`set_timer`/`toggle_timer`/registry calls. This binary is
//! the "external command interpreter" spec.md excludes from the core
//! library's contract — it only ever calls `fsm_runtime::Runtime`'s public
//! API, never its internals.

use std::fs;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use fsm_runtime::{debug_flags, FsmTable, FsmTableBuilder, Runtime};

const LIGHT_TIMER: u32 = 1;
const BLINK_TIMER: u32 = 2;
const WALK_TIMER: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
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

/// Maps the numeric ids the `eN` command accepts onto actual events
/// (spec §6). Unrecognized ids are reported and otherwise ignored
/// (Scenario F).
fn event_by_id(id: u32) -> Option<Event> {
    match id {
        0 => Some(Event::Init),
        1 => Some(Event::Done),
        2 => Some(Event::LightTimer),
        3 => Some(Event::BlinkTimer),
        4 => Some(Event::WalkTimer),
        5 => Some(Event::Button),
        6 => Some(Event::Green),
        7 => Some(Event::Yellow),
        8 => Some(Event::Red),
        _ => None,
    }
}

struct StoplightContext {
    cycle_count: u32,
    t_norm_ms: u64,
    t_fast_ms: u64,
    t_but_ms: u64,
}

struct CrosswalkContext {
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
        .guarded_transition("Green", Event::Button, "GreenWithButton", |ctx, h| {
            h.timer_remaining_ms(LIGHT_TIMER) > ctx.t_but_ms
        })
        .transition("Init", Event::Done, "Done")
        .transition("Green", Event::Done, "Done")
        .transition("Yellow", Event::Done, "Done")
        .transition("Red", Event::Done, "Done")
        .transition("GreenWithButton", Event::Done, "Done")
        .build("Init")
        .expect("stoplight table must be well-formed")
}

fn crosswalk_table() -> FsmTable<CrosswalkContext, Event> {
    FsmTableBuilder::<CrosswalkContext, Event>::new()
        .state("DontWalk")
        .state("Walk")
        .state("Flash")
        .state("Done")
        .on_entry("Walk", |ctx, h| h.set_timer(WALK_TIMER, ctx.t_walk_ms))
        .on_entry("Flash", |_ctx, h| h.set_timer(WALK_TIMER, 150))
        .on_entry("DontWalk", |_ctx, h| h.set_timer(WALK_TIMER, 0))
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

/// Program arguments (spec §6: "owned by external collaborator" — the core
/// library never sees `clap`, only this binary does).
#[derive(Parser, Debug)]
#[command(name = "stoplight_cli", about = "Stoplight + crosswalk FSM runtime driver")]
struct Args {
    /// Base tick multiplier (ms) applied to all workload timeouts.
    #[arg(short = 't', long, default_value_t = 100)]
    tick: u64,

    /// Script file path; tokens are fed to the command interpreter.
    #[arg(short = 's', long)]
    script: Option<String>,

    /// Non-interactive: read only from the script, never from stdin.
    #[arg(short = 'n', long, default_value_t = false)]
    non_interactive: bool,

    /// Debug-flags bitmask in hex (e.g. `0x11`). See [`debug_flags`].
    #[arg(short = 'd', long)]
    debug: Option<String>,
}

fn print_help() {
    println!("Commands:");
    println!("  g        broadcast Init (start the FSMs)");
    println!("  b        broadcast Button");
    println!("  eN       broadcast the event with numeric id N");
    println!("  tN       toggle timer N");
    println!("  n N      sleep N * tick ms");
    println!("  s        diagnostic snapshot");
    println!("  w        worker registry snapshot");
    println!("  r        re-read the configured script file");
    println!("  h        this help");
    println!("  x, q     broadcast Done and shut down");
}

fn print_snapshot(runtime: &Runtime<Event>, tick: u64) {
    for worker in runtime.show() {
        println!("{}:ts={:.3} state={}", worker.name, now_secs(), worker.current_state);
    }
    for id in [LIGHT_TIMER, BLINK_TIMER, WALK_TIMER] {
        let remaining = runtime.get_timer(id).unwrap_or(0);
        let period = runtime.get_period(id).unwrap_or(0);
        println!("timer{id}:remaining={remaining}ms period={period}ms (tick={tick}ms)");
    }
}

fn now_secs() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Runs one token against the runtime. Returns `false` when the caller
/// should stop reading further tokens (an `x`/`q` was seen).
fn run_token<'a>(
    token: &str,
    rest: &mut std::iter::Peekable<impl Iterator<Item = &'a str>>,
    runtime: &Runtime<Event>,
    tick: u64,
    script: &Option<String>,
) -> bool {
    if token == "g" {
        runtime.broadcast(Event::Init);
    } else if token == "b" {
        runtime.broadcast(Event::Button);
    } else if token == "s" {
        print_snapshot(runtime, tick);
    } else if token == "w" {
        for worker in runtime.show() {
            println!("worker {} state={}", worker.name, worker.current_state);
        }
    } else if token == "h" {
        print_help();
    } else if token == "r" {
        if let Some(path) = script {
            run_script(path, runtime, tick);
        } else {
            log::warn!("'r' with no -s script configured, ignored");
        }
    } else if token == "x" || token == "q" {
        return false;
    } else if let Some(n) = token.strip_prefix('e') {
        match n.parse::<u32>().ok().and_then(event_by_id) {
            Some(event) => runtime.broadcast(event),
            None => log::warn!("unrecognized event id {n:?}, token {token:?} ignored"),
        }
    } else if let Some(n) = token.strip_prefix('t') {
        match n.parse::<u32>() {
            Ok(id) => {
                if let Err(e) = runtime.toggle_timer(id) {
                    log::warn!("toggle_timer({id}) failed: {e}");
                }
            }
            Err(_) => log::warn!("malformed token {token:?} ignored"),
        }
    } else if token == "n" {
        match rest.peek().and_then(|t| t.parse::<u64>().ok()) {
            Some(count) => {
                rest.next();
                std::thread::sleep(Duration::from_millis(count * tick));
            }
            None => log::warn!("'n' with no numeric argument ignored"),
        }
    } else if let Some(n) = token.strip_prefix('n') {
        match n.parse::<u64>() {
            Ok(count) => std::thread::sleep(Duration::from_millis(count * tick)),
            Err(_) => log::warn!("malformed token {token:?} ignored"),
        }
    } else {
        log::warn!("unknown token {token:?} ignored");
    }
    true
}

fn run_tokens(text: &str, runtime: &Runtime<Event>, tick: u64, script: &Option<String>) -> bool {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut it = tokens.into_iter().peekable();
    while let Some(token) = it.next() {
        if !run_token(token, &mut it, runtime, tick, script) {
            return false;
        }
    }
    true
}

fn run_script(path: &str, runtime: &Runtime<Event>, tick: u64) -> bool {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("failed to read script {path:?}: {e}");
            return true;
        }
    };
    for line in contents.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        if !run_tokens(line, runtime, tick, &Some(path.to_string())) {
            return false;
        }
    }
    true
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let debug_mask = args
        .debug
        .as_deref()
        .map(|s| s.trim_start_matches("0x"))
        .and_then(|s| u32::from_str_radix(s, 16).ok())
        .unwrap_or(0);

    let runtime = Runtime::<Event>::new();
    runtime.set_debug_flags(debug_mask);
    if debug_mask & debug_flags::WORKER_LIFECYCLE != 0 {
        log::info!("debug flags active: {debug_mask:#x}");
    }

    runtime
        .register(
            "stoplight",
            Arc::new(stoplight_table()),
            StoplightContext {
                cycle_count: 0,
                t_norm_ms: 10 * args.tick,
                t_fast_ms: 3 * args.tick,
                t_but_ms: args.tick,
            },
        )
        .expect("register stoplight");
    runtime
        .register(
            "crosswalk",
            Arc::new(crosswalk_table()),
            CrosswalkContext {
                t_walk_ms: 5 * args.tick,
            },
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

    let shutdown_requested = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown_requested);
        if let Err(e) = ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
        }) {
            log::warn!("failed to install Ctrl-C handler: {e}");
        }
    }

    if let Some(path) = &args.script {
        run_script(path, &runtime, args.tick);
    }

    if !args.non_interactive {
        let stdin = io::stdin();
        print!("> ");
        let _ = io::stdout().flush();
        for line in stdin.lock().lines() {
            if shutdown_requested.load(Ordering::SeqCst) {
                break;
            }
            let Ok(line) = line else { break };
            if !run_tokens(&line, &runtime, args.tick, &args.script) {
                break;
            }
            print!("> ");
            let _ = io::stdout().flush();
        }
    }

    runtime.shutdown(Event::Done).expect("clean shutdown");
    std::process::exit(0);
}
