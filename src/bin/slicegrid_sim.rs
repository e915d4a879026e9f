//! Headless scroll simulation for slicegrid
//!
//! Lays out a table from a server layout payload, scrolls it to each given
//! vertical position and prints every command the table sends to the server,
//! one JSON object per line. Slice requests are answered immediately.
//!
//! Usage:
//!   slicegrid_sim <layout.json> [position ...]            # Commands to stdout
//!   slicegrid_sim <layout.json> [position ...] --report   # Plus slice report

#![allow(clippy::exit)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]

use std::collections::{HashMap, VecDeque};
use std::env;
use std::fs;

use slicegrid::host::{
    Dom, FrameHandle, FrameScheduler, FrameToken, LazyRequestId, RequestTicket, ServerChannel,
    TimerHandle, TimerToken,
};
use slicegrid::layout::LayoutCommand;
use slicegrid::types::ServerCommand;
use slicegrid::{ids, LayoutOutcome, OutgoingRequest, RequestQueue, TableInit, TableRegistry};

/// Row height announced by every simulated slice.
const ROW_HEIGHT: f64 = 20.0;

/// Browser stand-in: scroll offsets, a request queue and pending callbacks.
#[derive(Default)]
struct SimHost {
    scroll_top: HashMap<String, f64>,
    scroll_left: HashMap<String, f64>,
    widths: HashMap<String, f64>,
    queue: RequestQueue,
    frames: VecDeque<(FrameHandle, FrameToken)>,
    timers: Vec<(TimerHandle, TimerToken)>,
    next_handle: u64,
    applied: usize,
}

impl SimHost {
    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl Dom for SimHost {
    fn scroll_top(&self, element: &str) -> f64 {
        self.scroll_top.get(element).copied().unwrap_or(0.0)
    }

    fn scroll_left(&self, element: &str) -> f64 {
        self.scroll_left.get(element).copied().unwrap_or(0.0)
    }

    fn set_scroll_top(&mut self, element: &str, px: f64) {
        self.scroll_top.insert(element.to_string(), px);
    }

    fn set_scroll_left(&mut self, element: &str, px: f64) {
        self.scroll_left.insert(element.to_string(), px);
    }

    fn element_width(&self, element: &str) -> f64 {
        self.widths.get(element).copied().unwrap_or(0.0)
    }

    fn vertical_scrollbar_width(&self) -> f64 {
        17.0
    }

    fn rendered_row_height(&self, _slice_element: &str) -> Option<f64> {
        Some(ROW_HEIGHT)
    }

    fn apply(&mut self, command: &LayoutCommand) {
        match command {
            LayoutCommand::SetScrollTop { target, px } => self.set_scroll_top(target, *px),
            LayoutCommand::SetScrollLeft { target, px } => self.set_scroll_left(target, *px),
            LayoutCommand::SetWidth { target, width } => {
                self.widths.insert(target.clone(), *width);
            }
            _ => {}
        }
        self.applied += 1;
    }

    fn blur_focus_within(&mut self, _containers: &[String]) -> bool {
        false
    }
}

impl ServerChannel for SimHost {
    fn execute(&mut self, command: ServerCommand, ticket: Option<RequestTicket>) {
        self.queue.execute(command, ticket);
    }

    fn execute_or_update_lazy(&mut self, key: LazyRequestId, command: ServerCommand) {
        self.queue.execute_or_update_lazy(key, command);
    }
}

impl FrameScheduler for SimHost {
    fn request_animation_frame(&mut self, token: FrameToken) -> FrameHandle {
        let handle = FrameHandle(self.next());
        self.frames.push_back((handle, token));
        handle
    }

    fn cancel_animation_frame(&mut self, handle: FrameHandle) {
        self.frames.retain(|(pending, _)| *pending != handle);
    }

    fn set_timeout(&mut self, token: TimerToken, _delay_ms: u32) -> TimerHandle {
        let handle = TimerHandle(self.next());
        self.timers.push((handle, token));
        handle
    }

    fn clear_timeout(&mut self, handle: TimerHandle) {
        self.timers.retain(|(pending, _)| *pending != handle);
    }
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

/// Print a request and answer it the way the server would.
fn answer(registry: &mut TableRegistry, host: &mut SimHost, request: OutgoingRequest) {
    match serde_json::to_string(&request.command) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(&format!("serializing command: {}", e)),
    }

    let table_id = request.command.control_id().to_string();
    if let ServerCommand::RequestSlice {
        slice_id_part,
        slice_first_row,
        slice_last_row,
        ..
    } = &request.command
    {
        let containers: Vec<String> = registry
            .get(&table_id)
            .map(|session| {
                session
                    .manager()
                    .viewports()
                    .iter()
                    .map(|viewport| viewport.container_id().to_string())
                    .collect()
            })
            .unwrap_or_default();
        let rows = slice_last_row - slice_first_row + 1;
        for container in containers {
            let slice = ids::slice_id(&container, *slice_id_part);
            if let Err(e) = registry.insert_slice(host, &table_id, &container, &slice, rows) {
                fail(&e.to_string());
            }
        }
    }
    if let Some(ticket) = request.ticket {
        registry.request_completed(host, &table_id, ticket);
    }
    if let Some(key) = &request.lazy_key {
        host.queue.complete_lazy(key);
    }
}

/// Run frames, timers and server round trips until nothing is left.
fn settle(registry: &mut TableRegistry, host: &mut SimHost) {
    for _ in 0..10_000 {
        if let Some((_, token)) = host.frames.pop_front() {
            if let Err(e) = registry.on_frame(host, &token) {
                fail(&e.to_string());
            }
            continue;
        }
        if let Some(request) = host.queue.pop() {
            answer(registry, host, request);
            continue;
        }
        if host.timers.is_empty() {
            return;
        }
        let timers: Vec<_> = host.timers.drain(..).collect();
        for (_, token) in timers {
            registry.on_timer(host, &token);
        }
    }
    fail("simulation did not settle");
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: slicegrid_sim <layout.json> [position ...] [--report]");
        std::process::exit(1);
    }

    let input_path = &args[1];
    let report = args.iter().any(|arg| arg == "--report");
    let positions: Vec<f64> = args[2..]
        .iter()
        .filter(|arg| arg.as_str() != "--report")
        .map(|arg| {
            arg.parse()
                .unwrap_or_else(|_| fail(&format!("invalid position '{}'", arg)))
        })
        .collect();

    // Read layout payload
    let json = match fs::read_to_string(input_path) {
        Ok(j) => j,
        Err(e) => fail(&format!("reading {}: {}", input_path, e)),
    };
    let init = match TableInit::from_json(&json) {
        Ok(init) => init,
        Err(e) => fail(&e.to_string()),
    };

    let mut registry = TableRegistry::new();
    let mut host = SimHost::default();

    match registry.layout_table(&mut host, &init) {
        Ok(LayoutOutcome::ReloadRequested {
            fixed_column_amount,
        }) => {
            eprintln!("Fixed columns do not fit, server asked for {}", fixed_column_amount);
            settle(&mut registry, &mut host);
            return;
        }
        Ok(_) => {}
        Err(e) => fail(&e.to_string()),
    }
    if let Err(e) = registry.run_layout(&mut host) {
        fail(&e.to_string());
    }
    settle(&mut registry, &mut host);

    // Scroll
    let scrollbar = ids::vertical_scrollbar_id(&init.control_id);
    for position in positions {
        host.set_scroll_top(&scrollbar, position);
        registry.on_scroll(&mut host, &init.control_id, &scrollbar);
        settle(&mut registry, &mut host);
    }

    if report {
        if let Some(session) = registry.get(&init.control_id) {
            eprintln!("{}", session.manager().report_state("Simulation finished"));
        }
    }
    eprintln!("Layout writes: {}", host.applied);
}
