//! Common test utilities: a recording host and table payload builders.
//!
//! [`FakeHost`] stands in for the browser. It keeps scroll offsets per
//! element, records every layout command and server command, and queues
//! animation frames and timers until a test fires them. Writing a new
//! scroll offset queues a scroll event for that element, like a browser
//! does, so mirrored writes produce echoes the sync protocol must drop.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use std::collections::{HashMap, VecDeque};

use slicegrid::host::{
    Dom, FrameHandle, FrameScheduler, FrameToken, LazyRequestId, RequestTicket, ServerChannel,
    TimerHandle, TimerToken,
};
use slicegrid::layout::LayoutCommand;
use slicegrid::types::ServerCommand;
use slicegrid::{TableInit, TableRegistry};

#[derive(Debug)]
pub struct FakeHost {
    pub scroll_top: HashMap<String, f64>,
    pub scroll_left: HashMap<String, f64>,
    pub widths: HashMap<String, f64>,
    pub row_height: Option<f64>,
    pub scrollbar_width: f64,
    pub applied: Vec<LayoutCommand>,
    pub sent: Vec<(ServerCommand, Option<RequestTicket>)>,
    pub lazy: Vec<(LazyRequestId, ServerCommand)>,
    pub frames: VecDeque<(FrameHandle, FrameToken)>,
    pub cancelled_frames: Vec<FrameHandle>,
    pub timers: Vec<(TimerHandle, TimerToken, u32)>,
    pub cancelled_timers: Vec<TimerHandle>,
    /// Scroll events caused by offset writes, not yet delivered.
    pub echoes: VecDeque<String>,
    pub blurs: usize,
    next_handle: u64,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            scroll_top: HashMap::new(),
            scroll_left: HashMap::new(),
            widths: HashMap::new(),
            row_height: Some(20.0),
            scrollbar_width: 17.0,
            applied: Vec::new(),
            sent: Vec::new(),
            lazy: Vec::new(),
            frames: VecDeque::new(),
            cancelled_frames: Vec::new(),
            timers: Vec::new(),
            cancelled_timers: Vec::new(),
            echoes: VecDeque::new(),
            blurs: 0,
            next_handle: 0,
        }
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    pub fn top(&self, element: &str) -> f64 {
        self.scroll_top.get(element).copied().unwrap_or(0.0)
    }

    pub fn left(&self, element: &str) -> f64 {
        self.scroll_left.get(element).copied().unwrap_or(0.0)
    }

    /// A user scroll: the offset changes without an echo, the caller
    /// delivers the event.
    pub fn user_scroll_top(&mut self, element: &str, px: f64) {
        self.scroll_top.insert(element.to_string(), px);
    }

    pub fn user_scroll_left(&mut self, element: &str, px: f64) {
        self.scroll_left.insert(element.to_string(), px);
    }

    pub fn take_sent(&mut self) -> Vec<ServerCommand> {
        self.sent.drain(..).map(|(command, _)| command).collect()
    }

    pub fn slice_requests(&self) -> Vec<&ServerCommand> {
        self.sent
            .iter()
            .map(|(command, _)| command)
            .filter(|command| matches!(command, ServerCommand::RequestSlice { .. }))
            .collect()
    }

    pub fn removed(&self) -> Vec<&str> {
        self.applied
            .iter()
            .filter_map(|command| match command {
                LayoutCommand::Remove { target } => Some(target.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}

impl Dom for FakeHost {
    fn scroll_top(&self, element: &str) -> f64 {
        self.top(element)
    }

    fn scroll_left(&self, element: &str) -> f64 {
        self.left(element)
    }

    fn set_scroll_top(&mut self, element: &str, px: f64) {
        let previous = self.scroll_top.insert(element.to_string(), px);
        if previous.map_or(px != 0.0, |previous| previous != px) {
            self.echoes.push_back(element.to_string());
        }
    }

    fn set_scroll_left(&mut self, element: &str, px: f64) {
        let previous = self.scroll_left.insert(element.to_string(), px);
        if previous.map_or(px != 0.0, |previous| previous != px) {
            self.echoes.push_back(element.to_string());
        }
    }

    fn element_width(&self, element: &str) -> f64 {
        self.widths.get(element).copied().unwrap_or(0.0)
    }

    fn vertical_scrollbar_width(&self) -> f64 {
        self.scrollbar_width
    }

    fn rendered_row_height(&self, _slice_element: &str) -> Option<f64> {
        self.row_height
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
        self.applied.push(command.clone());
    }

    fn blur_focus_within(&mut self, _containers: &[String]) -> bool {
        self.blurs += 1;
        false
    }
}

impl ServerChannel for FakeHost {
    fn execute(&mut self, command: ServerCommand, ticket: Option<RequestTicket>) {
        self.sent.push((command, ticket));
    }

    fn execute_or_update_lazy(&mut self, key: LazyRequestId, command: ServerCommand) {
        self.lazy.push((key, command));
    }
}

impl FrameScheduler for FakeHost {
    fn request_animation_frame(&mut self, token: FrameToken) -> FrameHandle {
        let handle = FrameHandle(self.next());
        self.frames.push_back((handle, token));
        handle
    }

    fn cancel_animation_frame(&mut self, handle: FrameHandle) {
        self.frames.retain(|(pending, _)| *pending != handle);
        self.cancelled_frames.push(handle);
    }

    fn set_timeout(&mut self, token: TimerToken, delay_ms: u32) -> TimerHandle {
        let handle = TimerHandle(self.next());
        self.timers.push((handle, token, delay_ms));
        handle
    }

    fn clear_timeout(&mut self, handle: TimerHandle) {
        self.timers.retain(|(pending, _, _)| *pending != handle);
        self.cancelled_timers.push(handle);
    }
}

/// Deliver scroll echoes and run animation frames until both queues are empty.
///
/// Echoes are delivered before the next frame runs, as a browser fires
/// scroll events before the following animation frame.
pub fn run_frames(registry: &mut TableRegistry, host: &mut FakeHost, table_id: &str) {
    for _ in 0..1000 {
        while let Some(element) = host.echoes.pop_front() {
            registry.on_scroll(host, table_id, &element);
        }
        let Some((_, token)) = host.frames.pop_front() else {
            return;
        };
        registry.on_frame(host, &token).unwrap();
    }
    panic!("frames never settled");
}

/// Fire every pending timer once.
pub fn fire_timers(registry: &mut TableRegistry, host: &mut FakeHost) {
    let timers: Vec<_> = host.timers.drain(..).collect();
    for (_, token, _) in timers {
        registry.on_timer(host, &token);
    }
}

/// A split table: one fixed column of 100px, ten flexible columns of 120px,
/// a page of 1000 rows with rows 0..=29 rendered, and a 400px body.
pub fn split_table_json(control_id: &str, display_version: i64) -> String {
    format!(
        r#"{{
            "controlID": "{control_id}",
            "displayVersion": {display_version},
            "firstPageRow": 0,
            "lastPageRow": 999,
            "firstSliceRow": 0,
            "lastSliceRow": 29,
            "availableWidth": 800,
            "availableHeight": 430,
            "headerHeight": 30,
            "borderWidth": 1,
            "fixColumnWidths": [100],
            "flexColumnWidths": [120, 120, 120, 120, 120, 120, 120, 120, 120, 120]
        }}"#
    )
}

pub fn split_table(control_id: &str) -> TableInit {
    TableInit::from_json(&split_table_json(control_id, 1)).unwrap()
}

/// Lay out and show a split table with all frames settled. The initial
/// slice request stays in `host.sent`.
pub fn shown_table(control_id: &str) -> (TableRegistry, FakeHost) {
    let mut registry = TableRegistry::new();
    let mut host = FakeHost::new();
    registry
        .layout_table(&mut host, &split_table(control_id))
        .unwrap();
    registry.run_layout(&mut host).unwrap();
    run_frames(&mut registry, &mut host, control_id);
    (registry, host)
}
