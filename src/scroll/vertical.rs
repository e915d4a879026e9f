use crate::host::{Axis, FrameScheduler, SyncStep, TableHost, TimerHandle, TimerKind, TimerToken};
use crate::ids;
use crate::table::SliceManager;

use super::sync::ListenerSync;

const SCROLLBAR: usize = 0;
const FIX_BODY: usize = 1;
const FLEX_BODY: usize = 2;

/// Keeps the decoupled vertical scrollbar and both body parts at the same
/// vertical offset and tells the slice manager once scrolling settles.
#[derive(Debug)]
pub struct VerticalScrollManager {
    table_id: String,
    /// Element ids indexed by source.
    elements: [Option<String>; 3],
    sync: ListenerSync,
    settle_delay_ms: u32,
    settle_timer: Option<TimerHandle>,
    settled_position: Option<f64>,
}

impl VerticalScrollManager {
    pub fn new(table_id: &str, settle_delay_ms: u32) -> Self {
        Self {
            table_id: table_id.to_string(),
            elements: [None, None, None],
            sync: ListenerSync::new(table_id, Axis::Vertical, 3),
            settle_delay_ms,
            settle_timer: None,
            settled_position: None,
        }
    }

    pub fn set_scrollbar(&mut self, element: &str) {
        self.elements[SCROLLBAR] = Some(element.to_string());
    }

    pub fn set_fix_body(&mut self, element: &str) {
        self.elements[FIX_BODY] = Some(element.to_string());
    }

    pub fn set_flex_body(&mut self, element: &str) {
        self.elements[FLEX_BODY] = Some(element.to_string());
    }

    pub fn sync(&self) -> &ListenerSync {
        &self.sync
    }

    fn source_of(&self, element: &str) -> Option<usize> {
        self.elements
            .iter()
            .position(|candidate| candidate.as_deref() == Some(element))
    }

    fn element(&self, source: usize) -> Option<&str> {
        self.elements.get(source).and_then(Option::as_deref)
    }

    /// Whether `element` is one of the linked elements.
    pub fn handles(&self, element: &str) -> bool {
        self.source_of(element).is_some()
    }

    /// Offset the viewports currently hold; the fixed part is the reference.
    fn reference_position(&self, manager: &SliceManager) -> Option<f64> {
        [FIX_BODY, FLEX_BODY]
            .into_iter()
            .filter_map(|source| self.element(source))
            .find_map(|body| manager.viewport(&ids::viewport_id(body)))
            .map(|viewport| viewport.vertical_position())
    }

    /// A native scroll event fired on `element`.
    pub fn on_scroll<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S, element: &str) -> bool {
        match self.source_of(element) {
            Some(source) => self.sync.on_scroll(scheduler, source),
            None => false,
        }
    }

    /// A wheel turned over one of the body parts: the decoupled scrollbar
    /// takes the delta and the event is handled as a scrollbar scroll.
    pub fn on_wheel<H: TableHost + ?Sized>(&mut self, host: &mut H, delta_y: f64) -> bool {
        let Some(scrollbar) = self.elements[SCROLLBAR].clone() else {
            return false;
        };
        let position = (host.scroll_top(&scrollbar) + delta_y).max(0.0);
        host.set_scroll_top(&scrollbar, position);
        self.sync.on_scroll(host, SCROLLBAR)
    }

    pub fn on_frame<H: TableHost + ?Sized>(
        &mut self,
        host: &mut H,
        manager: &mut SliceManager,
        step: SyncStep,
    ) {
        match step {
            SyncStep::Apply { source } => {
                if self.sync.begin_apply(source).is_some() {
                    self.mirror(host, manager, source);
                    self.sync.finish_apply(host);
                }
            }
            SyncStep::Rearm { source } => self.sync.rearm(source),
        }
    }

    fn mirror<H: TableHost + ?Sized>(&mut self, host: &mut H, manager: &mut SliceManager, source: usize) {
        let Some(origin) = self.element(source).map(str::to_string) else {
            return;
        };
        let position = host.scroll_top(&origin);
        let changed = self
            .reference_position(manager)
            .is_some_and(|current| (current - position).abs() > f64::EPSILON);
        if !changed {
            return;
        }
        for (index, element) in self.elements.iter().enumerate() {
            if let (true, Some(element)) = (index != source, element) {
                host.set_scroll_top(element, position);
            }
        }
        manager.set_vertical_position(host, position);
        self.schedule_settle(host, position);
    }

    /// Restart the settle timer for `position`.
    fn schedule_settle<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S, position: f64) {
        if let Some(handle) = self.settle_timer.take() {
            scheduler.clear_timeout(handle);
        }
        self.settled_position = Some(position);
        self.settle_timer = Some(scheduler.set_timeout(
            TimerToken {
                table_id: self.table_id.clone(),
                kind: TimerKind::ScrollSettled,
            },
            self.settle_delay_ms,
        ));
    }

    /// The settle timer fired: re-evaluate the row window.
    pub fn on_settled<H: TableHost + ?Sized>(&mut self, host: &mut H, manager: &mut SliceManager) {
        self.settle_timer = None;
        if let Some(position) = self.settled_position.take() {
            manager.position_update(host, position);
        }
    }

    /// Put every linked element and viewport at `position` without
    /// going through the mirroring protocol.
    pub fn init_scroll_position<H: TableHost + ?Sized>(
        &mut self,
        host: &mut H,
        manager: &mut SliceManager,
        position: f64,
    ) {
        for element in self.elements.iter().flatten() {
            host.set_scroll_top(element, position);
        }
        manager.set_vertical_position(host, position);
    }

    /// Drop pending frames and the settle timer.
    pub fn cancel_all<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) {
        self.sync.cancel(scheduler);
        if let Some(handle) = self.settle_timer.take() {
            scheduler.clear_timeout(handle);
        }
        self.settled_position = None;
    }
}
