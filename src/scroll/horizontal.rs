use crate::error::Result;
use crate::host::{Axis, FrameScheduler, SyncStep, TableHost};
use crate::ids;
use crate::table::SliceManager;

use super::sync::ListenerSync;

const SCROLLBAR: usize = 0;
const FLEX_HEADER: usize = 1;
const FLEX_BODY: usize = 2;

/// Keeps the decoupled horizontal scrollbar, the flexible header and the
/// flexible body at the same horizontal offset.
///
/// The scrollbar spans the whole available width while the flexible body
/// only gets `flex_width` of it, so scrollbar offsets are body offsets
/// scaled by `available_width / flex_width`.
#[derive(Debug)]
pub struct HorizontalScrollManager {
    elements: [Option<String>; 3],
    sync: ListenerSync,
    available_width: f64,
    flex_width: f64,
}

impl HorizontalScrollManager {
    pub fn new(table_id: &str, available_width: f64, flex_width: f64) -> Self {
        Self {
            elements: [None, None, None],
            sync: ListenerSync::new(table_id, Axis::Horizontal, 3),
            available_width,
            flex_width,
        }
    }

    pub fn set_scrollbar(&mut self, element: &str) {
        self.elements[SCROLLBAR] = Some(element.to_string());
    }

    pub fn set_flex_header(&mut self, element: &str) {
        self.elements[FLEX_HEADER] = Some(element.to_string());
    }

    pub fn set_flex_body(&mut self, element: &str) {
        self.elements[FLEX_BODY] = Some(element.to_string());
    }

    pub fn set_available_width(&mut self, width: f64) {
        self.available_width = width;
    }

    pub fn set_flex_width(&mut self, width: f64) {
        self.flex_width = width;
    }

    pub fn available_width(&self) -> f64 {
        self.available_width
    }

    pub fn flex_width(&self) -> f64 {
        self.flex_width
    }

    pub fn sync(&self) -> &ListenerSync {
        &self.sync
    }

    /// Scrollbar travel per pixel of body travel.
    pub fn ratio(&self) -> f64 {
        if self.flex_width > 0.0 {
            self.available_width / self.flex_width
        } else {
            1.0
        }
    }

    pub fn scrollbar_position(&self, body_position: f64) -> f64 {
        (body_position * self.ratio()).round()
    }

    pub fn body_position(&self, scrollbar_position: f64) -> f64 {
        (scrollbar_position / self.ratio()).round()
    }

    fn source_of(&self, element: &str) -> Option<usize> {
        self.elements
            .iter()
            .position(|candidate| candidate.as_deref() == Some(element))
    }

    fn element(&self, source: usize) -> Option<&str> {
        self.elements.get(source).and_then(Option::as_deref)
    }

    pub fn handles(&self, element: &str) -> bool {
        self.source_of(element).is_some()
    }

    fn flex_viewport_id(&self) -> Option<String> {
        self.element(FLEX_BODY).map(ids::viewport_id)
    }

    pub fn on_scroll<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S, element: &str) -> bool {
        match self.source_of(element) {
            Some(source) => self.sync.on_scroll(scheduler, source),
            None => false,
        }
    }

    /// Re-read the scrollbar after the widths changed.
    pub fn rescale<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) -> bool {
        self.elements[SCROLLBAR].is_some() && self.sync.on_scroll(scheduler, SCROLLBAR)
    }

    pub fn on_frame<H: TableHost + ?Sized>(
        &mut self,
        host: &mut H,
        manager: &mut SliceManager,
        step: SyncStep,
    ) -> Result<()> {
        match step {
            SyncStep::Apply { source } => {
                if self.sync.begin_apply(source).is_some() {
                    let mirrored = self.mirror(host, manager, source);
                    self.sync.finish_apply(host);
                    mirrored?;
                }
            }
            SyncStep::Rearm { source } => self.sync.rearm(source),
        }
        Ok(())
    }

    fn mirror<H: TableHost + ?Sized>(
        &mut self,
        host: &mut H,
        manager: &mut SliceManager,
        source: usize,
    ) -> Result<()> {
        let (Some(origin), Some(viewport_id)) =
            (self.element(source).map(str::to_string), self.flex_viewport_id())
        else {
            return Ok(());
        };
        let Some(current) = manager.viewport(&viewport_id).map(|vp| vp.horizontal_position()) else {
            return Ok(());
        };

        let raw = host.scroll_left(&origin);
        let (body, scrollbar) = if source == SCROLLBAR {
            (self.body_position(raw), raw)
        } else {
            (raw, self.scrollbar_position(raw))
        };
        if (current - body).abs() <= f64::EPSILON {
            return Ok(());
        }

        for (index, element) in self.elements.iter().enumerate() {
            let Some(element) = element else { continue };
            if index == source {
                continue;
            }
            let px = if index == SCROLLBAR { scrollbar } else { body };
            host.set_scroll_left(element, px);
        }
        tracing::trace!(target: "slicegrid", source, body, scrollbar, "horizontal offsets mirrored");
        manager.set_horizontal_position(host, &viewport_id, body)
    }

    /// Put all linked elements at body offset `position` without going
    /// through the mirroring protocol. Needs every element to be bound.
    pub fn init_scroll_position<H: TableHost + ?Sized>(
        &mut self,
        host: &mut H,
        manager: &mut SliceManager,
        position: f64,
    ) -> Result<()> {
        let (Some(scrollbar), Some(header), Some(body)) = (
            self.element(SCROLLBAR),
            self.element(FLEX_HEADER),
            self.element(FLEX_BODY),
        ) else {
            return Ok(());
        };
        host.set_scroll_left(scrollbar, self.scrollbar_position(position));
        host.set_scroll_left(header, position);
        host.set_scroll_left(body, position);
        let viewport_id = ids::viewport_id(body);
        manager.set_horizontal_position(host, &viewport_id, position)
    }

    pub fn cancel_all<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) {
        self.sync.cancel(scheduler);
    }
}
