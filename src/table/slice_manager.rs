//! Row window management for one table.
//!
//! The manager keeps the viewports of a table row-synchronous: every slice
//! is requested, positioned and dismissed in all viewports at once. On each
//! settled scroll position it drops slices far away from the visible area and
//! requests missing rows next to the held range.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::error::{Result, SliceGridError};
use crate::host::{Dom, RequestTicket, ServerChannel};
use crate::ids;
use crate::layout::{LayoutCommand, LayoutQueue};
use crate::position::RowGeometry;
use crate::types::{DisplayVersion, PageRange, PixelWindow, RowRange, ServerCommand};

use super::{InsertStrategy, Slice, Viewport, WindowPolicy};

/// Everything needed to set up the manager of a freshly rendered table.
#[derive(Debug, Clone)]
pub struct ManagerInit {
    pub table_id: String,
    pub display_version: DisplayVersion,
    pub visible_height: f64,
    /// Current page; `None` for an empty page.
    pub page: Option<PageRange>,
    /// Rows rendered into the initial slice; `None` if it is empty.
    pub initial_rows: Option<RowRange>,
    pub policy: WindowPolicy,
}

/// Slices dismissed during one position update, with the boundaries reported to the server.
#[derive(Debug, Default)]
struct Dismissal {
    slices: Vec<Slice>,
    boundaries: Vec<u32>,
}

#[derive(Debug)]
pub struct SliceManager {
    table_id: String,
    display_version: DisplayVersion,
    policy: WindowPolicy,
    visible_height: f64,
    page: Option<PageRange>,
    row_height: f64,
    content_height: f64,
    viewports: Vec<Viewport>,
    next_slice_part: u64,
    next_ticket: u64,
    /// Displayed slices whose removal waits for a request to complete.
    pending_removals: HashMap<RequestTicket, Vec<Slice>>,
}

impl SliceManager {
    /// Create the manager and register the server-rendered initial slice
    /// (`slice-0`) in every viewport.
    ///
    /// The row height is taken from the rendered initial slice; positioning
    /// of the initial slice and the content height are queued on `layout`.
    pub fn new<D: Dom + ?Sized>(
        init: ManagerInit,
        mut viewports: Vec<Viewport>,
        dom: &D,
        layout: &mut LayoutQueue,
    ) -> Result<Self> {
        if viewports.is_empty() {
            return Err(SliceGridError::InvalidTableStructure {
                table_id: init.table_id,
                reason: "no body part".to_string(),
            });
        }

        let mut row_height = 0.0;
        if let (Some(_), Some(first)) = (init.initial_rows, viewports.first()) {
            let slice_id = ids::slice_id(first.container_id(), ids::INITIAL_SLICE_ID);
            row_height = dom.rendered_row_height(&slice_id).ok_or_else(|| {
                SliceGridError::MissingLayoutAttribute {
                    element: slice_id.clone(),
                    attribute: "row-height".to_string(),
                }
            })?;
        }

        let page_rows = init.page.map_or(0, |page| page.row_count());
        let content_height = row_height * f64::from(page_rows);
        let page_start = init.page.map_or(0, |page| page.first_row);

        for viewport in &mut viewports {
            viewport.init_height(layout, content_height);
            let Some(rows) = init.initial_rows else {
                continue;
            };
            let slice_id = ids::slice_id(viewport.container_id(), ids::INITIAL_SLICE_ID);
            let position = f64::from(rows.first.saturating_sub(page_start)) * row_height;
            let mut slice = Slice::pending(
                slice_id.clone(),
                ids::INITIAL_SLICE_ID,
                position,
                InsertStrategy::Below,
                rows,
                row_height,
            );
            slice.mark_displayed();
            viewport.append_slice(slice);
            layout.add_layout(LayoutCommand::SetPosition {
                target: slice_id.clone(),
                x: 0.0,
                y: position,
            });
            layout.add_layout(LayoutCommand::SetWidth {
                target: slice_id,
                width: viewport.width(),
            });
        }

        tracing::debug!(
            target: "slicegrid",
            table = %init.table_id,
            row_height,
            page_rows,
            viewports = viewports.len(),
            "slice manager created"
        );

        Ok(Self {
            table_id: init.table_id,
            display_version: init.display_version,
            policy: init.policy,
            visible_height: init.visible_height.max(1.0),
            page: init.page,
            row_height,
            content_height,
            viewports,
            next_slice_part: ids::INITIAL_SLICE_ID + 1,
            next_ticket: 0,
            pending_removals: HashMap::new(),
        })
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn display_version(&self) -> DisplayVersion {
        self.display_version
    }

    pub fn policy(&self) -> &WindowPolicy {
        &self.policy
    }

    pub fn row_height(&self) -> f64 {
        self.row_height
    }

    pub fn visible_height(&self) -> f64 {
        self.visible_height
    }

    pub fn page(&self) -> Option<PageRange> {
        self.page
    }

    pub fn first_page_row(&self) -> u32 {
        self.page.map_or(0, |page| page.first_row)
    }

    pub fn page_row_count(&self) -> u32 {
        self.page.map_or(0, |page| page.row_count())
    }

    pub fn set_page_range(&mut self, page: Option<PageRange>) {
        self.page = page;
    }

    /// Height of the full page in pixels, as last applied to the viewports.
    pub fn viewport_content_height(&self) -> f64 {
        self.content_height
    }

    pub fn geometry(&self) -> RowGeometry {
        RowGeometry {
            first_page_row: self.first_page_row(),
            row_height: self.row_height,
        }
    }

    pub fn viewports(&self) -> &[Viewport] {
        &self.viewports
    }

    pub fn viewport(&self, container_id: &str) -> Option<&Viewport> {
        self.viewports
            .iter()
            .find(|viewport| viewport.container_id() == container_id)
    }

    pub fn viewport_mut(&mut self, container_id: &str) -> Option<&mut Viewport> {
        self.viewports
            .iter_mut()
            .find(|viewport| viewport.container_id() == container_id)
    }

    fn viewport_index(&self, container_id: &str) -> Result<usize> {
        self.viewports
            .iter()
            .position(|viewport| viewport.container_id() == container_id)
            .ok_or_else(|| SliceGridError::UnknownViewport {
                table_id: self.table_id.clone(),
                viewport_id: container_id.to_string(),
            })
    }

    fn reference_slices(&self) -> &[Slice] {
        match self.viewports.first() {
            Some(viewport) => viewport.slices(),
            None => &[],
        }
    }

    pub fn has_slices(&self) -> bool {
        !self.reference_slices().is_empty()
    }

    /// Rows currently held, from the first row of the first slice to the
    /// last row of the last slice.
    pub fn displayed_rows(&self) -> Option<RowRange> {
        let slices = self.reference_slices();
        let first = slices.first()?;
        let last = slices.last()?;
        RowRange::new(first.first_row(), last.last_row())
    }

    pub fn page_start_position(&self) -> f64 {
        0.0
    }

    pub fn page_end_position(&self) -> f64 {
        f64::from(self.page_row_count()) * self.row_height
    }

    /// Top of the held range, `0` if nothing is held.
    pub fn range_start_position(&self) -> f64 {
        self.reference_slices()
            .first()
            .map_or(0.0, Slice::upper_bound)
    }

    /// Bottom of the held range, `-1` if nothing is held.
    pub fn range_stop_position(&self) -> f64 {
        self.reference_slices()
            .last()
            .map_or(-1.0, Slice::lower_bound)
    }

    /// First row whose area starts at or before `position`.
    #[allow(clippy::cast_possible_truncation)] // floor of a page-bounded pixel value
    pub fn row_starting_before(&self, position: f64) -> i64 {
        i64::from(self.first_page_row()) + (position / self.row_height).floor() as i64
    }

    /// Last row whose area ends at or after `position`, capped at the page end.
    #[allow(clippy::cast_possible_truncation)] // ceil of a page-bounded pixel value
    pub fn row_ending_after(&self, position: f64) -> i64 {
        let page_end = self.page.map_or(-1, |page| i64::from(page.last_row));
        page_end.min(i64::from(self.first_page_row()) + (position / self.row_height).ceil() as i64)
    }

    fn insert_position(&self, strategy: InsertStrategy, rows: RowRange) -> f64 {
        let page_start = self.first_page_row();
        match strategy {
            InsertStrategy::Below => f64::from(rows.first.saturating_sub(page_start)) * self.row_height,
            InsertStrategy::Above => {
                (f64::from(rows.last.saturating_sub(page_start)) + 1.0) * self.row_height
            }
        }
    }

    fn body_ids(&self) -> Vec<String> {
        self.viewports
            .iter()
            .map(|viewport| viewport.body_id().to_string())
            .collect()
    }

    fn issue_ticket(&mut self, slices: Vec<Slice>) -> Option<RequestTicket> {
        let removable: Vec<Slice> = slices.into_iter().filter(Slice::is_displayed).collect();
        if removable.is_empty() {
            return None;
        }
        let ticket = RequestTicket(self.next_ticket);
        self.next_ticket += 1;
        self.pending_removals.insert(ticket, removable);
        Some(ticket)
    }

    /// Re-evaluate the row window for the vertical scroll position `scroll_position`.
    pub fn position_update<H: Dom + ServerChannel + ?Sized>(
        &mut self,
        host: &mut H,
        scroll_position: f64,
    ) {
        let page_end = self.page_end_position();
        if page_end <= 0.0 {
            tracing::trace!(target: "slicegrid", table = %self.table_id, "empty page, no position update");
            return;
        }
        let page_start = self.page_start_position();
        let view_start = scroll_position;
        let view_stop = scroll_position + self.visible_height;
        let height = self.visible_height;

        let keep = PixelWindow::around(
            view_start,
            view_stop,
            self.policy.keep_limit(height),
            page_start,
            page_end,
        );

        let mut dismissal = Dismissal::default();
        for (index, viewport) in self.viewports.iter_mut().enumerate() {
            let dropped = viewport.dismiss_outside(keep.start, keep.stop);
            if index == 0 {
                dismissal
                    .boundaries
                    .extend(dropped.iter().map(Slice::last_row));
            }
            dismissal.slices.extend(dropped);
        }

        let range_start = self.range_start_position();
        let range_stop = self.range_stop_position();
        let request = PixelWindow::around(
            view_start,
            view_stop,
            self.policy.request_offset(height),
            page_start,
            page_end,
        );

        tracing::trace!(
            target: "slicegrid",
            table = %self.table_id,
            scroll_position,
            keep_start = keep.start,
            keep_stop = keep.stop,
            request_start = request.start,
            request_stop = request.stop,
            range_start,
            range_stop,
            "position update"
        );

        let dismissed_any = !dismissal.slices.is_empty();
        let mut request_sent = false;
        if self.has_slices() {
            let trigger = PixelWindow::around(
                view_start,
                view_stop,
                self.policy.trigger_limit(height),
                page_start,
                page_end,
            );
            if range_start > trigger.start {
                request_sent |= self.request_slice(
                    host,
                    request.start,
                    range_start,
                    InsertStrategy::Above,
                    &mut dismissal,
                );
            }
            if range_stop < trigger.stop {
                request_sent |= self.request_slice(
                    host,
                    range_stop,
                    request.stop,
                    InsertStrategy::Below,
                    &mut dismissal,
                );
            }
        } else {
            request_sent = self.request_slice(
                host,
                request.start,
                request.stop,
                InsertStrategy::Below,
                &mut dismissal,
            );
        }

        if dismissed_any && !request_sent {
            self.send_dismissal(host, dismissal);
        }
    }

    /// Request the rows covering `(start, stop)` that are not held yet.
    ///
    /// Dismissed slices and boundaries ride along with the first request of
    /// a position update. Returns whether a request was sent.
    fn request_slice<H: Dom + ServerChannel + ?Sized>(
        &mut self,
        host: &mut H,
        start: f64,
        stop: f64,
        strategy: InsertStrategy,
        dismissal: &mut Dismissal,
    ) -> bool {
        let mut first = self.row_starting_before(start);
        let mut last = self.row_ending_after(stop);
        if let Some(held) = self.displayed_rows() {
            match strategy {
                InsertStrategy::Below => first = first.max(i64::from(held.last) + 1),
                InsertStrategy::Above => last = last.min(i64::from(held.first) - 1),
            }
        }
        let (Ok(first), Ok(last)) = (u32::try_from(first), u32::try_from(last)) else {
            return false;
        };
        let Some(rows) = RowRange::new(first, last) else {
            return false;
        };

        let insert_position = self.insert_position(strategy, rows);
        let part = self.next_slice_part;
        self.next_slice_part += 1;
        let row_height = self.row_height;
        for viewport in &mut self.viewports {
            let slice = Slice::pending(
                ids::slice_id(viewport.container_id(), part),
                part,
                insert_position,
                strategy,
                rows,
                row_height,
            );
            match strategy {
                InsertStrategy::Below => viewport.append_slice(slice),
                InsertStrategy::Above => viewport.prepend_slice(slice),
            }
        }

        let display = self.displayed_rows();
        let boundaries = std::mem::take(&mut dismissal.boundaries);
        let ticket = self.issue_ticket(std::mem::take(&mut dismissal.slices));
        host.blur_focus_within(&self.body_ids());

        tracing::debug!(
            target: "slicegrid",
            table = %self.table_id,
            part,
            first = rows.first,
            last = rows.last,
            %strategy,
            dismissed = boundaries.len(),
            "request slice"
        );

        host.execute(
            ServerCommand::RequestSlice {
                control_id: self.table_id.clone(),
                display_version: self.display_version,
                slice_id_part: part,
                slice_first_row: rows.first,
                slice_last_row: rows.last,
                dismissed_boundaries: boundaries,
                display_first_row: display.map(|range| range.first),
                display_last_row: display.map(|range| range.last),
            },
            ticket,
        );
        true
    }

    /// Tell the server about dismissed slices when no request carries them.
    fn send_dismissal<H: Dom + ServerChannel + ?Sized>(&mut self, host: &mut H, dismissal: Dismissal) {
        let display = self.displayed_rows();
        host.blur_focus_within(&self.body_ids());
        tracing::debug!(
            target: "slicegrid",
            table = %self.table_id,
            boundaries = ?dismissal.boundaries,
            "dismiss slices"
        );
        let ticket = self.issue_ticket(dismissal.slices);
        host.execute(
            ServerCommand::DismissSlice {
                control_id: self.table_id.clone(),
                display_version: self.display_version,
                dismissed_boundaries: dismissal.boundaries,
                display_first_row: display.map(|range| range.first),
                display_last_row: display.map(|range| range.last),
            },
            ticket,
        );
    }

    /// A request carrying dismissed slices completed: remove them from the DOM.
    pub fn complete_request<D: Dom + ?Sized>(&mut self, dom: &mut D, ticket: RequestTicket) {
        let Some(slices) = self.pending_removals.remove(&ticket) else {
            return;
        };
        for slice in &slices {
            dom.apply(&LayoutCommand::Remove {
                target: slice.id().to_string(),
            });
        }
        tracing::debug!(
            target: "slicegrid",
            table = %self.table_id,
            removed = slices.len(),
            "dismissed slices removed"
        );
    }

    /// Number of requests whose completion still removes slices.
    pub fn pending_removal_count(&self) -> usize {
        self.pending_removals.len()
    }

    /// Activate a slice whose markup just arrived in viewport `viewport_id`.
    ///
    /// A slice dismissed while its request was in flight is removed again
    /// right away.
    pub fn insert_slice<D: Dom + ?Sized>(
        &mut self,
        dom: &mut D,
        viewport_id: &str,
        slice_id: &str,
        row_count: u32,
    ) -> Result<()> {
        let index = self.viewport_index(viewport_id)?;
        let Some(viewport) = self.viewports.get_mut(index) else {
            return Err(SliceGridError::desync("viewport vanished during slice insertion"));
        };
        let body_id = viewport.body_id().to_string();
        let horizontal = viewport.horizontal_position();

        let Some(slice) = viewport.find_slice_mut(slice_id) else {
            dom.apply(&LayoutCommand::Remove {
                target: slice_id.to_string(),
            });
            tracing::debug!(
                target: "slicegrid",
                table = %self.table_id,
                slice = slice_id,
                "received slice that is already dismissed"
            );
            return Ok(());
        };

        if slice.row_count() != row_count {
            tracing::warn!(
                target: "slicegrid",
                slice = slice_id,
                expected = slice.row_count(),
                received = row_count,
                "slice row count differs from request"
            );
        }
        slice.mark_displayed();
        dom.apply(&LayoutCommand::SetPosition {
            target: slice_id.to_string(),
            x: 0.0,
            y: slice.upper_bound(),
        });
        // Elements without visible content may lose their scroll offset.
        dom.set_scroll_left(&body_id, horizontal);

        tracing::debug!(target: "slicegrid", table = %self.table_id, slice = slice_id, "slice inserted");
        if tracing::enabled!(target: "slicegrid", tracing::Level::DEBUG) {
            self.report_state("Insert slice");
        }
        Ok(())
    }

    /// Apply a new visible height (at least one pixel) and re-evaluate the window.
    pub fn set_visible_viewport_height<H: Dom + ServerChannel + ?Sized>(
        &mut self,
        host: &mut H,
        height: f64,
    ) {
        self.visible_height = height.max(1.0);
        let position = self
            .viewports
            .first()
            .map_or(0.0, Viewport::vertical_position);
        self.position_update(host, position);
    }

    /// Store a vertical position in every viewport, propagating where enabled.
    pub fn set_vertical_position<S: ServerChannel + ?Sized>(&mut self, server: &mut S, position: f64) {
        let geometry = self.geometry();
        for viewport in &mut self.viewports {
            if viewport.set_vertical_position(position) {
                viewport.propagate_scroll_position(server, geometry);
            }
        }
    }

    /// Store a horizontal position in one viewport, propagating where enabled.
    pub fn set_horizontal_position<S: ServerChannel + ?Sized>(
        &mut self,
        server: &mut S,
        viewport_id: &str,
        position: f64,
    ) -> Result<()> {
        let geometry = self.geometry();
        let index = self.viewport_index(viewport_id)?;
        if let Some(viewport) = self.viewports.get_mut(index) {
            if viewport.set_horizontal_position(position) {
                viewport.propagate_scroll_position(server, geometry);
            }
        }
        Ok(())
    }

    /// Enable scroll position publishing on exactly one viewport (the last one).
    pub fn activate_scroll_position_propagation(&mut self) {
        let last = self.viewports.len().saturating_sub(1);
        for (index, viewport) in self.viewports.iter_mut().enumerate() {
            viewport.set_update_server_state(index == last);
        }
    }

    /// Change the width of one column of viewport `viewport_id`.
    ///
    /// The column index is checked before anything changes.
    pub fn update_column_width<H: Dom + ServerChannel + ?Sized>(
        &mut self,
        host: &mut H,
        viewport_id: &str,
        column: usize,
        width: f64,
        update_server: bool,
    ) -> Result<()> {
        let index = self.viewport_index(viewport_id)?;
        let Some(viewport) = self.viewports.get_mut(index) else {
            return Err(SliceGridError::desync("viewport vanished during column update"));
        };
        let delta = width - viewport.column_width(column)?;
        viewport.set_column_width(column, width)?;
        let new_width = viewport.width() + delta;
        viewport.set_width(host, new_width);

        for slice in viewport.slices().iter().filter(|slice| slice.is_displayed()) {
            host.apply(&LayoutCommand::SetWidth {
                target: slice.id().to_string(),
                width: new_width,
            });
            host.apply(&LayoutCommand::SetColumnWidth {
                slice: slice.id().to_string(),
                column,
                width,
            });
        }

        if update_server {
            host.execute(
                ServerCommand::UpdateColumnWidth {
                    control_id: self.table_id.clone(),
                    column_id: viewport.column_id_offset() + column,
                    new_column_width: width,
                },
                None,
            );
        }
        Ok(())
    }

    /// The server re-rendered the whole page into the slice with id part
    /// `slice_part`: the page becomes `0..row_count`, the first slice of
    /// every viewport covers it and the content height follows.
    pub fn update_page_row_count<D: Dom + ?Sized>(
        &mut self,
        dom: &mut D,
        slice_part: u64,
        row_count: u32,
    ) {
        self.page = row_count
            .checked_sub(1)
            .and_then(|last| PageRange::from_server(0, i64::from(last)));
        self.content_height = self.row_height * f64::from(self.page_row_count());
        let rows = self.page.map(|page| page.rows());
        for viewport in &mut self.viewports {
            if let (Some(rows), Some(first)) = (rows, viewport.slices_mut().first_mut()) {
                first.rebind(rows);
            }
            viewport.set_height(dom, self.content_height);
        }
        tracing::debug!(
            target: "slicegrid",
            table = %self.table_id,
            slice_part,
            row_count,
            content_height = self.content_height,
            "page row count updated"
        );
    }

    /// Multi-line description of the held slices, logged at debug level.
    pub fn report_state(&self, message: &str) -> String {
        let mut report = String::new();
        let display = self.displayed_rows();
        let _ = writeln!(report, "{message}");
        let _ = writeln!(
            report,
            "First visible row: {}",
            display.map_or(-1, |range| i64::from(range.first))
        );
        let _ = writeln!(
            report,
            "Last visible row: {}\n",
            display.map_or(-1, |range| i64::from(range.last))
        );
        let _ = writeln!(report, "------\n\nSlices:");
        for slice in self.reference_slices() {
            let _ = writeln!(report, "    *********");
            let _ = writeln!(report, "    ID: {}", slice.id());
            let _ = writeln!(report, "    displayed: {}", slice.is_displayed());
            let _ = writeln!(report, "    first row: {}", slice.first_row());
            let _ = writeln!(report, "    last row: {}", slice.last_row());
            let _ = writeln!(report, "    insert strategy: {}", slice.strategy());
            let _ = writeln!(report, "    *********\n");
        }
        let _ = writeln!(report, "------\n");
        match self.page {
            Some(page) => {
                let _ = writeln!(report, "First page row: {}", page.first_row);
                let _ = writeln!(report, "Last page row: {}", page.last_row);
            }
            None => {
                let _ = writeln!(report, "Empty page");
            }
        }
        let _ = writeln!(report, "Page row count: {}", self.page_row_count());
        tracing::debug!(target: "slicegrid", table = %self.table_id, "{report}");
        report
    }
}
