use crate::error::{Result, SliceGridError};
use crate::host::{Axis, Dom, FrameScheduler, FrameToken, RequestTicket, TableHost};
use crate::ids;
use crate::layout::{LayoutCommand, LayoutQueue, PostLayoutAction};
use crate::position::{computed_scroll_positions, server_scroll_positions, PositionContext};
use crate::scroll::{HorizontalScrollManager, VerticalScrollManager};
use crate::table::{ManagerInit, SliceManager, Viewport};
use crate::types::{ClientDisplayData, ScrollPositions, ServerCommand};

use super::columns::{reorder_columns, ColumnReorder, Part};
use super::{TableGeometry, TableInit};

/// One rendered table: its slice manager, the scroll managers linking its
/// parts and the geometry of the last layout pass.
#[derive(Debug)]
pub struct TableSession {
    table_id: String,
    manager: SliceManager,
    vertical: VerticalScrollManager,
    horizontal: Option<HorizontalScrollManager>,
    geometry: TableGeometry,
    display_data: Option<ClientDisplayData>,
    has_fix_part: bool,
    has_flex_part: bool,
}

impl TableSession {
    /// Build the client state of a freshly rendered table and queue its
    /// initial layout. The initial scroll runs as a post-layout action.
    pub fn create<D: Dom + ?Sized>(
        init: &TableInit,
        geometry: TableGeometry,
        dom: &D,
        layout: &mut LayoutQueue,
    ) -> Result<Self> {
        init.validate()?;
        let table_id = init.control_id.clone();
        let display_version =
            init.display_version()
                .ok_or_else(|| SliceGridError::MissingDisplayVersion {
                    table_id: table_id.clone(),
                })?;
        let policy = init.policy();

        let mut viewports = Vec::new();
        if let Some(widths) = &init.fix_column_widths {
            let mut viewport = Viewport::new(
                &table_id,
                display_version,
                &ids::fix_body_id(&table_id),
                widths.clone(),
                0,
            );
            viewport.init_width(layout, geometry.fix_width);
            viewports.push(viewport);
        }
        if let Some(widths) = &init.flex_column_widths {
            let mut viewport = Viewport::new(
                &table_id,
                display_version,
                &ids::flex_body_id(&table_id),
                widths.clone(),
                init.fix_column_count(),
            );
            viewport.init_width(layout, geometry.flex_table_width);
            viewports.push(viewport);
        }

        let manager = SliceManager::new(
            ManagerInit {
                table_id: table_id.clone(),
                display_version,
                visible_height: geometry.body_height,
                page: init.page(),
                initial_rows: init.initial_rows(),
                policy,
            },
            viewports,
            dom,
            layout,
        )?;

        let mut vertical = VerticalScrollManager::new(&table_id, policy.settle_delay_ms);
        vertical.set_scrollbar(&ids::vertical_scrollbar_id(&table_id));
        if init.has_fix_part() {
            vertical.set_fix_body(&ids::fix_body_id(&table_id));
        }
        let horizontal = init.has_flex_part().then(|| {
            vertical.set_flex_body(&ids::flex_body_id(&table_id));
            let mut horizontal =
                HorizontalScrollManager::new(&table_id, geometry.available_width, geometry.flex_width);
            horizontal.set_scrollbar(&ids::horizontal_scrollbar_id(&table_id));
            horizontal.set_flex_header(&ids::flex_header_id(&table_id));
            horizontal.set_flex_body(&ids::flex_body_id(&table_id));
            horizontal
        });

        let session = Self {
            table_id: table_id.clone(),
            manager,
            vertical,
            horizontal,
            geometry,
            display_data: init.client_display_data,
            has_fix_part: init.has_fix_part(),
            has_flex_part: init.has_flex_part(),
        };
        geometry.queue_layout(layout, &table_id, session.has_fix_part, session.has_flex_part);
        layout.add_layout(session.scroll_bar_extent());
        layout.add_post_layout(PostLayoutAction::InitialScroll { table_id });
        Ok(session)
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn manager(&self) -> &SliceManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut SliceManager {
        &mut self.manager
    }

    pub fn vertical(&self) -> &VerticalScrollManager {
        &self.vertical
    }

    pub fn horizontal(&self) -> Option<&HorizontalScrollManager> {
        self.horizontal.as_ref()
    }

    pub fn geometry(&self) -> &TableGeometry {
        &self.geometry
    }

    pub fn set_client_display_data(&mut self, data: Option<ClientDisplayData>) {
        self.display_data = data;
    }

    fn fix_viewport(&self) -> Option<&Viewport> {
        self.manager
            .viewport(&ids::viewport_id(&ids::fix_body_id(&self.table_id)))
    }

    fn flex_viewport(&self) -> Option<&Viewport> {
        self.manager
            .viewport(&ids::viewport_id(&ids::flex_body_id(&self.table_id)))
    }

    fn position_context(&self) -> PositionContext<'_> {
        PositionContext {
            first_page_row: self.manager.first_page_row(),
            row_height: self.manager.row_height(),
            visible_height: self.manager.visible_height(),
            range_start_position: self.manager.range_start_position(),
            fix_column_count: self.fix_viewport().map(Viewport::column_count),
            flex_columns: self.flex_viewport().map(Viewport::column_widths),
            flex_visible_width: self.geometry.flex_width,
            available_width: self.geometry.available_width,
        }
    }

    /// Offsets restoring the position the server stored for this table.
    pub fn server_scroll_positions(&self) -> ScrollPositions {
        server_scroll_positions(&self.position_context(), self.display_data.as_ref())
    }

    /// Offsets showing the pane the server asks for.
    pub fn computed_scroll_positions(&self) -> ScrollPositions {
        computed_scroll_positions(&self.position_context(), self.display_data.as_ref())
    }

    fn scroll_bar_extent(&self) -> LayoutCommand {
        LayoutCommand::SetHeight {
            target: ids::vertical_scrollbar_inner_id(&self.table_id),
            height: self.geometry.constant_summand + self.manager.viewport_content_height(),
        }
    }

    /// Size the vertical scrollbar to the current page content.
    pub fn adjust_scroll_bars<D: Dom + ?Sized>(&self, dom: &mut D) {
        dom.apply(&self.scroll_bar_extent());
    }

    /// Post-layout part of the initial layout: restore the stored position,
    /// publish scroll positions from the last viewport only, then show the
    /// requested pane.
    pub fn initial_scroll<H: TableHost + ?Sized>(&mut self, host: &mut H) -> Result<()> {
        self.init_previous_scroll_position(host)?;
        self.manager.activate_scroll_position_propagation();
        self.scroll_to_requested_position(host);
        Ok(())
    }

    fn init_previous_scroll_position<H: TableHost + ?Sized>(&mut self, host: &mut H) -> Result<()> {
        let positions = self.server_scroll_positions();
        self.vertical
            .init_scroll_position(host, &mut self.manager, positions.vertical);
        if let Some(horizontal) = &mut self.horizontal {
            horizontal.init_scroll_position(host, &mut self.manager, positions.horizontal)?;
        }
        Ok(())
    }

    /// Move the scrollbars to the requested pane and re-evaluate the row
    /// window even if the offsets did not change.
    pub fn scroll_to_requested_position<H: TableHost + ?Sized>(&mut self, host: &mut H) {
        let positions = self.computed_scroll_positions();
        if let Some(horizontal) = &mut self.horizontal {
            let scrollbar = ids::horizontal_scrollbar_id(&self.table_id);
            host.set_scroll_left(&scrollbar, positions.horizontal);
            horizontal.on_scroll(host, &scrollbar);
        }
        let scrollbar = ids::vertical_scrollbar_id(&self.table_id);
        host.set_scroll_top(&scrollbar, positions.vertical);
        self.vertical.on_scroll(host, &scrollbar);
        self.manager.position_update(host, positions.vertical);
    }

    /// Apply the layout of an already registered table after a resize.
    pub fn relayout<H: TableHost + ?Sized>(
        &mut self,
        host: &mut H,
        layout: &mut LayoutQueue,
        init: &TableInit,
        geometry: TableGeometry,
    ) -> Result<()> {
        if let Some(version) = init.display_version() {
            if version != self.manager.display_version() {
                return Err(SliceGridError::DisplayVersionMismatch {
                    table_id: self.table_id.clone(),
                    expected: self.manager.display_version().0,
                    actual: version.0,
                });
            }
        }

        let fix_id = ids::viewport_id(&ids::fix_body_id(&self.table_id));
        let flex_id = ids::viewport_id(&ids::flex_body_id(&self.table_id));
        if let Some(widths) = &init.fix_column_widths {
            let viewport = self.manager.viewport_mut(&fix_id).ok_or_else(|| {
                SliceGridError::UnknownViewport {
                    table_id: self.table_id.clone(),
                    viewport_id: fix_id.clone(),
                }
            })?;
            viewport.set_column_widths(widths.clone());
        }
        if let Some(widths) = &init.flex_column_widths {
            let viewport = self.manager.viewport_mut(&flex_id).ok_or_else(|| {
                SliceGridError::UnknownViewport {
                    table_id: self.table_id.clone(),
                    viewport_id: flex_id.clone(),
                }
            })?;
            viewport.init_width(layout, geometry.flex_table_width);
            viewport.set_column_widths(widths.clone());
        }

        self.geometry = geometry;
        geometry.queue_layout(layout, &self.table_id, self.has_fix_part, self.has_flex_part);
        layout.add_layout(self.scroll_bar_extent());

        let vertical = host.scroll_top(&ids::vertical_scrollbar_id(&self.table_id));
        self.manager.set_vertical_position(host, vertical);
        if let Some(horizontal) = &mut self.horizontal {
            horizontal.set_available_width(geometry.available_width);
            horizontal.set_flex_width(geometry.flex_width);
            let scrollbar = host.scroll_left(&ids::horizontal_scrollbar_id(&self.table_id));
            let body = horizontal.body_position(scrollbar);
            self.manager.set_horizontal_position(host, &flex_id, body)?;
            horizontal.rescale(host);
        }
        self.manager
            .set_visible_viewport_height(host, geometry.body_height);
        Ok(())
    }

    /// The flexible body scrolls on both axes, so both managers see its events.
    pub fn on_scroll<H: TableHost + ?Sized>(&mut self, host: &mut H, element: &str) -> bool {
        let vertical = self.vertical.on_scroll(host, element);
        let horizontal = match &mut self.horizontal {
            Some(horizontal) => horizontal.on_scroll(host, element),
            None => false,
        };
        vertical || horizontal
    }

    pub fn on_wheel<H: TableHost + ?Sized>(&mut self, host: &mut H, delta_y: f64) -> bool {
        self.vertical.on_wheel(host, delta_y)
    }

    pub fn on_frame<H: TableHost + ?Sized>(&mut self, host: &mut H, token: &FrameToken) -> Result<()> {
        match token.axis {
            Axis::Vertical => {
                self.vertical.on_frame(host, &mut self.manager, token.step);
                Ok(())
            }
            Axis::Horizontal => match &mut self.horizontal {
                Some(horizontal) => horizontal.on_frame(host, &mut self.manager, token.step),
                None => Ok(()),
            },
        }
    }

    /// Scrolling settled: re-evaluate the row window.
    pub fn on_settled<H: TableHost + ?Sized>(&mut self, host: &mut H) {
        self.vertical.on_settled(host, &mut self.manager);
    }

    pub fn insert_slice<D: Dom + ?Sized>(
        &mut self,
        dom: &mut D,
        viewport_id: &str,
        slice_id: &str,
        row_count: u32,
    ) -> Result<()> {
        self.manager.insert_slice(dom, viewport_id, slice_id, row_count)
    }

    /// The server rendered the whole page into `slice_id` of `viewport_id`.
    pub fn update_page_row_count<D: Dom + ?Sized>(
        &mut self,
        dom: &mut D,
        viewport_id: &str,
        slice_id: &str,
        row_count: u32,
    ) -> Result<()> {
        if self.manager.viewport(viewport_id).is_none() {
            return Err(SliceGridError::UnknownViewport {
                table_id: self.table_id.clone(),
                viewport_id: viewport_id.to_string(),
            });
        }
        let part = ids::slice_part_of(slice_id)
            .ok_or_else(|| SliceGridError::desync(format!("unexpected slice id '{slice_id}'")))?;
        self.manager.update_page_row_count(dom, part, row_count);
        self.adjust_scroll_bars(dom);
        Ok(())
    }

    pub fn update_column_width<H: TableHost + ?Sized>(
        &mut self,
        host: &mut H,
        viewport_id: &str,
        column: usize,
        width: f64,
        update_server: bool,
    ) -> Result<()> {
        self.manager
            .update_column_width(host, viewport_id, column, width, update_server)
    }

    /// Move a column; crossing the fixed/flexible boundary asks the server
    /// for the new fixed column amount.
    pub fn reorder_columns<H: TableHost + ?Sized>(
        &mut self,
        host: &mut H,
        from: usize,
        insert_before: usize,
        drop_part: Part,
    ) -> Result<ColumnReorder> {
        let fixed = self.fix_viewport().map_or(0, Viewport::column_count);
        let total = fixed + self.flex_viewport().map_or(0, Viewport::column_count);
        let reorder = reorder_columns(total, fixed, from, insert_before, drop_part).ok_or(
            SliceGridError::InvalidColumnIndex {
                index: from.max(insert_before),
                count: total,
            },
        )?;
        if reorder.changes_fixed_count(fixed) {
            host.execute(
                ServerCommand::UpdateFixedColumnAmount {
                    control_id: self.table_id.clone(),
                    fixed_column_amount: reorder.fixed_count,
                },
                None,
            );
        }
        Ok(reorder)
    }

    pub fn request_completed<D: Dom + ?Sized>(&mut self, dom: &mut D, ticket: RequestTicket) {
        self.manager.complete_request(dom, ticket);
    }

    /// Release every frame and timer of the table.
    pub fn teardown<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) {
        self.vertical.cancel_all(scheduler);
        if let Some(horizontal) = &mut self.horizontal {
            horizontal.cancel_all(scheduler);
        }
    }
}
