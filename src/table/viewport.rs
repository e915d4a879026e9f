use crate::error::{Result, SliceGridError};
use crate::host::{Dom, LazyRequestId, ServerChannel};
use crate::ids;
use crate::layout::{LayoutCommand, LayoutQueue};
use crate::position::{visible_position, RowGeometry};
use crate::types::{DisplayVersion, ServerCommand};

use super::Slice;

/// One independently scrollable column region of a table.
///
/// The container element (`{body}_viewport`) holds the slice elements and is
/// sized to the full content; the body element around it is what scrolls.
#[derive(Debug, Clone)]
pub struct Viewport {
    table_id: String,
    display_version: DisplayVersion,
    body_id: String,
    container_id: String,
    width: f64,
    column_widths: Vec<f64>,
    column_id_offset: usize,
    horizontal_position: f64,
    vertical_position: f64,
    slices: Vec<Slice>,
    shall_update_server_state: bool,
    lazy_request: LazyRequestId,
}

impl Viewport {
    /// Viewport of the body element `body_id`.
    ///
    /// `column_id_offset` is the number of columns left of this region; it
    /// turns local column indices into the server's column ids.
    pub fn new(
        table_id: &str,
        display_version: DisplayVersion,
        body_id: &str,
        column_widths: Vec<f64>,
        column_id_offset: usize,
    ) -> Self {
        let container_id = ids::viewport_id(body_id);
        Self {
            table_id: table_id.to_string(),
            display_version,
            body_id: body_id.to_string(),
            lazy_request: LazyRequestId(container_id.clone()),
            container_id,
            width: 0.0,
            column_widths,
            column_id_offset,
            horizontal_position: 0.0,
            vertical_position: 0.0,
            slices: Vec::new(),
            shall_update_server_state: false,
        }
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn body_id(&self) -> &str {
        &self.body_id
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn display_version(&self) -> DisplayVersion {
        self.display_version
    }

    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    pub(crate) fn slices_mut(&mut self) -> &mut [Slice] {
        &mut self.slices
    }

    pub fn append_slice(&mut self, slice: Slice) {
        self.slices.push(slice);
    }

    pub fn prepend_slice(&mut self, slice: Slice) {
        self.slices.insert(0, slice);
    }

    pub(crate) fn find_slice_mut(&mut self, slice_id: &str) -> Option<&mut Slice> {
        self.slices.iter_mut().find(|slice| slice.id() == slice_id)
    }

    /// Remove every slice outside `(start, stop)`, last slice first.
    pub(crate) fn dismiss_outside(&mut self, start: f64, stop: f64) -> Vec<Slice> {
        let mut dismissed = Vec::new();
        let mut index = self.slices.len();
        while index > 0 {
            index -= 1;
            let outside = self
                .slices
                .get(index)
                .is_some_and(|slice| slice.no_intersection(start, stop));
            if outside {
                dismissed.push(self.slices.remove(index));
            }
        }
        dismissed
    }

    /// Sum of all column widths plus borders, as last set.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Set the width during a layout pass.
    pub fn init_width(&mut self, layout: &mut LayoutQueue, width: f64) {
        self.width = width;
        layout.add_layout(LayoutCommand::SetWidth {
            target: self.container_id.clone(),
            width,
        });
    }

    /// Set the width immediately.
    pub fn set_width<D: Dom + ?Sized>(&mut self, dom: &mut D, width: f64) {
        self.width = width;
        dom.apply(&LayoutCommand::SetWidth {
            target: self.container_id.clone(),
            width,
        });
    }

    /// Set the content height during a layout pass.
    pub fn init_height(&self, layout: &mut LayoutQueue, height: f64) {
        layout.add_layout(LayoutCommand::SetHeight {
            target: self.container_id.clone(),
            height,
        });
    }

    /// Set the content height immediately.
    pub fn set_height<D: Dom + ?Sized>(&self, dom: &mut D, height: f64) {
        dom.apply(&LayoutCommand::SetHeight {
            target: self.container_id.clone(),
            height,
        });
    }

    pub fn column_count(&self) -> usize {
        self.column_widths.len()
    }

    pub fn column_widths(&self) -> &[f64] {
        &self.column_widths
    }

    pub fn set_column_widths(&mut self, column_widths: Vec<f64>) {
        self.column_widths = column_widths;
    }

    pub fn column_width(&self, column: usize) -> Result<f64> {
        self.column_widths
            .get(column)
            .copied()
            .ok_or(SliceGridError::InvalidColumnIndex {
                index: column,
                count: self.column_widths.len(),
            })
    }

    pub fn set_column_width(&mut self, column: usize, width: f64) -> Result<()> {
        let count = self.column_widths.len();
        let slot = self
            .column_widths
            .get_mut(column)
            .ok_or(SliceGridError::InvalidColumnIndex {
                index: column,
                count,
            })?;
        *slot = width;
        Ok(())
    }

    pub fn column_id_offset(&self) -> usize {
        self.column_id_offset
    }

    pub fn horizontal_position(&self) -> f64 {
        self.horizontal_position
    }

    pub fn vertical_position(&self) -> f64 {
        self.vertical_position
    }

    pub fn shall_update_server_state(&self) -> bool {
        self.shall_update_server_state
    }

    pub fn set_update_server_state(&mut self, enabled: bool) {
        self.shall_update_server_state = enabled;
    }

    /// Store a new vertical position.
    ///
    /// Returns whether the change must be propagated to the server.
    pub fn set_vertical_position(&mut self, position: f64) -> bool {
        if (self.vertical_position - position).abs() > f64::EPSILON {
            self.vertical_position = position;
            return self.shall_update_server_state;
        }
        false
    }

    /// Store a new horizontal position.
    ///
    /// Returns whether the change must be propagated to the server.
    pub fn set_horizontal_position(&mut self, position: f64) -> bool {
        if (self.horizontal_position - position).abs() > f64::EPSILON {
            self.horizontal_position = position;
            return self.shall_update_server_state;
        }
        false
    }

    /// Send the logical anchor of the current position, replacing any
    /// update of this viewport that has not completed yet.
    pub fn propagate_scroll_position<S: ServerChannel + ?Sized>(
        &self,
        server: &mut S,
        geometry: RowGeometry,
    ) {
        let position = visible_position(self, geometry);
        tracing::trace!(
            target: "slicegrid",
            viewport = %self.container_id,
            row_anchor = position.row_anchor,
            column_anchor = position.column_anchor,
            "propagate scroll position"
        );
        server.execute_or_update_lazy(
            self.lazy_request.clone(),
            ServerCommand::update_scroll_position(&self.table_id, self.display_version, position),
        );
    }
}
