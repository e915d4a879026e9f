//! Pixel scroll offsets for a server display request.
//!
//! Two entry points:
//!
//! - [`server_scroll_positions`] restores the anchors the server stored from
//!   an earlier visit, in table pixels.
//! - [`computed_scroll_positions`] resolves a requested visible pane; the
//!   horizontal result is in scrollbar pixels.
//!
//! A pane that fits into the viewport is shown with minimal movement from
//! the stored position when the two overlap, centered otherwise. A pane that
//! does not fit falls back to its forced-visible row or column and is then
//! clamped so the viewport stays inside the pane.

use crate::types::{Anchor, ClientDisplayData, PaneRange, ScrollPositions, ViewportState};

/// Table geometry the computation depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionContext<'a> {
    pub first_page_row: u32,
    pub row_height: f64,
    pub visible_height: f64,
    /// Top of the currently held row range.
    pub range_start_position: f64,
    /// Column count of the fixed part, `None` without fixed part.
    pub fix_column_count: Option<usize>,
    /// Column widths of the flexible part, `None` without flexible part.
    pub flex_columns: Option<&'a [f64]>,
    /// On-screen width of the flexible body.
    pub flex_visible_width: f64,
    /// Width of the horizontal scrollbar.
    pub available_width: f64,
}

/// Positions stored by the server, or the top of the held range.
pub fn server_scroll_positions(
    ctx: &PositionContext<'_>,
    data: Option<&ClientDisplayData>,
) -> ScrollPositions {
    let Some(data) = data else {
        return top_left(ctx);
    };
    ScrollPositions {
        horizontal: stored_horizontal(ctx, &data.viewport_state).unwrap_or(0.0),
        vertical: stored_vertical(ctx, &data.viewport_state).unwrap_or(ctx.range_start_position),
    }
}

/// Positions that show the pane requested by the server.
pub fn computed_scroll_positions(
    ctx: &PositionContext<'_>,
    data: Option<&ClientDisplayData>,
) -> ScrollPositions {
    let Some(data) = data else {
        return top_left(ctx);
    };
    ScrollPositions {
        horizontal: horizontal_scroll_position(ctx, data),
        vertical: vertical_scroll_position(ctx, data),
    }
}

fn top_left(ctx: &PositionContext<'_>) -> ScrollPositions {
    ScrollPositions {
        horizontal: 0.0,
        vertical: ctx.range_start_position,
    }
}

fn page_relative(ctx: &PositionContext<'_>, row: u32) -> f64 {
    (f64::from(row) - f64::from(ctx.first_page_row)) * ctx.row_height
}

/// Rows before the current page have no position on it.
fn on_page(ctx: &PositionContext<'_>, row: u32) -> bool {
    row >= ctx.first_page_row
}

fn stored_vertical(ctx: &PositionContext<'_>, state: &ViewportState) -> Option<f64> {
    state
        .row_anchor
        .filter(|anchor| on_page(ctx, anchor.index))
        .map(|anchor| page_relative(ctx, anchor.index) + anchor.pixel_offset)
}

fn vertical_scroll_position(ctx: &PositionContext<'_>, data: &ClientDisplayData) -> f64 {
    let stored = stored_vertical(ctx, &data.viewport_state);
    let row_range = data
        .visible_pane
        .row_range
        .filter(|range| on_page(ctx, range.first));
    let Some(range) = row_range else {
        return stored.unwrap_or(ctx.range_start_position);
    };
    let pane_top = page_relative(ctx, range.first);
    let pane_height = (f64::from(range.last) - f64::from(range.first) + 1.0) * ctx.row_height;
    if ctx.visible_height > pane_height {
        return pane_and_previous(pane_height, pane_top, ctx.visible_height, stored);
    }
    let upper = page_relative(ctx, range.last) + ctx.row_height - ctx.visible_height;
    let forced = page_relative(ctx, range.forced_visible_or_first());
    let position = pane_and_previous(ctx.row_height, forced, ctx.visible_height, stored);
    clamp_into(pane_top, upper, position)
}

/// Horizontal offset of the flexible part in scrollbar pixels.
fn horizontal_scroll_position(ctx: &PositionContext<'_>, data: &ClientDisplayData) -> f64 {
    let Some(columns) = ctx.flex_columns else {
        return 0.0;
    };
    let pane = data
        .visible_pane
        .column_range
        .filter(|range| fully_in_flex_part(ctx, range));
    let table_position = match pane {
        Some(range) => pane_based_horizontal(ctx, columns, &data.viewport_state, &range),
        None => stored_horizontal(ctx, &data.viewport_state).unwrap_or(0.0),
    };
    if ctx.flex_visible_width > 0.0 {
        table_position * (ctx.available_width / ctx.flex_visible_width)
    } else {
        table_position
    }
}

fn fully_in_flex_part(ctx: &PositionContext<'_>, range: &PaneRange) -> bool {
    ctx.fix_column_count
        .map_or(true, |fix| range.first as usize >= fix)
}

fn flex_index(ctx: &PositionContext<'_>, column: u32) -> usize {
    (column as usize).saturating_sub(ctx.fix_column_count.unwrap_or(0))
}

/// Sum of the flexible column widths in `start..stop`.
fn offset_from_left(columns: &[f64], start: usize, stop: usize) -> f64 {
    columns
        .iter()
        .take(stop)
        .skip(start)
        .sum()
}

fn stored_horizontal(ctx: &PositionContext<'_>, state: &ViewportState) -> Option<f64> {
    let columns = ctx.flex_columns?;
    let Anchor {
        index,
        pixel_offset,
    } = state.column_anchor?;
    Some(offset_from_left(columns, 0, flex_index(ctx, index)) + pixel_offset)
}

fn pane_based_horizontal(
    ctx: &PositionContext<'_>,
    columns: &[f64],
    state: &ViewportState,
    range: &PaneRange,
) -> f64 {
    let stored = stored_horizontal(ctx, state);
    let first = flex_index(ctx, range.first);
    let end = flex_index(ctx, range.last) + 1;
    let pane_left = offset_from_left(columns, 0, first);
    let pane_width = offset_from_left(columns, first, end);
    let visible = ctx.flex_visible_width;
    if visible > pane_width {
        return pane_and_previous(pane_width, pane_left, visible, stored);
    }
    let right = offset_from_left(columns, 0, end) - visible;
    let forced = flex_index(ctx, range.forced_visible_or_first());
    let forced_width = columns.get(forced).copied().unwrap_or(0.0);
    let position = pane_and_previous(
        forced_width,
        offset_from_left(columns, 0, forced),
        visible,
        stored,
    );
    clamp_into(pane_left, right, position)
}

/// Keep the stored position if it overlaps the range, moving only as far
/// as needed; center the range otherwise.
pub fn pane_and_previous(
    range_size: f64,
    range_offset: f64,
    viewport_size: f64,
    stored: Option<f64>,
) -> f64 {
    match stored {
        Some(scroll) if intersects(range_size, range_offset, viewport_size, scroll) => {
            delta_based(range_size, range_offset, viewport_size, scroll)
        }
        _ => centered(range_size, range_offset, viewport_size),
    }
}

fn intersects(range_size: f64, range_offset: f64, viewport_size: f64, scroll: f64) -> bool {
    range_offset < scroll + viewport_size && range_offset + range_size > scroll
}

fn delta_based(range_size: f64, range_offset: f64, viewport_size: f64, scroll: f64) -> f64 {
    let range_end = range_offset + range_size;
    let viewport_end = scroll + viewport_size;
    let delta = if range_offset < scroll {
        (range_offset - scroll).min(0.0)
    } else {
        (range_end - viewport_end).max(0.0)
    };
    scroll + delta
}

/// Offset that places the range in the middle of the viewport.
pub fn centered(range_size: f64, range_offset: f64, viewport_size: f64) -> f64 {
    range_offset - (viewport_size - range_size) / 2.0
}

/// `position` limited to `[lower, upper]`; `upper` wins if the bounds cross.
fn clamp_into(lower: f64, upper: f64, position: f64) -> f64 {
    position.max(lower).min(upper)
}
