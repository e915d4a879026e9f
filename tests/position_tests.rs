//! Anchor round trip tests
//!
//! The anchors a viewport publishes must bring the table back to the same
//! pixel offsets when the server hands them back after a re-render.

#![allow(
    clippy::unwrap_used,
    clippy::float_cmp,
    clippy::cast_precision_loss
)]

use proptest::prelude::*;
use slicegrid::position::{
    computed_scroll_positions, server_scroll_positions, visible_position, PositionContext,
    RowGeometry,
};
use slicegrid::table::Viewport;
use slicegrid::types::{
    Anchor, ClientDisplayData, DisplayVersion, PaneRange, ViewportState, VisiblePane,
};

const FIX_COLUMNS: usize = 2;

fn flex_viewport(widths: Vec<f64>, vertical: f64, horizontal: f64) -> Viewport {
    let mut viewport = Viewport::new("t", DisplayVersion(1), "t_bodyFlex", widths, FIX_COLUMNS);
    viewport.set_vertical_position(vertical);
    viewport.set_horizontal_position(horizontal);
    viewport
}

fn context(first_page_row: u32, widths: &[f64]) -> PositionContext<'_> {
    PositionContext {
        first_page_row,
        row_height: 20.0,
        visible_height: 400.0,
        range_start_position: 0.0,
        fix_column_count: Some(FIX_COLUMNS),
        flex_columns: Some(widths),
        flex_visible_width: 600.0,
        available_width: 800.0,
    }
}

fn stored(viewport: &Viewport, first_page_row: u32) -> ClientDisplayData {
    let position = visible_position(
        viewport,
        RowGeometry {
            first_page_row,
            row_height: 20.0,
        },
    );
    ClientDisplayData {
        viewport_state: ViewportState {
            row_anchor: Some(Anchor::new(position.row_anchor, position.row_anchor_offset as f64)),
            column_anchor: Some(Anchor::new(
                position.column_anchor,
                position.column_anchor_offset as f64,
            )),
        },
        ..ClientDisplayData::default()
    }
}

#[test]
fn stored_anchor_restores_offsets() {
    let widths = vec![100.0, 150.0, 80.0];
    let viewport = flex_viewport(widths.clone(), 1234.0, 170.0);
    let data = stored(&viewport, 500);
    let row = data.viewport_state.row_anchor.unwrap();
    assert_eq!((row.index, row.pixel_offset), (561, 14.0));
    let column = data.viewport_state.column_anchor.unwrap();
    assert_eq!((column.index, column.pixel_offset), (3, 70.0));

    let positions = server_scroll_positions(&context(500, &widths), Some(&data));
    assert_eq!(positions.vertical, 1234.0);
    assert_eq!(positions.horizontal, 170.0);
}

#[test]
fn offset_on_column_edge_anchors_to_that_column() {
    let widths = vec![100.0, 150.0];
    let viewport = flex_viewport(widths, 0.0, 100.0);
    let data = stored(&viewport, 0);
    let column = data.viewport_state.column_anchor.unwrap();
    // right edge of the first column reaches the offset
    assert_eq!((column.index, column.pixel_offset), (2, 100.0));
}

#[test]
fn rows_before_the_page_fall_back_to_range_start() {
    let widths = vec![100.0, 150.0];
    let stored_before_page = ClientDisplayData {
        viewport_state: ViewportState {
            row_anchor: Some(Anchor::new(50, 0.0)),
            column_anchor: None,
        },
        ..ClientDisplayData::default()
    };
    let ctx = context(100, &widths);
    assert_eq!(server_scroll_positions(&ctx, Some(&stored_before_page)).vertical, 0.0);
    assert_eq!(computed_scroll_positions(&ctx, Some(&stored_before_page)).vertical, 0.0);

    let pane_before_page = ClientDisplayData {
        visible_pane: VisiblePane {
            row_range: Some(PaneRange::new(50, 53, None)),
            column_range: None,
        },
        ..ClientDisplayData::default()
    };
    assert_eq!(computed_scroll_positions(&ctx, Some(&pane_before_page)).vertical, 0.0);
}

#[test]
fn pane_before_the_page_still_uses_stored_anchor() {
    let widths = vec![100.0];
    let data = ClientDisplayData {
        visible_pane: VisiblePane {
            row_range: Some(PaneRange::new(50, 53, None)),
            column_range: None,
        },
        viewport_state: ViewportState {
            row_anchor: Some(Anchor::new(130, 5.0)),
            column_anchor: None,
        },
    };
    // (130 - 100) * 20 + 5
    assert_eq!(computed_scroll_positions(&context(100, &widths), Some(&data)).vertical, 605.0);
}

proptest! {
    #[test]
    fn visible_position_round_trips(
        widths in prop::collection::vec(20u32..300, 1..12),
        first_page_row in 0u32..10_000,
        vertical in 0u32..200_000,
        horizontal_fraction in 0.0f64..1.0,
    ) {
        let widths: Vec<f64> = widths.into_iter().map(f64::from).collect();
        let total: f64 = widths.iter().sum();
        let horizontal = (total * horizontal_fraction).floor();
        let vertical = f64::from(vertical);

        let viewport = flex_viewport(widths.clone(), vertical, horizontal);
        let data = stored(&viewport, first_page_row);
        let positions = server_scroll_positions(&context(first_page_row, &widths), Some(&data));

        prop_assert_eq!(positions.vertical, vertical);
        prop_assert_eq!(positions.horizontal, horizontal);
    }
}
