//! Conversion between pixel scroll offsets and server-side anchors.

mod provider;
mod visible;

pub use provider::{
    centered, computed_scroll_positions, pane_and_previous, server_scroll_positions,
    PositionContext,
};
pub use visible::{visible_position, RowGeometry};
