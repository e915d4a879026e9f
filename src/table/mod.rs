//! Slices, viewports and the row window manager of a sliced table.

mod policy;
mod slice;
mod slice_manager;
mod viewport;

pub use policy::WindowPolicy;
pub use slice::{InsertStrategy, Slice};
pub use slice_manager::{ManagerInit, SliceManager};
pub use viewport::Viewport;
