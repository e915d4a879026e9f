//! Scroll mirroring between the decoupled scrollbars and the table parts.

mod horizontal;
mod sync;
mod vertical;

pub use horizontal::HorizontalScrollManager;
pub use sync::{ListenerSync, SyncPhase};
pub use vertical::VerticalScrollManager;
