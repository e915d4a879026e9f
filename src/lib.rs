//! slicegrid - virtualized split-pane tables for the web
//!
//! Keeps a sliding window of server-rendered row slices around the visible
//! area of a table, mirrors scrolling between the decoupled scrollbars and
//! the fixed/flexible table parts, and translates between pixel offsets and
//! the row/column anchors the server understands:
//! - Slice windowing with row budgets and deferred server dismissal
//! - Scroll mirroring with listener detach/re-arm across animation frames
//! - Anchor based scroll restoration after re-renders
//! - Fixed column fitting and split-pane geometry
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { TableController } from 'slicegrid';
//! await init();
//! const tables = new TableController();
//! tables.setSendCallback((command, ticket, lazyKey) => server.send(command, ticket, lazyKey));
//! tables.layoutTable(initPayload);
//! tables.runLayout();
//! ```
//!
//! The core is host agnostic: everything it needs from the page goes
//! through the traits in [`host`], so tables can be driven headless.

pub mod error;
pub mod host;
pub mod ids;
pub mod layout;
pub mod position;
pub mod scroll;
pub mod session;
pub mod table;
pub mod transport;
pub mod types;

#[cfg(target_arch = "wasm32")]
pub mod web;

use wasm_bindgen::prelude::*;

pub use error::{Result, SliceGridError};
pub use session::{LayoutOutcome, TableInit, TableRegistry, TableSession};
pub use table::{SliceManager, WindowPolicy};
pub use transport::{OutgoingRequest, RequestQueue};

#[cfg(target_arch = "wasm32")]
pub use web::TableController;

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
