//! Table sessions: creation, layout and event routing for each table.

mod columns;
mod geometry;
mod init;
mod registry;
mod table_session;

pub use columns::{reorder_columns, ColumnReorder, Part};
pub use geometry::{fit_fixed_columns, table_width, FixedFit, Sizing, TableGeometry};
pub use init::TableInit;
pub use registry::{LayoutOutcome, TableRegistry};
pub use table_session::TableSession;
