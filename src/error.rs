//! Structured error types for slicegrid.
//!
//! Desynchronization between client and server state is always fatal: the
//! caller is expected to surface the error and reload the page. Conditions
//! that arise from ordinary races (a slice arriving after it was dismissed)
//! are not errors and never reach this type.

/// All errors that can occur while managing a sliced table.
#[derive(Debug, thiserror::Error)]
pub enum SliceGridError {
    /// Client state no longer matches the server's model.
    #[error("Client is not in sync with server ({reason}). Reload page!")]
    Desync { reason: String },

    /// A server update addressed a table that is not registered.
    #[error("Client is not in sync with server: no table '{table_id}' registered. Reload page!")]
    UnknownTable { table_id: String },

    /// A server update addressed a viewport the table does not own.
    #[error(
        "Client is not in sync with server: table '{table_id}' has no viewport '{viewport_id}'. Reload page!"
    )]
    UnknownViewport {
        table_id: String,
        viewport_id: String,
    },

    /// The server's display version differs from the one the client holds.
    #[error(
        "Client is not in sync with server: table '{table_id}' is at display version {expected}, got {actual}. Reload page!"
    )]
    DisplayVersionMismatch {
        table_id: String,
        expected: i64,
        actual: i64,
    },

    /// Initial table state cannot be built without a display version.
    #[error("Initial state of table '{table_id}' cannot be created with undefined display version")]
    MissingDisplayVersion { table_id: String },

    /// Column index outside of `[0, count)`.
    #[error("Invalid column index {index} (viewport has {count} columns)")]
    InvalidColumnIndex { index: usize, count: usize },

    /// Server-rendered markup lacks an attribute the layout depends on.
    #[error("Element '{element}' is missing required attribute '{attribute}'")]
    MissingLayoutAttribute { element: String, attribute: String },

    /// Header and body parts of a table do not match up.
    #[error("Table '{table_id}' has an invalid structure: {reason}")]
    InvalidTableStructure { table_id: String, reason: String },

    /// Malformed JSON payload from the server.
    #[error("JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SliceGridError>;

impl SliceGridError {
    pub(crate) fn desync(reason: impl Into<String>) -> Self {
        Self::Desync {
            reason: reason.into(),
        }
    }

    /// Whether the error means client and server disagree and the page must be reloaded.
    pub fn requires_reload(&self) -> bool {
        matches!(
            self,
            Self::Desync { .. }
                | Self::UnknownTable { .. }
                | Self::UnknownViewport { .. }
                | Self::DisplayVersionMismatch { .. }
        )
    }
}

#[cfg(target_arch = "wasm32")]
impl From<SliceGridError> for wasm_bindgen::JsValue {
    fn from(e: SliceGridError) -> Self {
        js_sys::Error::new(&e.to_string()).into()
    }
}
