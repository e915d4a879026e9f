use serde::Serialize;

use super::{DisplayVersion, VisiblePosition};

/// Control command dispatched to the server for one table.
///
/// Serialised in the server's `dispatchControlCommand` argument format: the
/// variant name goes into `controlCommand`, fields are camelCase.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(
    tag = "controlCommand",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerCommand {
    /// Ask for the rows of a new slice; piggybacks dismissed slice boundaries.
    RequestSlice {
        #[serde(rename = "controlID")]
        control_id: String,
        display_version: DisplayVersion,
        #[serde(rename = "sliceIDPart")]
        slice_id_part: u64,
        slice_first_row: u32,
        slice_last_row: u32,
        dismissed_boundaries: Vec<u32>,
        display_first_row: Option<u32>,
        display_last_row: Option<u32>,
    },
    /// Report dismissed slices when no new slice is requested.
    DismissSlice {
        #[serde(rename = "controlID")]
        control_id: String,
        display_version: DisplayVersion,
        dismissed_boundaries: Vec<u32>,
        display_first_row: Option<u32>,
        display_last_row: Option<u32>,
    },
    /// Persist the logical scroll anchor of a table.
    UpdateScrollPosition {
        #[serde(rename = "controlID")]
        control_id: String,
        display_version: DisplayVersion,
        row_anchor: u32,
        row_anchor_offset: i64,
        column_anchor: u32,
        column_anchor_offset: i64,
    },
    /// Persist a column width chosen on the client.
    UpdateColumnWidth {
        #[serde(rename = "controlID")]
        control_id: String,
        #[serde(rename = "columnID")]
        column_id: usize,
        new_column_width: f64,
    },
    /// Ask the server to re-render with fewer fixed columns.
    UpdateFixedColumnAmount {
        #[serde(rename = "controlID")]
        control_id: String,
        fixed_column_amount: usize,
    },
}

impl ServerCommand {
    pub fn update_scroll_position(
        control_id: &str,
        display_version: DisplayVersion,
        position: VisiblePosition,
    ) -> Self {
        Self::UpdateScrollPosition {
            control_id: control_id.to_string(),
            display_version,
            row_anchor: position.row_anchor,
            row_anchor_offset: position.row_anchor_offset,
            column_anchor: position.column_anchor,
            column_anchor_offset: position.column_anchor_offset,
        }
    }

    /// Control id of the addressed table.
    pub fn control_id(&self) -> &str {
        match self {
            Self::RequestSlice { control_id, .. }
            | Self::DismissSlice { control_id, .. }
            | Self::UpdateScrollPosition { control_id, .. }
            | Self::UpdateColumnWidth { control_id, .. }
            | Self::UpdateFixedColumnAmount { control_id, .. } => control_id,
        }
    }

    /// Name sent as `controlCommand`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RequestSlice { .. } => "requestSlice",
            Self::DismissSlice { .. } => "dismissSlice",
            Self::UpdateScrollPosition { .. } => "updateScrollPosition",
            Self::UpdateColumnWidth { .. } => "updateColumnWidth",
            Self::UpdateFixedColumnAmount { .. } => "updateFixedColumnAmount",
        }
    }

    /// Slice bookkeeping runs as a system command: it must not interfere
    /// with user-triggered command processing on the server.
    pub fn is_system_command(&self) -> bool {
        matches!(self, Self::RequestSlice { .. } | Self::DismissSlice { .. })
    }

    /// Only the fixed column change blocks the UI, since it reloads the table.
    pub fn uses_wait_pane(&self) -> bool {
        matches!(self, Self::UpdateFixedColumnAmount { .. })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn request_slice_uses_server_field_names() {
        let cmd = ServerCommand::RequestSlice {
            control_id: "c7".to_string(),
            display_version: DisplayVersion(3),
            slice_id_part: 2,
            slice_first_row: 55,
            slice_last_row: 89,
            dismissed_boundaries: vec![14],
            display_first_row: Some(15),
            display_last_row: Some(89),
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["controlCommand"], "requestSlice");
        assert_eq!(json["controlID"], "c7");
        assert_eq!(json["displayVersion"], 3);
        assert_eq!(json["sliceIDPart"], 2);
        assert_eq!(json["sliceFirstRow"], 55);
        assert_eq!(json["dismissedBoundaries"][0], 14);
        assert_eq!(json["displayLastRow"], 89);
        assert_eq!(cmd.name(), "requestSlice");
        assert!(cmd.is_system_command());
    }

    #[test]
    fn empty_display_range_serialises_as_null() {
        let cmd = ServerCommand::DismissSlice {
            control_id: "c7".to_string(),
            display_version: DisplayVersion(1),
            dismissed_boundaries: vec![],
            display_first_row: None,
            display_last_row: None,
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert!(json["displayFirstRow"].is_null());
        assert_eq!(json["controlCommand"], "dismissSlice");
    }
}
