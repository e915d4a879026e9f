use serde::{Deserialize, Deserializer};

use crate::error::{Result, SliceGridError};
use crate::table::WindowPolicy;
use crate::types::{ClientDisplayData, DisplayVersion, PageRange, RowRange};

/// Layout data the server renders along with a table.
///
/// The server marks missing values with `-1`; those arrive here as `None`.
/// An absent first page row means an empty page, an absent display version
/// means "unchanged", which is only allowed when an existing table is laid
/// out again.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInit {
    #[serde(rename = "controlID")]
    pub control_id: String,
    #[serde(default, deserialize_with = "version_or_absent")]
    pub display_version: Option<DisplayVersion>,
    #[serde(default, deserialize_with = "row_or_absent")]
    pub first_page_row: Option<u32>,
    #[serde(default, deserialize_with = "row_or_absent")]
    pub last_page_row: Option<u32>,
    /// Rows of the initially rendered slice.
    #[serde(default, deserialize_with = "row_or_absent")]
    pub first_slice_row: Option<u32>,
    #[serde(default, deserialize_with = "row_or_absent")]
    pub last_slice_row: Option<u32>,
    pub available_width: f64,
    pub available_height: f64,
    #[serde(default)]
    pub title_height: f64,
    #[serde(default)]
    pub header_height: f64,
    #[serde(default)]
    pub footer_height: f64,
    /// Column widths of the fixed part, absent without fixed part.
    #[serde(default)]
    pub fix_column_widths: Option<Vec<f64>>,
    /// Column widths of the flexible part, absent without flexible part.
    #[serde(default)]
    pub flex_column_widths: Option<Vec<f64>>,
    #[serde(default)]
    pub border_width: f64,
    #[serde(default)]
    pub fixed_column_count_adjustable: bool,
    #[serde(default)]
    pub client_display_data: Option<ClientDisplayData>,
    #[serde(default)]
    pub policy: Option<WindowPolicy>,
}

fn version_or_absent<'de, D>(deserializer: D) -> std::result::Result<Option<DisplayVersion>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.and_then(DisplayVersion::from_server))
}

fn row_or_absent<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.and_then(|row| u32::try_from(row).ok()))
}

impl TableInit {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn display_version(&self) -> Option<DisplayVersion> {
        self.display_version
    }

    pub fn page(&self) -> Option<PageRange> {
        PageRange::new(self.first_page_row?, self.last_page_row?)
    }

    pub fn initial_rows(&self) -> Option<RowRange> {
        RowRange::new(self.first_slice_row?, self.last_slice_row?)
    }

    pub fn policy(&self) -> WindowPolicy {
        self.policy.unwrap_or_default()
    }

    pub fn has_fix_part(&self) -> bool {
        self.fix_column_widths.is_some()
    }

    pub fn has_flex_part(&self) -> bool {
        self.flex_column_widths.is_some()
    }

    pub fn fix_column_count(&self) -> usize {
        self.fix_column_widths.as_ref().map_or(0, Vec::len)
    }

    /// A table needs at least one body part.
    pub fn validate(&self) -> Result<()> {
        if !self.has_fix_part() && !self.has_flex_part() {
            return Err(SliceGridError::InvalidTableStructure {
                table_id: self.control_id.clone(),
                reason: "neither fixed nor flexible part".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::float_cmp)]
    use super::*;

    #[test]
    fn server_json_with_defaults() {
        let init = TableInit::from_json(
            r#"{
                "controlID": "c3",
                "displayVersion": 4,
                "firstPageRow": 0,
                "lastPageRow": 999,
                "firstSliceRow": 0,
                "lastSliceRow": 29,
                "availableWidth": 800,
                "availableHeight": 430,
                "headerHeight": 30,
                "flexColumnWidths": [100, 120]
            }"#,
        )
        .unwrap();
        assert_eq!(init.display_version(), Some(DisplayVersion(4)));
        assert_eq!(init.page().map(|p| p.row_count()), Some(1000));
        assert_eq!(init.initial_rows(), RowRange::new(0, 29));
        assert!(!init.has_fix_part());
        assert_eq!(init.policy(), WindowPolicy::default());
        assert!(init.validate().is_ok());
    }

    #[test]
    fn undefined_values_stay_absent() {
        let init = TableInit::from_json(
            r#"{"controlID": "c3", "availableWidth": 800, "availableHeight": 400}"#,
        )
        .unwrap();
        assert_eq!(init.display_version(), None);
        assert_eq!(init.page(), None);
        assert_eq!(init.initial_rows(), None);
        assert!(matches!(
            init.validate(),
            Err(SliceGridError::InvalidTableStructure { .. })
        ));
    }

    #[test]
    fn negative_wire_values_arrive_as_absent() {
        let init = TableInit::from_json(
            r#"{
                "controlID": "c3",
                "displayVersion": -1,
                "firstPageRow": -1,
                "lastPageRow": -1,
                "firstSliceRow": -1,
                "lastSliceRow": -1,
                "availableWidth": 800,
                "availableHeight": 400,
                "flexColumnWidths": [100]
            }"#,
        )
        .unwrap();
        assert_eq!(init.display_version, None);
        assert_eq!(init.first_page_row, None);
        assert_eq!(init.last_slice_row, None);
        assert_eq!(init.page(), None);
        assert_eq!(init.initial_rows(), None);
    }

    #[test]
    fn malformed_payload_is_a_json_error() {
        assert!(matches!(
            TableInit::from_json("{\"controlID\": 3}"),
            Err(SliceGridError::Json(_))
        ));
    }
}
