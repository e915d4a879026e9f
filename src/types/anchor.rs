//! Resolution-independent scroll positions exchanged with the server.
//!
//! The server encodes "absent" as index `-1`. These types convert that
//! sentinel to `Option` at the deserialisation boundary so the rest of the
//! crate never compares against magic numbers.

use serde::{Deserialize, Deserializer, Serialize};

/// A row or column index plus a pixel offset into that row/column.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Anchor {
    pub index: u32,
    #[serde(rename = "indexPixelOffset")]
    pub pixel_offset: f64,
}

impl Anchor {
    pub fn new(index: u32, pixel_offset: f64) -> Self {
        Self {
            index,
            pixel_offset,
        }
    }
}

/// Range of rows or columns the server wants shown, with one member that
/// must be visible even when the whole range does not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaneRange {
    pub first: u32,
    pub last: u32,
    /// Index that must end up visible; falls back to `first` when the server sends none.
    pub forced_visible: Option<u32>,
}

impl PaneRange {
    pub fn new(first: u32, last: u32, forced_visible: Option<u32>) -> Self {
        Self {
            first,
            last,
            forced_visible,
        }
    }

    pub fn forced_visible_or_first(&self) -> u32 {
        self.forced_visible.unwrap_or(self.first)
    }
}

/// Row and column pane requested by the server.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VisiblePane {
    #[serde(default, deserialize_with = "pane_range_or_absent")]
    pub row_range: Option<PaneRange>,
    #[serde(default, deserialize_with = "pane_range_or_absent")]
    pub column_range: Option<PaneRange>,
}

/// Anchors the server stored from an earlier visit of the table.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ViewportState {
    #[serde(default, deserialize_with = "anchor_or_absent")]
    pub row_anchor: Option<Anchor>,
    #[serde(default, deserialize_with = "anchor_or_absent")]
    pub column_anchor: Option<Anchor>,
}

/// Display request sent by the server along with a table rendering.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClientDisplayData {
    #[serde(default)]
    pub visible_pane: VisiblePane,
    #[serde(default)]
    pub viewport_state: ViewportState,
}

/// Logical scroll position of a viewport as persisted on the server.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VisiblePosition {
    pub row_anchor: u32,
    pub row_anchor_offset: i64,
    pub column_anchor: u32,
    pub column_anchor_offset: i64,
}

/// Pixel scroll offsets to apply to a table.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Default)]
pub struct ScrollPositions {
    pub horizontal: f64,
    pub vertical: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPaneRange {
    first_index: i64,
    last_index: i64,
    #[serde(default = "absent_index")]
    forced_visible_index_in_range: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnchor {
    index: i64,
    #[serde(default)]
    index_pixel_offset: f64,
}

fn absent_index() -> i64 {
    -1
}

fn pane_range_or_absent<'de, D>(deserializer: D) -> Result<Option<PaneRange>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawPaneRange>::deserialize(deserializer)?;
    Ok(raw.and_then(|r| {
        let first = u32::try_from(r.first_index).ok()?;
        let last = u32::try_from(r.last_index).ok()?;
        let forced = u32::try_from(r.forced_visible_index_in_range).ok();
        Some(PaneRange::new(first, last.max(first), forced))
    }))
}

fn anchor_or_absent<'de, D>(deserializer: D) -> Result<Option<Anchor>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawAnchor>::deserialize(deserializer)?;
    Ok(raw.and_then(|a| {
        let index = u32::try_from(a.index).ok()?;
        Some(Anchor::new(index, a.index_pixel_offset))
    }))
}
