//! DOM id conventions shared with the server-side renderer.
//!
//! The server renders every table part with a predictable id derived from
//! the table's control id, so the client never has to search the document.

/// Suffix appended to a body id to address the element holding the slices.
pub const VIEWPORT_SUFFIX: &str = "_viewport";

/// Slice id part of the slice rendered together with the table.
pub const INITIAL_SLICE_ID: u64 = 0;

/// Body region holding the fixed (frozen) columns.
pub fn fix_body_id(table_id: &str) -> String {
    format!("{table_id}_bodyFix")
}

/// Body region holding the flexible (horizontally scrollable) columns.
pub fn flex_body_id(table_id: &str) -> String {
    format!("{table_id}_bodyFlex")
}

/// Header above the fixed body.
pub fn fix_header_id(table_id: &str) -> String {
    format!("{table_id}_headerFix")
}

/// Header above the flexible body; scrolled horizontally along with it.
pub fn flex_header_id(table_id: &str) -> String {
    format!("{table_id}_headerFlex")
}

/// Container of the slices inside a body region.
pub fn viewport_id(body_id: &str) -> String {
    format!("{body_id}{VIEWPORT_SUFFIX}")
}

/// Element holding one slice of rows: `{containerID}_slice-{part}`.
pub fn slice_id(container_id: &str, slice_part: u64) -> String {
    format!("{container_id}_slice-{slice_part}")
}

/// Slice id part of a slice element id, `None` if the id does not follow the convention.
pub fn slice_part_of(slice_id: &str) -> Option<u64> {
    let (_, part) = slice_id.rsplit_once("_slice-")?;
    part.parse().ok()
}

/// Decoupled vertical scrollbar next to the body regions.
pub fn vertical_scrollbar_id(table_id: &str) -> String {
    format!("{table_id}_verticalScroll")
}

/// Spacer inside the vertical scrollbar sized to the page content height.
pub fn vertical_scrollbar_inner_id(table_id: &str) -> String {
    format!("{table_id}_verticalScrollInner")
}

/// Decoupled horizontal scrollbar below the flexible body.
pub fn horizontal_scrollbar_id(table_id: &str) -> String {
    format!("{table_id}_horizontalScroll")
}

/// Spacer inside the horizontal scrollbar sized to the scaled content width.
pub fn horizontal_scrollbar_inner_id(table_id: &str) -> String {
    format!("{table_id}_horizontalScrollInner")
}

/// Outermost element of the table, observed for removal.
pub fn table_root_id(table_id: &str) -> String {
    format!("{table_id}_table")
}
