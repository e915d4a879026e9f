use crate::table::Viewport;
use crate::types::VisiblePosition;

/// Row geometry of the current page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowGeometry {
    pub first_page_row: u32,
    pub row_height: f64,
}

/// Logical anchor of a viewport's current pixel scroll offsets.
///
/// The row anchor is the page row at the top edge; the column anchor is
/// the first column whose right edge reaches past the horizontal offset,
/// translated to the server's column id.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // values are clamped to the u32 range first
pub fn visible_position(viewport: &Viewport, geometry: RowGeometry) -> VisiblePosition {
    let vertical = viewport.vertical_position().max(0.0);
    let (row_anchor, row_anchor_offset) = if geometry.row_height > 0.0 {
        let rows = (vertical / geometry.row_height)
            .floor()
            .min(f64::from(u32::MAX)) as u32;
        (
            geometry.first_page_row.saturating_add(rows),
            (vertical % geometry.row_height).round() as i64,
        )
    } else {
        (geometry.first_page_row, 0)
    };

    let horizontal = viewport.horizontal_position();
    let mut column = 0_usize;
    let mut offset_from_left = 0.0;
    for width in viewport.column_widths() {
        if offset_from_left + width < horizontal {
            offset_from_left += width;
            column += 1;
        } else {
            break;
        }
    }
    let column_anchor = u32::try_from(column + viewport.column_id_offset()).unwrap_or(u32::MAX);

    VisiblePosition {
        row_anchor,
        row_anchor_offset,
        column_anchor,
        column_anchor_offset: (horizontal - offset_from_left).round() as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DisplayVersion;

    fn viewport(vertical: f64, horizontal: f64) -> Viewport {
        let mut vp = Viewport::new("t", DisplayVersion(0), "t_bodyFlex", vec![100.0, 50.0, 80.0], 3);
        vp.set_vertical_position(vertical);
        vp.set_horizontal_position(horizontal);
        vp
    }

    #[test]
    fn anchors_are_page_and_column_id_based() {
        let geometry = RowGeometry {
            first_page_row: 200,
            row_height: 20.0,
        };
        let position = visible_position(&viewport(1234.0, 120.0), geometry);
        assert_eq!(position.row_anchor, 261);
        assert_eq!(position.row_anchor_offset, 14);
        assert_eq!(position.column_anchor, 4);
        assert_eq!(position.column_anchor_offset, 20);
    }

    #[test]
    fn zero_row_height_anchors_to_page_start() {
        let geometry = RowGeometry {
            first_page_row: 7,
            row_height: 0.0,
        };
        let position = visible_position(&viewport(500.0, 0.0), geometry);
        assert_eq!(position.row_anchor, 7);
        assert_eq!(position.row_anchor_offset, 0);
        assert_eq!(position.column_anchor, 3);
    }

    #[test]
    fn offset_past_all_columns_anchors_after_last() {
        let geometry = RowGeometry {
            first_page_row: 0,
            row_height: 20.0,
        };
        let position = visible_position(&viewport(0.0, 1000.0), geometry);
        assert_eq!(position.column_anchor, 6);
        assert_eq!(position.column_anchor_offset, 770);
    }
}
