use serde::{Deserialize, Serialize};

/// Inclusive range of row indices (`first <= last`).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct RowRange {
    pub first: u32,
    pub last: u32,
}

impl RowRange {
    /// Create a range; returns `None` when `first > last`.
    pub fn new(first: u32, last: u32) -> Option<Self> {
        (first <= last).then_some(Self { first, last })
    }

    /// Number of rows in the range.
    pub fn row_count(&self) -> u32 {
        self.last - self.first + 1
    }

    /// Whether both ranges share at least one row.
    pub fn overlaps(&self, other: &RowRange) -> bool {
        self.first <= other.last && other.first <= self.last
    }
}

/// Row bounds of the server page currently shown by a table.
///
/// An empty page is represented by the absence of a `PageRange`; the
/// server signals it with a negative first row.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageRange {
    pub first_row: u32,
    pub last_row: u32,
}

impl PageRange {
    /// Convert the server's page bounds into a page, treating a negative
    /// first row (or an inverted range) as an empty page.
    pub fn from_server(first_row: i64, last_row: i64) -> Option<Self> {
        Self::new(u32::try_from(first_row).ok()?, u32::try_from(last_row).ok()?)
    }

    /// Create a page; returns `None` when `first_row > last_row`.
    pub fn new(first_row: u32, last_row: u32) -> Option<Self> {
        (first_row <= last_row).then_some(Self {
            first_row,
            last_row,
        })
    }

    pub fn row_count(&self) -> u32 {
        self.last_row - self.first_row + 1
    }

    pub fn rows(&self) -> RowRange {
        RowRange {
            first: self.first_row,
            last: self.last_row,
        }
    }
}

/// Half-open pixel window `[start, stop)` along the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelWindow {
    pub start: f64,
    pub stop: f64,
}

impl PixelWindow {
    /// Window of `margin` pixels around `[view_start, view_stop]`, clipped to `[lower, upper]`.
    pub fn around(view_start: f64, view_stop: f64, margin: f64, lower: f64, upper: f64) -> Self {
        Self {
            start: lower.max(view_start - margin),
            stop: upper.min(view_stop + margin),
        }
    }

    pub fn height(&self) -> f64 {
        (self.stop - self.start).max(0.0)
    }
}

/// Server-issued version stamp of a table's rendered state.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct DisplayVersion(pub i64);

impl DisplayVersion {
    /// Interpret the server's wire value, where `-1` means "undefined".
    pub fn from_server(raw: i64) -> Option<Self> {
        (raw >= 0).then_some(Self(raw))
    }
}

impl std::fmt::Display for DisplayVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_row_range_is_rejected() {
        assert!(RowRange::new(5, 4).is_none());
        assert_eq!(RowRange::new(4, 4).map(|r| r.row_count()), Some(1));
    }

    #[test]
    fn shared_boundary_row_overlaps() {
        let a = RowRange { first: 0, last: 9 };
        let b = RowRange { first: 9, last: 20 };
        let c = RowRange { first: 10, last: 20 };
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn negative_first_row_means_empty_page() {
        assert_eq!(PageRange::from_server(-1, -1), None);
        assert_eq!(PageRange::from_server(3, 2), None);
        let page = PageRange::from_server(100, 199);
        assert_eq!(page.map(|p| p.row_count()), Some(100));
        assert_eq!(page.map(|p| p.rows()), RowRange::new(100, 199));
    }

    #[test]
    fn window_is_clipped_to_bounds() {
        let w = PixelWindow::around(100.0, 500.0, 700.0, 0.0, 2000.0);
        assert!((w.start - 0.0).abs() < f64::EPSILON);
        assert!((w.stop - 1200.0).abs() < f64::EPSILON);
        assert!((w.height() - 1200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn undefined_display_version_is_absent() {
        assert_eq!(DisplayVersion::from_server(-1), None);
        assert_eq!(DisplayVersion::from_server(7), Some(DisplayVersion(7)));
    }
}
