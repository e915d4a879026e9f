use serde::Serialize;

use crate::types::RowRange;

/// Which edge of a slice its insert position refers to.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InsertStrategy {
    /// Insert position is the slice's bottom edge; the slice grows upwards.
    Above,
    /// Insert position is the slice's top edge; the slice grows downwards.
    Below,
}

impl std::fmt::Display for InsertStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Above => f.write_str("above"),
            Self::Below => f.write_str("below"),
        }
    }
}

/// One contiguous run of rendered rows inside a viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    id: String,
    part: u64,
    insert_position: f64,
    strategy: InsertStrategy,
    rows: RowRange,
    row_height: f64,
    displayed: bool,
}

impl Slice {
    /// A slice that has been requested but whose markup has not arrived yet.
    pub fn pending(
        id: String,
        part: u64,
        insert_position: f64,
        strategy: InsertStrategy,
        rows: RowRange,
        row_height: f64,
    ) -> Self {
        Self {
            id,
            part,
            insert_position,
            strategy,
            rows,
            row_height,
            displayed: false,
        }
    }

    /// DOM id of the slice element.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Id part shared by the slices of all viewports requested together.
    pub fn part(&self) -> u64 {
        self.part
    }

    pub fn insert_position(&self) -> f64 {
        self.insert_position
    }

    pub fn strategy(&self) -> InsertStrategy {
        self.strategy
    }

    pub fn rows(&self) -> RowRange {
        self.rows
    }

    pub fn first_row(&self) -> u32 {
        self.rows.first
    }

    pub fn last_row(&self) -> u32 {
        self.rows.last
    }

    pub fn row_count(&self) -> u32 {
        self.rows.row_count()
    }

    pub fn height(&self) -> f64 {
        self.row_height * f64::from(self.row_count())
    }

    /// Edge with the smaller pixel offset.
    pub fn upper_bound(&self) -> f64 {
        match self.strategy {
            InsertStrategy::Below => self.insert_position,
            InsertStrategy::Above => self.insert_position - self.height(),
        }
    }

    /// Edge with the larger pixel offset.
    pub fn lower_bound(&self) -> f64 {
        match self.strategy {
            InsertStrategy::Below => self.insert_position + self.height(),
            InsertStrategy::Above => self.insert_position,
        }
    }

    /// Whether the slice lies completely outside `(start, stop)`.
    ///
    /// Touching edges count as no intersection.
    pub fn no_intersection(&self, start: f64, stop: f64) -> bool {
        self.upper_bound() >= stop || self.lower_bound() <= start
    }

    pub fn is_displayed(&self) -> bool {
        self.displayed
    }

    pub(crate) fn mark_displayed(&mut self) {
        self.displayed = true;
    }

    /// Point the slice at a different row range after the server re-rendered it.
    pub(crate) fn rebind(&mut self, rows: RowRange) {
        self.rows = rows;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::float_cmp)]
    use super::*;

    fn slice(strategy: InsertStrategy, position: f64) -> Slice {
        Slice::pending(
            "t_bodyFix_viewport_slice-1".to_string(),
            1,
            position,
            strategy,
            RowRange::new(10, 19).unwrap(),
            20.0,
        )
    }

    #[test]
    fn bounds_follow_the_strategy() {
        let below = slice(InsertStrategy::Below, 200.0);
        assert_eq!(below.upper_bound(), 200.0);
        assert_eq!(below.lower_bound(), 400.0);

        let above = slice(InsertStrategy::Above, 400.0);
        assert_eq!(above.upper_bound(), 200.0);
        assert_eq!(above.lower_bound(), 400.0);
    }

    #[test]
    fn touching_window_does_not_intersect() {
        let below = slice(InsertStrategy::Below, 200.0);
        assert!(below.no_intersection(400.0, 900.0));
        assert!(below.no_intersection(0.0, 200.0));
        assert!(!below.no_intersection(399.0, 900.0));
    }

    #[test]
    fn new_slices_are_pending() {
        let mut s = slice(InsertStrategy::Below, 0.0);
        assert!(!s.is_displayed());
        s.mark_displayed();
        assert!(s.is_displayed());
    }
}
