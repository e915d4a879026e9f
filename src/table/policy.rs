use serde::{Deserialize, Serialize};

/// Tuning of the row window around the visible part of a table.
///
/// All margins are in pixels. The keep margin is the largest so slices are
/// not thrown away merely for brushing the edge; the trigger margin decides
/// when the held range is considered too short; the request margin is how
/// far beyond the visible area a new request reaches.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct WindowPolicy {
    /// Upper bound of the keep margin.
    pub max_keep_px: f64,
    /// Lower bound of the trigger margin.
    pub min_trigger_px: f64,
    /// Upper bound of the request margin.
    pub max_request_px: f64,
    /// Quiet time after the last scroll event before slices are re-evaluated.
    pub settle_delay_ms: u32,
    /// Width the flexible part keeps at least when fixed columns are fitted.
    pub minimum_flex_space_px: f64,
    /// Width of the separator between fixed and flexible part.
    pub table_separator_px: f64,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            max_keep_px: 700.0,
            min_trigger_px: 400.0,
            max_request_px: 700.0,
            settle_delay_ms: 100,
            minimum_flex_space_px: 150.0,
            table_separator_px: 5.0,
        }
    }
}

impl WindowPolicy {
    /// Twice the visible height, capped at `max_keep_px`.
    pub fn keep_limit(&self, visible_height: f64) -> f64 {
        (visible_height * 2.0).min(self.max_keep_px)
    }

    /// Half the visible height, but at least `min_trigger_px`.
    pub fn trigger_limit(&self, visible_height: f64) -> f64 {
        (visible_height / 2.0).max(self.min_trigger_px)
    }

    /// Twice the visible height, capped at `max_request_px`.
    pub fn request_offset(&self, visible_height: f64) -> f64 {
        (visible_height * 2.0).min(self.max_request_px)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::float_cmp)]
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case(100.0, 200.0, 400.0, 200.0 ; "small viewport")]
    #[test_case(400.0, 700.0, 400.0, 700.0 ; "caps at maximum")]
    #[test_case(1000.0, 700.0, 500.0, 700.0 ; "trigger grows with viewport")]
    fn margins(height: f64, keep: f64, trigger: f64, request: f64) {
        let policy = WindowPolicy::default();
        assert_eq!(policy.keep_limit(height), keep);
        assert_eq!(policy.trigger_limit(height), trigger);
        assert_eq!(policy.request_offset(height), request);
    }

    #[test]
    fn partial_override_keeps_defaults() {
        let policy: WindowPolicy = serde_json::from_str(r#"{"maxKeepPx": 300}"#).unwrap();
        assert_eq!(policy.max_keep_px, 300.0);
        assert_eq!(policy.settle_delay_ms, 100);
    }

    proptest! {
        #[test]
        fn margins_never_shrink_with_height(low in 1.0f64..5000.0, extra in 0.0f64..5000.0) {
            let policy = WindowPolicy::default();
            let high = low + extra;
            prop_assert!(policy.keep_limit(low) <= policy.keep_limit(high));
            prop_assert!(policy.trigger_limit(low) <= policy.trigger_limit(high));
            prop_assert!(policy.request_offset(low) <= policy.request_offset(high));
            prop_assert!(policy.trigger_limit(low) >= policy.min_trigger_px);
        }
    }
}
