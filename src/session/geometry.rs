//! Sizes and positions of the table parts for one layout pass.

use crate::ids;
use crate::layout::{LayoutCommand, LayoutQueue};
use crate::table::WindowPolicy;

use super::TableInit;

/// Outcome of fitting the fixed columns next to the minimum flexible space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixedFit {
    /// The fixed part keeps its natural width.
    Fits(f64),
    /// The fixed part is cut down to the largest allowed width.
    Clamped(f64),
    /// Fewer fixed columns are needed; the server renders the table again.
    Reload { fixed_column_amount: usize },
}

/// Width of a table part: columns, one border per column and a closing border.
pub fn table_width(column_widths: &[f64], border_width: f64) -> f64 {
    #[allow(clippy::cast_precision_loss)] // column counts are tiny
    let borders = column_widths.len() as f64 * border_width + border_width;
    column_widths.iter().sum::<f64>() + borders
}

/// Fit the fixed part into `available_width - minimum_flex_space`.
pub fn fit_fixed_columns(
    column_widths: &[f64],
    border_width: f64,
    available_width: f64,
    minimum_flex_space: f64,
    adjustable: bool,
) -> FixedFit {
    let mut width = table_width(column_widths, border_width);
    let maximum = available_width - minimum_flex_space;
    if width <= maximum {
        return FixedFit::Fits(width);
    }
    if !adjustable {
        return FixedFit::Clamped(maximum);
    }
    let mut amount = column_widths.len();
    while amount > 0 && width > maximum {
        width -= column_widths.get(amount - 1).copied().unwrap_or(0.0) + border_width;
        amount -= 1;
    }
    FixedFit::Reload {
        fixed_column_amount: amount,
    }
}

/// Geometry of all table parts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TableGeometry {
    pub available_width: f64,
    pub available_height: f64,
    pub title_height: f64,
    pub header_height: f64,
    /// Width of the fixed part, `0` without one.
    pub fix_width: f64,
    pub flex_left: f64,
    /// On-screen width of the flexible part.
    pub flex_width: f64,
    /// Full width of the flexible table content.
    pub flex_table_width: f64,
    pub body_top: f64,
    /// Visible body height, at least one pixel.
    pub body_height: f64,
    /// Everything above and below the bodies, added to the content height
    /// for the vertical scrollbar extent.
    pub constant_summand: f64,
    pub horizontal_scrollbar_width: f64,
}

/// Result of sizing a table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sizing {
    Layout(TableGeometry),
    Reload { fixed_column_amount: usize },
}

impl TableGeometry {
    pub fn compute(init: &TableInit, policy: &WindowPolicy) -> Sizing {
        let separator = policy.table_separator_px;
        let fix_width = match &init.fix_column_widths {
            Some(widths) => match fit_fixed_columns(
                widths,
                init.border_width,
                init.available_width,
                policy.minimum_flex_space_px,
                init.fixed_column_count_adjustable,
            ) {
                FixedFit::Fits(width) | FixedFit::Clamped(width) => width,
                FixedFit::Reload {
                    fixed_column_amount,
                } => return Sizing::Reload { fixed_column_amount },
            },
            None => 0.0,
        };

        let mut flex_left = fix_width + separator;
        if !init.has_fix_part() {
            // the separator overlaps the missing fixed part by one pixel
            flex_left += 1.0;
        }
        let (flex_width, flex_table_width) = match &init.flex_column_widths {
            Some(widths) => (
                (init.available_width - fix_width - separator).max(0.0),
                table_width(widths, init.border_width),
            ),
            None => (0.0, 0.0),
        };
        let horizontal_scrollbar_width = if flex_width > 0.0 {
            flex_table_width * init.available_width / flex_width
        } else {
            0.0
        };

        let chrome = init.header_height + init.footer_height + init.title_height;
        Sizing::Layout(Self {
            available_width: init.available_width,
            available_height: init.available_height,
            title_height: init.title_height,
            header_height: init.header_height,
            fix_width,
            flex_left,
            flex_width,
            flex_table_width,
            body_top: init.header_height + init.title_height,
            body_height: (init.available_height - chrome).max(1.0),
            constant_summand: chrome,
            horizontal_scrollbar_width,
        })
    }

    /// Queue position and size of headers, bodies and scrollbars.
    pub fn queue_layout(
        &self,
        layout: &mut LayoutQueue,
        table_id: &str,
        has_fix_part: bool,
        has_flex_part: bool,
    ) {
        let mut place = |target: String, x: f64, y: f64, width: f64, height: f64| {
            layout.add_layout(LayoutCommand::SetPosition {
                target: target.clone(),
                x,
                y,
            });
            layout.add_layout(LayoutCommand::SetWidth {
                target: target.clone(),
                width,
            });
            layout.add_layout(LayoutCommand::SetHeight { target, height });
        };
        if has_fix_part {
            place(
                ids::fix_header_id(table_id),
                0.0,
                self.title_height,
                self.fix_width,
                self.header_height,
            );
            place(
                ids::fix_body_id(table_id),
                0.0,
                self.body_top,
                self.fix_width,
                self.body_height,
            );
        }
        if has_flex_part {
            place(
                ids::flex_header_id(table_id),
                self.flex_left,
                self.title_height,
                self.flex_width,
                self.header_height,
            );
            place(
                ids::flex_body_id(table_id),
                self.flex_left,
                self.body_top,
                self.flex_width,
                self.body_height,
            );
            layout.add_layout(LayoutCommand::SetPosition {
                target: ids::horizontal_scrollbar_id(table_id),
                x: 0.0,
                y: self.available_height,
            });
            layout.add_layout(LayoutCommand::SetWidth {
                target: ids::horizontal_scrollbar_id(table_id),
                width: self.available_width,
            });
            layout.add_layout(LayoutCommand::SetWidth {
                target: ids::horizontal_scrollbar_inner_id(table_id),
                width: self.horizontal_scrollbar_width,
            });
        }
        layout.add_layout(LayoutCommand::SetPosition {
            target: ids::vertical_scrollbar_id(table_id),
            x: self.available_width,
            y: 0.0,
        });
        layout.add_layout(LayoutCommand::SetHeight {
            target: ids::vertical_scrollbar_id(table_id),
            height: self.available_height,
        });
    }
}
