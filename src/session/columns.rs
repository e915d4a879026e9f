//! Column moves across the fixed/flexible boundary.

/// Table part a dragged column is dropped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    Fixed,
    Flexible,
}

/// Column order and fixed column count after a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnReorder {
    /// Column ids in their new display order.
    pub order: Vec<usize>,
    pub fixed_count: usize,
}

impl ColumnReorder {
    pub fn changes_fixed_count(&self, previous: usize) -> bool {
        self.fixed_count != previous
    }
}

/// Move column `from` in front of column `insert_before` (`column_count`
/// appends it).
///
/// Dropping exactly onto the boundary is ambiguous: the column may become
/// the last fixed or the first flexible column, so `drop_part` decides.
/// Returns `None` for indices outside the table.
pub fn reorder_columns(
    column_count: usize,
    fixed_count: usize,
    from: usize,
    insert_before: usize,
    drop_part: Part,
) -> Option<ColumnReorder> {
    if from >= column_count || insert_before > column_count {
        return None;
    }
    let fixed_count = fixed_count.min(column_count);
    let was_fixed = from < fixed_count;
    let becomes_fixed = insert_before < fixed_count
        || (insert_before == fixed_count && drop_part == Part::Fixed);

    let mut order: Vec<usize> = (0..column_count).collect();
    let moved = order.remove(from);
    let target = if insert_before > from {
        insert_before - 1
    } else {
        insert_before
    };
    order.insert(target.min(order.len()), moved);

    let fixed_count = match (was_fixed, becomes_fixed) {
        (true, false) => fixed_count - 1,
        (false, true) => fixed_count + 1,
        _ => fixed_count,
    };
    Some(ColumnReorder { order, fixed_count })
}
