//! Table registry tests
//!
//! Creation, re-layout, fixed column reloads, column moves and teardown
//! as seen from the page.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use common::{fire_timers, run_frames, shown_table, split_table, split_table_json, FakeHost};
use slicegrid::host::{TimerKind, TimerToken};
use slicegrid::ids;
use slicegrid::session::Part;
use slicegrid::types::{ClientDisplayData, PaneRange, ServerCommand, VisiblePane};
use slicegrid::{LayoutOutcome, SliceGridError, TableInit, TableRegistry};
use test_case::test_case;

const TABLE: &str = "t";

fn crowded_fixed_part(id: &str) -> TableInit {
    let mut init = split_table(id);
    init.fix_column_widths = Some(vec![400.0, 400.0]);
    init.fixed_column_count_adjustable = true;
    init
}

#[test]
fn first_layout_creates_then_resizes() {
    let mut registry = TableRegistry::new();
    let mut host = FakeHost::new();
    let init = split_table(TABLE);

    assert_eq!(registry.layout_table(&mut host, &init).unwrap(), LayoutOutcome::Created);
    assert!(host.applied.is_empty(), "nothing is written before the layout pass");
    registry.run_layout(&mut host).unwrap();
    assert!(!host.applied.is_empty());
    assert!(registry.layout_queue().is_empty());

    assert_eq!(registry.layout_table(&mut host, &init).unwrap(), LayoutOutcome::Resized);
    assert_eq!(registry.len(), 1);
}

#[test]
fn relayout_with_other_display_version_is_a_desync() {
    let (mut registry, mut host) = shown_table(TABLE);
    let init = TableInit::from_json(&split_table_json(TABLE, 2)).unwrap();
    let err = registry.layout_table(&mut host, &init).unwrap_err();
    assert!(matches!(
        err,
        SliceGridError::DisplayVersionMismatch { expected: 1, actual: 2, .. }
    ));
    assert!(err.requires_reload());
}

#[test]
fn relayout_with_undefined_display_version_resizes() {
    let (mut registry, mut host) = shown_table(TABLE);
    let mut init = TableInit::from_json(&split_table_json(TABLE, -1)).unwrap();
    init.available_height = 630.0;
    assert_eq!(registry.layout_table(&mut host, &init).unwrap(), LayoutOutcome::Resized);
    assert_eq!(registry.get(TABLE).unwrap().manager().visible_height(), 600.0);
}

#[test]
fn undefined_display_version_cannot_create() {
    let mut registry = TableRegistry::new();
    let mut host = FakeHost::new();
    let init = TableInit::from_json(&split_table_json(TABLE, -1)).unwrap();
    assert!(matches!(
        registry.layout_table(&mut host, &init),
        Err(SliceGridError::MissingDisplayVersion { .. })
    ));
    assert!(registry.is_empty());
}

#[test]
fn table_without_parts_is_rejected() {
    let mut registry = TableRegistry::new();
    let mut host = FakeHost::new();
    let mut init = split_table(TABLE);
    init.fix_column_widths = None;
    init.flex_column_widths = None;
    assert!(matches!(
        registry.layout_table(&mut host, &init),
        Err(SliceGridError::InvalidTableStructure { .. })
    ));
}

#[test]
fn crowded_fixed_part_asks_server_for_fewer_columns() {
    let mut registry = TableRegistry::new();
    let mut host = FakeHost::new();
    let init = crowded_fixed_part(TABLE);

    assert_eq!(
        registry.layout_table(&mut host, &init).unwrap(),
        LayoutOutcome::ReloadRequested { fixed_column_amount: 1 }
    );
    // a burst of layouts sends one reload
    registry.layout_table(&mut host, &init).unwrap();
    assert_eq!(host.pending_timers(), 1);
    assert!(registry.is_empty());
    assert!(host.sent.is_empty());

    fire_timers(&mut registry, &mut host);
    assert_eq!(
        host.take_sent(),
        vec![ServerCommand::UpdateFixedColumnAmount {
            control_id: TABLE.to_string(),
            fixed_column_amount: 1,
        }]
    );
}

#[test]
fn crowded_fixed_part_without_adjustment_is_clamped() {
    let mut registry = TableRegistry::new();
    let mut host = FakeHost::new();
    let mut init = crowded_fixed_part(TABLE);
    init.fixed_column_count_adjustable = false;

    assert_eq!(registry.layout_table(&mut host, &init).unwrap(), LayoutOutcome::Created);
    // 800 - 150 minimum flexible space
    assert_eq!(registry.get(TABLE).unwrap().geometry().fix_width, 650.0);
}

#[test]
fn removing_table_releases_frames_and_timers() {
    let (mut registry, mut host) = shown_table(TABLE);
    let scrollbar = ids::vertical_scrollbar_id(TABLE);
    host.user_scroll_top(&scrollbar, 400.0);
    registry.on_scroll(&mut host, TABLE, &scrollbar);
    // apply frame and echoes, leaving the settle timer and the re-arm frame
    let (_, token) = host.frames.pop_front().unwrap();
    registry.on_frame(&mut host, &token).unwrap();
    assert_eq!(host.pending_timers(), 1);
    assert_eq!(host.pending_frames(), 1);

    registry.remove_table(&mut host, TABLE);
    assert_eq!(host.pending_timers(), 0);
    assert_eq!(host.pending_frames(), 0);
    assert!(!registry.contains(TABLE));
}

#[test]
fn removing_table_cancels_pending_reload() {
    let mut registry = TableRegistry::new();
    let mut host = FakeHost::new();
    registry
        .layout_table(&mut host, &crowded_fixed_part(TABLE))
        .unwrap();
    registry.remove_table(&mut host, TABLE);
    assert_eq!(host.pending_timers(), 0);
}

#[test]
fn events_for_removed_table_are_ignored() {
    let (mut registry, mut host) = shown_table(TABLE);
    registry.remove_table(&mut host, TABLE);
    host.sent.clear();
    let applied = host.applied.len();

    registry.on_timer(
        &mut host,
        &TimerToken {
            table_id: TABLE.to_string(),
            kind: TimerKind::ScrollSettled,
        },
    );
    registry.scroll_to_requested_position(&mut host, TABLE, None);
    registry.request_completed(&mut host, TABLE, slicegrid::host::RequestTicket(1));
    assert!(!registry.on_wheel(&mut host, TABLE, 40.0));

    assert!(host.sent.is_empty());
    assert_eq!(host.applied.len(), applied);
}

#[test]
fn layout_of_removed_table_is_skipped() {
    let mut registry = TableRegistry::new();
    let mut host = FakeHost::new();
    registry.layout_table(&mut host, &split_table(TABLE)).unwrap();
    registry.remove_table(&mut host, TABLE);
    registry.run_layout(&mut host).unwrap();
    assert!(host.applied.is_empty());
    assert!(host.sent.is_empty());
}

#[test]
fn tables_are_independent() {
    let mut registry = TableRegistry::new();
    let mut host = FakeHost::new();
    registry.layout_table(&mut host, &split_table("a")).unwrap();
    registry.layout_table(&mut host, &split_table("b")).unwrap();
    registry.run_layout(&mut host).unwrap();
    run_frames(&mut registry, &mut host, "a");
    run_frames(&mut registry, &mut host, "b");

    let scrollbar = ids::vertical_scrollbar_id("a");
    host.user_scroll_top(&scrollbar, 240.0);
    registry.on_scroll(&mut host, "a", &scrollbar);
    run_frames(&mut registry, &mut host, "a");

    assert_eq!(host.top(&ids::fix_body_id("a")), 240.0);
    assert_eq!(host.top(&ids::fix_body_id("b")), 0.0);
    let mut table_ids: Vec<&str> = registry.table_ids().collect();
    table_ids.sort_unstable();
    assert_eq!(table_ids, vec!["a", "b"]);
}

#[test]
fn requested_pane_moves_scrollbars() {
    let (mut registry, mut host) = shown_table(TABLE);
    let data = ClientDisplayData {
        visible_pane: VisiblePane {
            row_range: Some(PaneRange::new(500, 501, None)),
            column_range: None,
        },
        ..ClientDisplayData::default()
    };
    registry.scroll_to_requested_position(&mut host, TABLE, Some(data));
    run_frames(&mut registry, &mut host, TABLE);

    // rows 500..=501 centered in a 400px body: 10000 - (400 - 40) / 2
    let scrollbar = ids::vertical_scrollbar_id(TABLE);
    assert_eq!(host.top(&scrollbar), 9820.0);
    assert_eq!(host.top(&ids::flex_body_id(TABLE)), 9820.0);
}

#[test]
fn stored_position_is_restored_on_creation() {
    let mut registry = TableRegistry::new();
    let mut host = FakeHost::new();
    let json = split_table_json(TABLE, 1).replacen(
        "\"borderWidth\"",
        r#""clientDisplayData": {
            "visiblePane": {"rowRange": {"firstIndex": -1, "lastIndex": -1}},
            "viewportState": {"rowAnchor": {"index": 40, "indexPixelOffset": 5}}
        },
        "borderWidth""#,
        1,
    );
    let init = TableInit::from_json(&json).unwrap();
    registry.layout_table(&mut host, &init).unwrap();
    registry.run_layout(&mut host).unwrap();
    run_frames(&mut registry, &mut host, TABLE);

    assert_eq!(host.top(&ids::fix_body_id(TABLE)), 805.0);
    assert_eq!(host.top(&ids::vertical_scrollbar_id(TABLE)), 805.0);
}

#[test_case(1, 3, Part::Flexible, 1, false ; "within flexible part")]
#[test_case(3, 1, Part::Flexible, 1, false ; "onto boundary as flexible")]
#[test_case(3, 1, Part::Fixed, 2, true ; "onto boundary as fixed")]
#[test_case(0, 5, Part::Flexible, 0, true ; "fixed column leaves")]
fn column_moves(from: usize, insert_before: usize, part: Part, fixed: usize, notifies: bool) {
    let (mut registry, mut host) = shown_table(TABLE);
    host.sent.clear();
    let reorder = registry
        .reorder_columns(&mut host, TABLE, from, insert_before, part)
        .unwrap();
    assert_eq!(reorder.fixed_count, fixed);
    assert_eq!(reorder.order.len(), 11);
    let sent = host.take_sent();
    assert_eq!(
        sent.iter()
            .any(|command| matches!(command, ServerCommand::UpdateFixedColumnAmount { .. })),
        notifies
    );
}

#[test]
fn column_move_outside_table_is_rejected() {
    let (mut registry, mut host) = shown_table(TABLE);
    assert!(matches!(
        registry.reorder_columns(&mut host, TABLE, 11, 0, Part::Flexible),
        Err(SliceGridError::InvalidColumnIndex { index: 11, count: 11 })
    ));
}
