use annotool::shape::{Shape, ShapeKind, DEFAULT_HISTORY_DEPTH};
use proptest::prelude::*;

mod proptest_helpers;

use proptest_helpers::PointEdit;

fn apply(shape: &mut Shape, edit: &PointEdit) {
    match edit {
        PointEdit::Add(x, y) => shape.add_point(*x, *y),
        PointEdit::Set(points) => shape.set_points(points.clone()),
    }
}

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn n_edits_then_n_undos_restores_start(
        initial in proptest_helpers::arb_points(5),
        edits in prop::collection::vec(proptest_helpers::arb_point_edit(), 0..40),
    ) {
        let mut shape = Shape::new("cell", ShapeKind::Polygon);
        shape.set_points(initial.clone());
        let before = shape.points().to_vec();

        for edit in &edits {
            apply(&mut shape, edit);
        }
        for _ in &edits {
            prop_assert!(shape.undo_last_change());
        }
        prop_assert_eq!(shape.points(), before.as_slice());
    }

    #[test]
    fn undo_on_empty_history_is_noop(points in proptest_helpers::arb_points(5)) {
        let mut shape = Shape::new("cell", ShapeKind::Polygon).with_history_depth(1);
        shape.set_points(points.clone());
        prop_assert!(shape.undo_last_change());
        prop_assert!(shape.points().is_empty());

        prop_assert!(!shape.undo_last_change());
        prop_assert!(shape.points().is_empty());
    }

    #[test]
    fn history_never_exceeds_depth(
        depth in 0usize..8,
        edits in prop::collection::vec(proptest_helpers::arb_point_edit(), 0..20),
    ) {
        let mut shape = Shape::new("cell", ShapeKind::Polygon).with_history_depth(depth);
        for edit in &edits {
            apply(&mut shape, edit);
        }
        prop_assert_eq!(shape.history_len(), edits.len().min(depth));
    }

    #[test]
    fn label_edits_are_not_undoable(label in proptest_helpers::arb_label()) {
        let mut shape = Shape::new("before", ShapeKind::Rectangle);
        shape.set_label(label.clone());
        prop_assert!(!shape.undo_last_change());
        prop_assert_eq!(shape.label(), label.as_str());
    }
}

#[test]
fn default_depth_drops_oldest_snapshot() {
    let mut shape = Shape::new("cell", ShapeKind::Polygon);
    for i in 0..DEFAULT_HISTORY_DEPTH + 5 {
        shape.add_point(i as f64, 0.0);
    }
    assert_eq!(shape.history_len(), DEFAULT_HISTORY_DEPTH);
    while shape.undo_last_change() {}
    assert_eq!(shape.points().len(), 5);
}
