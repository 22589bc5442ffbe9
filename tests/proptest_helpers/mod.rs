#![allow(dead_code)]

use annotool::geometry::{Pixel, Point, Rect, ShapeType};
use annotool::mask::BinaryMask;
use annotool::shape::{InstanceMask, SegmentMeta, Shape, ShapeKind};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Masks up to `max_side` pixels on a side, with raw bytes in 0..=255 so
/// normalization is exercised too.
pub fn arb_mask(max_side: u32) -> impl Strategy<Value = BinaryMask> {
    (1..=max_side, 1..=max_side).prop_flat_map(|(width, height)| {
        prop::collection::vec(
            prop_oneof![3 => Just(0u8), 1 => Just(255u8), 1 => any::<u8>()],
            (width * height) as usize,
        )
        .prop_map(move |data| BinaryMask::from_raw(width, height, data).expect("sized buffer"))
    })
}

/// Coordinates on a quarter-pixel grid, so they survive a text round trip
/// exactly.
pub fn arb_coord() -> impl Strategy<Value = f64> {
    (-200i32..1000).prop_map(|v| f64::from(v) * 0.25)
}

pub fn arb_point() -> impl Strategy<Value = Point> {
    (arb_coord(), arb_coord()).prop_map(|(x, y)| Point::new(x, y))
}

pub fn arb_points(max_len: usize) -> impl Strategy<Value = Vec<Point>> {
    prop::collection::vec(arb_point(), 0..=max_len)
}

pub fn arb_label() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9+_-]{1,12}"
}

pub fn arb_shape_type() -> impl Strategy<Value = ShapeType> {
    prop_oneof![
        Just(ShapeType::Rectangle),
        Just(ShapeType::Polygon),
        Just(ShapeType::Mask),
    ]
}

/// A point edit applied to a shape.
#[derive(Clone, Debug)]
pub enum PointEdit {
    Add(f64, f64),
    Set(Vec<Point>),
}

pub fn arb_point_edit() -> impl Strategy<Value = PointEdit> {
    prop_oneof![
        arb_point().prop_map(|p| PointEdit::Add(p.x, p.y)),
        arb_points(6).prop_map(PointEdit::Set),
    ]
}

/// A shape as the segmentation post-processor would produce it, with a mask
/// matching its box.
pub fn arb_detected_shape() -> impl Strategy<Value = Shape> {
    (
        arb_label(),
        0u32..80,
        (0u32..=1024).prop_map(|v| v as f32 / 1024.0),
        (0u32..100, 0u32..100),
        arb_mask(12),
    )
        .prop_map(|(label, class_id, confidence, (x, y), mask)| {
            let bbox: Rect<Pixel> = Rect::new(x, y, mask.width(), mask.height());
            let mut shape = Shape::new(
                label,
                ShapeKind::Mask(InstanceMask::Bitmap(mask).compact()),
            )
            .with_segment(SegmentMeta {
                class_id,
                confidence,
                bbox,
            });
            shape.set_points(bbox.corners().to_vec());
            shape
        })
}

/// A user-drawn shape with a point count valid for its type.
pub fn arb_user_shape() -> impl Strategy<Value = Shape> {
    (arb_label(), arb_shape_type(), prop::collection::vec(arb_point(), 3..8)).prop_map(
        |(label, shape_type, mut points)| {
            if shape_type != ShapeType::Polygon {
                points.truncate(2);
            }
            let kind = ShapeKind::from_type(shape_type, &points, (1000, 1000));
            let mut shape = Shape::new(label, kind);
            shape.set_points(points);
            shape
        },
    )
}
