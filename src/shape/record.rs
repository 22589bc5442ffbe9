//! The [`Shape`] annotation record and its per-kind payloads.

use serde::{Deserialize, Serialize};

use super::history::History;
use crate::geometry::{Pixel, Point, Rect, ShapeType};
use crate::mask::{BinaryMask, RleMask};

/// Detection metadata attached to shapes produced by the segmentation
/// post-processor. User-drawn shapes carry none.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentMeta {
    /// Index into the model's class table.
    #[serde(rename = "id")]
    pub class_id: u32,

    /// Maximum class score of the detection.
    pub confidence: f32,

    /// Detection box in image pixels.
    #[serde(rename = "box")]
    pub bbox: Rect<Pixel>,
}

/// A per-instance mask, stored either raw or run-length compacted.
#[derive(Clone, Debug, PartialEq)]
pub enum InstanceMask {
    Bitmap(BinaryMask),
    Rle(RleMask),
}

impl InstanceMask {
    pub fn width(&self) -> u32 {
        match self {
            InstanceMask::Bitmap(mask) => mask.width(),
            InstanceMask::Rle(rle) => rle.width,
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            InstanceMask::Bitmap(mask) => mask.height(),
            InstanceMask::Rle(rle) => rle.height,
        }
    }

    /// Returns the run-length form, encoding if necessary.
    pub fn to_rle(&self) -> RleMask {
        match self {
            InstanceMask::Bitmap(mask) => RleMask::from_mask(mask),
            InstanceMask::Rle(rle) => rle.clone(),
        }
    }

    /// Returns the bitmap form, decoding if necessary.
    pub fn to_bitmap(&self) -> BinaryMask {
        match self {
            InstanceMask::Bitmap(mask) => mask.clone(),
            InstanceMask::Rle(rle) => rle.to_mask(),
        }
    }

    /// Converts into the run-length form.
    pub fn compact(self) -> Self {
        match self {
            InstanceMask::Bitmap(mask) => InstanceMask::Rle(RleMask::from_mask(&mask)),
            rle @ InstanceMask::Rle(_) => rle,
        }
    }

    pub fn is_compact(&self) -> bool {
        matches!(self, InstanceMask::Rle(_))
    }
}

/// What a shape's point list means, with the payload each kind needs.
///
/// Only mask shapes can carry a mask, and they always do.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeKind {
    /// Two opposite corners.
    Rectangle,
    /// Three or more vertices.
    Polygon,
    /// Bounding-box corners plus the instance mask covering that box.
    Mask(InstanceMask),
}

impl ShapeKind {
    /// The discriminator written to annotation files.
    pub fn shape_type(&self) -> ShapeType {
        match self {
            ShapeKind::Rectangle => ShapeType::Rectangle,
            ShapeKind::Polygon => ShapeType::Polygon,
            ShapeKind::Mask(_) => ShapeType::Mask,
        }
    }

    /// Builds a kind from a bare discriminator.
    ///
    /// A mask kind needs a mask; without one it gets a fully-foreground mask
    /// spanning the bounding box of `points`, clipped to an image of
    /// `bounds` (width, height).
    pub fn from_type(shape_type: ShapeType, points: &[Point], bounds: (u32, u32)) -> Self {
        match shape_type {
            ShapeType::Rectangle => ShapeKind::Rectangle,
            ShapeType::Polygon => ShapeKind::Polygon,
            ShapeType::Mask => {
                let (width, height) = clipped_extent(points, bounds);
                ShapeKind::Mask(InstanceMask::Rle(RleMask::filled(width, height)))
            }
        }
    }

    /// Minimum number of points a well-formed shape of this kind has.
    pub fn min_points(&self) -> usize {
        match self {
            ShapeKind::Rectangle | ShapeKind::Mask(_) => 2,
            ShapeKind::Polygon => 3,
        }
    }

    /// Maximum number of points, if bounded.
    pub fn max_points(&self) -> Option<usize> {
        match self {
            ShapeKind::Rectangle | ShapeKind::Mask(_) => Some(2),
            ShapeKind::Polygon => None,
        }
    }
}

fn clipped_extent(points: &[Point], (bound_width, bound_height): (u32, u32)) -> (u32, u32) {
    let finite = points.iter().filter(|p| p.is_finite());
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in finite {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    if max_x < min_x || max_y < min_y {
        return (0, 0);
    }
    let (w, h) = (f64::from(bound_width), f64::from(bound_height));
    let span = |lo: f64, hi: f64, bound: f64| (hi.clamp(0.0, bound) - lo.clamp(0.0, bound)).round() as u32;
    (span(min_x, max_x, w), span(min_y, max_y, h))
}

/// One labelled annotation on an image.
#[derive(Clone, Debug)]
pub struct Shape {
    label: String,
    kind: ShapeKind,
    points: Vec<Point>,
    segment: Option<SegmentMeta>,
    history: History<Vec<Point>>,
}

impl Shape {
    /// Creates a shape with no points and empty history.
    pub fn new(label: impl Into<String>, kind: ShapeKind) -> Self {
        Self {
            label: label.into(),
            kind,
            points: Vec::new(),
            segment: None,
            history: History::default(),
        }
    }

    /// Attaches detection metadata.
    pub fn with_segment(mut self, segment: SegmentMeta) -> Self {
        self.segment = Some(segment);
        self
    }

    /// Sets how many point snapshots are kept for undo.
    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history.set_capacity(depth);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Replaces the label. Not recorded in history.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    /// Replaces the kind (and with it any mask). Not recorded in history.
    pub fn set_kind(&mut self, kind: ShapeKind) {
        self.kind = kind;
    }

    pub fn shape_type(&self) -> ShapeType {
        self.kind.shape_type()
    }

    /// The instance mask, for mask shapes.
    pub fn mask(&self) -> Option<&InstanceMask> {
        match &self.kind {
            ShapeKind::Mask(mask) => Some(mask),
            _ => None,
        }
    }

    pub fn segment(&self) -> Option<&SegmentMeta> {
        self.segment.as_ref()
    }

    pub fn set_segment(&mut self, segment: Option<SegmentMeta>) {
        self.segment = segment;
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Appends a point, saving the previous point list for undo.
    pub fn add_point(&mut self, x: f64, y: f64) {
        self.save_history();
        self.points.push(Point::new(x, y));
    }

    /// Replaces all points, saving the previous point list for undo.
    pub fn set_points(&mut self, points: impl Into<Vec<Point>>) {
        self.save_history();
        self.points = points.into();
    }

    /// Restores the point list from before the most recent point edit.
    ///
    /// Returns false, leaving the shape untouched, if there is nothing to undo.
    pub fn undo_last_change(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.points = previous;
                true
            }
            None => false,
        }
    }

    /// Number of undo steps available.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn save_history(&mut self) {
        self.history.push(self.points.clone());
    }
}

// History is edit state, not part of the record.
impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
            && self.kind == other.kind
            && self.points == other.points
            && self.segment == other.segment
    }
}
