//! Integer axis-aligned boxes in XYWH form.

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use super::point::Point;

/// An axis-aligned box given by its top-left corner and size, in whole pixels
/// of the coordinate space `TSpace` ([`Pixel`](super::Pixel) or
/// [`MaskGrid`](super::MaskGrid)).
///
/// Boxes produced by [`Rect::from_center`] are always clipped to their bounds,
/// so `x + width` and `y + height` never exceed the space they were built for.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect<TSpace> {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    _space: PhantomData<TSpace>,
}

impl<TSpace> Rect<TSpace> {
    /// Creates a new box from its top-left corner and size.
    #[inline]
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            _space: PhantomData,
        }
    }

    /// Decodes a center-form box, rounds it to whole pixels and clips it to
    /// `[0, bound_width) x [0, bound_height)`.
    ///
    /// Rounding is half-to-even. A box that ends up with no overlap collapses
    /// to the empty box at the origin.
    pub fn from_center(
        cx: f32,
        cy: f32,
        width: f32,
        height: f32,
        bound_width: u32,
        bound_height: u32,
    ) -> Self {
        let x0 = round_px(cx - 0.5 * width);
        let y0 = round_px(cy - 0.5 * height);
        let x1 = x0.saturating_add(round_px(width));
        let y1 = y0.saturating_add(round_px(height));
        Self::clipped(x0, y0, x1, y1, bound_width, bound_height)
    }

    /// Builds a box from fractional corners, rounding each half-to-even and
    /// clipping to `[0, bound_width) x [0, bound_height)`.
    ///
    /// A span that is positive but rounds to nothing keeps one pixel, so a
    /// thin box still covers the cell it starts in.
    pub fn from_corners(
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        bound_width: u32,
        bound_height: u32,
    ) -> Self {
        let (rx0, ry0) = (round_px(x0), round_px(y0));
        let rx1 = if x1 > x0 {
            round_px(x1).max(rx0.saturating_add(1))
        } else {
            rx0
        };
        let ry1 = if y1 > y0 {
            round_px(y1).max(ry0.saturating_add(1))
        } else {
            ry0
        };
        Self::clipped(rx0, ry0, rx1, ry1, bound_width, bound_height)
    }

    fn clipped(x0: i64, y0: i64, x1: i64, y1: i64, bound_width: u32, bound_height: u32) -> Self {
        let bw = i64::from(bound_width);
        let bh = i64::from(bound_height);
        let cx0 = x0.clamp(0, bw);
        let cy0 = y0.clamp(0, bh);
        let cx1 = x1.clamp(0, bw);
        let cy1 = y1.clamp(0, bh);

        if cx1 <= cx0 || cy1 <= cy0 {
            return Self::default();
        }
        Self::new(
            cx0 as u32,
            cy0 as u32,
            (cx1 - cx0) as u32,
            (cy1 - cy0) as u32,
        )
    }

    /// Exclusive right edge.
    #[inline]
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[inline]
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Returns the area of the box in pixels.
    #[inline]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Returns true if the box covers no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the overlap of two boxes, or the empty box if they are disjoint.
    pub fn intersection(&self, other: &Self) -> Self {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            return Self::default();
        }
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Intersection over union of two boxes. Zero when either box is empty.
    pub fn iou(&self, other: &Self) -> f32 {
        let inter = self.intersection(other).area();
        if inter == 0 {
            return 0.0;
        }
        let union = self.area() + other.area() - inter;
        (inter as f64 / union as f64) as f32
    }

    /// The top-left and bottom-right corners as points.
    pub fn corners(&self) -> [Point; 2] {
        [
            Point::new(f64::from(self.x), f64::from(self.y)),
            Point::new(f64::from(self.right()), f64::from(self.bottom())),
        ]
    }
}

/// Rounds to the nearest pixel; `as` saturates out-of-range values and maps
/// NaN to zero.
#[inline]
fn round_px(value: f32) -> i64 {
    value.round_ties_even() as i64
}

impl<TSpace> std::fmt::Debug for Rect<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rect")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl<TSpace> Default for Rect<TSpace> {
    fn default() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

// Custom serde implementation to avoid TSpace: Serialize/Deserialize bounds
impl<TSpace> Serialize for Rect<TSpace> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("Rect", 4)?;
        state.serialize_field("x", &self.x)?;
        state.serialize_field("y", &self.y)?;
        state.serialize_field("width", &self.width)?;
        state.serialize_field("height", &self.height)?;
        state.end()
    }
}

// Files written by other tools may carry fractional or negative values;
// they are rounded and saturated into range.
impl<'de, TSpace> Deserialize<'de> for Rect<TSpace> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct RectData {
            x: f64,
            y: f64,
            width: f64,
            height: f64,
        }
        let data = RectData::deserialize(deserializer)?;
        Ok(Rect::new(
            data.x.round() as u32,
            data.y.round() as u32,
            data.width.round() as u32,
            data.height.round() as u32,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{MaskGrid, Pixel};

    #[test]
    fn test_from_center_decodes_corner_form() {
        let rect: Rect<Pixel> = Rect::from_center(50.0, 40.0, 20.0, 10.0, 100, 100);
        assert_eq!(rect, Rect::new(40, 35, 20, 10));
    }

    #[test]
    fn test_from_center_clips_to_bounds() {
        let rect: Rect<MaskGrid> = Rect::from_center(2.0, 158.0, 10.0, 10.0, 160, 160);
        assert_eq!(rect, Rect::new(0, 153, 7, 7));
    }

    #[test]
    fn test_from_center_outside_bounds_is_empty() {
        let rect: Rect<Pixel> = Rect::from_center(-50.0, -50.0, 10.0, 10.0, 100, 100);
        assert!(rect.is_empty());
        assert_eq!(rect, Rect::default());
    }

    #[test]
    fn test_from_center_with_extreme_values_is_empty() {
        let far: Rect<Pixel> = Rect::from_center(1e30, 10.0, 16.0, 8.0, 100, 100);
        assert!(far.is_empty());
        let wide: Rect<Pixel> = Rect::from_center(10.0, 10.0, f32::MAX, 8.0, 100, 100);
        assert!(wide.is_empty());
        let nan: Rect<Pixel> = Rect::from_center(f32::NAN, 10.0, 16.0, 8.0, 100, 100);
        assert!(nan.is_empty());
        let inf: Rect<Pixel> = Rect::from_center(f32::INFINITY, 10.0, f32::INFINITY, 8.0, 100, 100);
        assert!(inf.is_empty());
    }

    #[test]
    fn test_from_corners_rounds_and_clips() {
        let rect: Rect<MaskGrid> = Rect::from_corners(3.75, 4.0, 6.25, 6.0, 16, 16);
        assert_eq!(rect, Rect::new(4, 4, 2, 2));
        let clipped: Rect<MaskGrid> = Rect::from_corners(-2.0, 14.0, 3.0, 20.0, 16, 16);
        assert_eq!(clipped, Rect::new(0, 14, 3, 2));
        let thin: Rect<MaskGrid> = Rect::from_corners(5.1, 5.0, 5.3, 9.0, 16, 16);
        assert_eq!(thin, Rect::new(5, 5, 1, 4));
        let inverted: Rect<MaskGrid> = Rect::from_corners(6.0, 5.0, 2.0, 9.0, 16, 16);
        assert!(inverted.is_empty());
    }

    #[test]
    fn test_iou() {
        let a: Rect<Pixel> = Rect::new(0, 0, 10, 10);
        let b: Rect<Pixel> = Rect::new(5, 0, 10, 10);
        assert!((a.iou(&b) - 50.0 / 150.0).abs() < 1e-6);
        assert_eq!(a.iou(&Rect::new(20, 20, 5, 5)), 0.0);
        assert_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn test_corners() {
        let rect: Rect<Pixel> = Rect::new(10, 20, 5, 6);
        let [tl, br] = rect.corners();
        assert_eq!(tl, Point::new(10.0, 20.0));
        assert_eq!(br, Point::new(15.0, 26.0));
    }

    #[test]
    fn test_deserialize_accepts_fractional_values() {
        let rect: Rect<Pixel> =
            serde_json::from_str(r#"{"x": 10.0, "y": 4.6, "width": 3, "height": -2}"#).unwrap();
        assert_eq!(rect, Rect::new(10, 5, 3, 0));
    }
}
