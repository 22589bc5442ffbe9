//! Geometry primitives shared by shapes, masks and the inference pipeline.
//!
//! - [`Point`]: a floating-point (x, y) vertex owned by a shape's point list.
//! - [`ShapeType`]: the on-disk discriminator for shape records (0/1/2).
//! - [`Rect`]: an integer, axis-aligned box tagged with the coordinate space it
//!   lives in, so image-pixel boxes and mask-grid boxes cannot be mixed up.

mod point;
mod rect;
mod shape_type;
mod space;

pub use point::Point;
pub use rect::Rect;
pub use shape_type::ShapeType;
pub use space::{MaskGrid, Pixel};
