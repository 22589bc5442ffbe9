//! Coordinate space marker types.
//!
//! These are zero-sized types (ZSTs) used as type parameters to distinguish
//! between different coordinate systems at compile time.

use std::fmt;

/// Marker type for full-resolution image pixel coordinates.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Marker type for the low-resolution grid the mask prototypes are defined on.
///
/// A detection box is scaled into this space before the prototype crop is
/// taken, then the decoded crop is resized back to the pixel-space box.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskGrid {}

impl fmt::Debug for Pixel {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl fmt::Debug for MaskGrid {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}
