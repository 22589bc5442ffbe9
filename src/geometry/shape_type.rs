use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of region a shape record describes.
///
/// Serialized as its integer code: `0` rectangle, `1` polygon, `2` mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeType {
    /// Two opposite corners.
    Rectangle,
    /// Three or more vertices, in either winding order.
    Polygon,
    /// Bounding-box corners plus a per-instance binary mask.
    Mask,
}

impl ShapeType {
    /// Returns the integer code used in annotation files.
    pub fn code(self) -> u8 {
        match self {
            ShapeType::Rectangle => 0,
            ShapeType::Polygon => 1,
            ShapeType::Mask => 2,
        }
    }

    /// Looks up a shape type by its integer code.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ShapeType::Rectangle),
            1 => Some(ShapeType::Polygon),
            2 => Some(ShapeType::Mask),
            _ => None,
        }
    }

    /// Returns a lowercase name, e.g. `"polygon"`.
    pub fn name(self) -> &'static str {
        match self {
            ShapeType::Rectangle => "rectangle",
            ShapeType::Polygon => "polygon",
            ShapeType::Mask => "mask",
        }
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for ShapeType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for ShapeType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = i64::deserialize(deserializer)?;
        ShapeType::from_code(code).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "unknown shape_type {} (expected 0, 1 or 2)",
                code
            ))
        })
    }
}
