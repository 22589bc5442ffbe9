//! The per-image annotation file.
//!
//! ```json
//! {
//!   "image_path": "cells.jpg",
//!   "shapes": [
//!     {
//!       "label": "G-",
//!       "shape_type": 2,
//!       "points": [{"x": 24.0, "y": 28.0}, {"x": 40.0, "y": 36.0}],
//!       "segment_output": {"id": 0, "confidence": 0.91,
//!                          "box": {"x": 24, "y": 28, "width": 16, "height": 8}},
//!       "mask": {"height": 8, "width": 16, "counts": [0, 128]}
//!     }
//!   ]
//! }
//! ```
//!
//! `segment_output` and `mask` are optional on read and written only when
//! the shape has them. A file without a `shapes` field is readable but holds
//! no shape list.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AnnotoolError;
use crate::geometry::{Point, ShapeType};
use crate::mask::RleMask;
use crate::shape::{InstanceMask, SegmentMeta, Shape, ShapeKind};

/// Top-level record of an annotation file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationFile {
    #[serde(default)]
    pub image_path: String,

    #[serde(default)]
    pub shapes: Option<Vec<ShapeRecord>>,
}

/// One shape as stored on disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeRecord {
    pub label: String,
    pub shape_type: ShapeType,
    #[serde(default)]
    pub points: Vec<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_output: Option<SegmentMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<RleMask>,
}

impl ShapeRecord {
    pub fn from_shape(shape: &Shape) -> Self {
        Self {
            label: shape.label().to_string(),
            shape_type: shape.shape_type(),
            points: shape.points().to_vec(),
            segment_output: shape.segment().copied(),
            mask: shape.mask().map(InstanceMask::to_rle),
        }
    }

    /// Rebuilds the in-memory shape.
    ///
    /// A mask record without a stored mask gets one that fills its bounding
    /// box, clipped to an image of `bounds` (width, height); a stored mask on
    /// any other record type is ignored.
    pub fn into_shape(self, bounds: (u32, u32)) -> Shape {
        let kind = match (self.shape_type, self.mask) {
            (ShapeType::Mask, Some(rle)) => ShapeKind::Mask(InstanceMask::Rle(rle)),
            (shape_type, _) => ShapeKind::from_type(shape_type, &self.points, bounds),
        };
        let mut shape = Shape::new(self.label, kind);
        shape.set_segment(self.segment_output);
        shape.set_points(self.points);
        shape
    }
}

/// Reads an annotation file.
///
/// # Errors
/// Returns an error if the file cannot be opened or is not a valid
/// annotation record.
pub fn read_annotation_file(path: &Path) -> Result<AnnotationFile, AnnotoolError> {
    let file = File::open(path).map_err(AnnotoolError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| AnnotoolError::AnnotationParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes an annotation file, creating parent directories as needed.
/// An existing file is overwritten.
///
/// The record is serialized before the file is opened, so a record that
/// cannot be written (a non-finite point, for one) leaves any existing file
/// untouched.
pub fn write_annotation_file(path: &Path, record: &AnnotationFile) -> Result<(), AnnotoolError> {
    let json = serde_json::to_vec_pretty(record).map_err(|source| {
        AnnotoolError::AnnotationWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(AnnotoolError::Io)?;
        }
    }
    fs::write(path, json).map_err(AnnotoolError::Io)
}

/// Parses an annotation record from a JSON string.
pub fn from_json_str(json: &str) -> Result<AnnotationFile, serde_json::Error> {
    serde_json::from_str(json)
}

/// Parses an annotation record from raw bytes.
pub fn from_json_slice(bytes: &[u8]) -> Result<AnnotationFile, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Serializes an annotation record to a pretty-printed JSON string.
pub fn to_json_string(record: &AnnotationFile) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(record)
}
