use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for annotool operations.
#[derive(Debug, Error)]
pub enum AnnotoolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse annotation file {path}: {source}")]
    AnnotationParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write annotation file {path}: {source}")]
    AnnotationWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read or write image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Unsupported image format: {0} (supported: jpg, jpeg, png, bmp, tiff, tif)")]
    UnsupportedImageFormat(String),

    #[error("Shape index {index} is out of range (workspace holds {len} shape(s))")]
    ShapeIndexOutOfRange { index: usize, len: usize },

    #[error("Mask is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}")]
    MaskDimensions {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("Invalid tensor shape: {0}")]
    InvalidTensorShape(String),

    #[error("Failed to parse processor config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to read tensor from {path}: {message}")]
    TensorRead { path: PathBuf, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },
}
