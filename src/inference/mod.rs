//! Instance-segmentation inference: from an image to mask shapes.
//!
//! The network itself is opaque. An [`InferenceEngine`] takes a letterboxed
//! RGB image and returns a [`RawOutput`]: a detection tensor laid out as
//! `(4 box + num_classes scores + num_coefficients) x num_candidates`, and a
//! `num_coefficients x grid_h x grid_w` mask prototype basis.
//!
//! [`SegmentationPostProcess`] turns that into finished [`Shape`](crate::shape::Shape)s:
//!
//! 1. per-candidate extraction (best class score above the confidence
//!    threshold, boxes decoded in both pixel and mask-grid space),
//! 2. non-max suppression,
//! 3. mask decoding (coefficients x prototypes, sigmoid, threshold, resize),
//! 4. shape construction with RLE-compacted masks.
//!
//! [`SegmentationPipeline`] wires letterboxing, the engine and the
//! post-processor together behind the [`ModelProcessor`] trait that
//! [`Workspace`](crate::workspace::Workspace) consumes.

mod config;
mod engine;
mod letterbox;
mod nms;
mod pipeline;
mod postprocess;

pub use config::{
    LabelTable, ProcessorConfig, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_INPUT_SIZE,
    DEFAULT_MASK_COEFFICIENTS, DEFAULT_MASK_THRESHOLD, DEFAULT_NMS_THRESHOLD, DEFAULT_PAD_VALUE,
};
pub use engine::{InferenceEngine, RawOutput, ReplayEngine};
pub use letterbox::{letterbox, LetterboxInfo};
pub use nms::nms_boxes;
pub use pipeline::{ModelProcessor, SegmentationPipeline};
pub use postprocess::{InferenceOutput, SegmentationPostProcess};
