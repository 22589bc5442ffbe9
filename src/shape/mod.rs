//! Annotation records.
//!
//! A [`Shape`] is one labelled region on an image. Its geometry is a point
//! list interpreted according to its [`ShapeKind`]; mask shapes additionally
//! own an [`InstanceMask`]. Point edits are undoable through a bounded
//! [`History`]; label and kind edits are not.

mod history;
mod record;

pub use history::{History, DEFAULT_HISTORY_DEPTH};
pub use record::{InstanceMask, SegmentMeta, Shape, ShapeKind};
