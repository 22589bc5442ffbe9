//! Binary masks and their run-length compaction.
//!
//! A [`BinaryMask`] holds one byte per pixel, always `0` (background) or
//! `255` (foreground), in row-major `height x width` order. [`RleMask`]
//! stores the same mask as alternating run lengths counted in column-major
//! order, the layout COCO-style tooling exchanges.

mod bitmap;
pub mod rle;

pub use bitmap::{BinaryMask, BACKGROUND, FOREGROUND};
pub use rle::RleMask;
