//! Column-major run-length encoding for binary masks.
//!
//! Runs alternate background/foreground starting with background, counted
//! with the outer loop over columns and the inner loop over rows. The first
//! run is zero when the first pixel is foreground. This traversal order is
//! part of the interchange contract with external mask tooling.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::bitmap::{BinaryMask, BACKGROUND, FOREGROUND};

/// A run-length compacted mask together with the dimensions it decodes to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RleMask {
    pub height: u32,
    pub width: u32,
    pub counts: Vec<u32>,
}

impl RleMask {
    /// Compacts a bitmap.
    pub fn from_mask(mask: &BinaryMask) -> Self {
        Self {
            height: mask.height(),
            width: mask.width(),
            counts: encode(mask),
        }
    }

    /// Expands back into a bitmap of the recorded dimensions.
    pub fn to_mask(&self) -> BinaryMask {
        decode(&self.counts, self.height, self.width)
    }

    /// A mask whose every pixel is foreground.
    pub fn filled(width: u32, height: u32) -> Self {
        let mut remaining = u64::from(width) * u64::from(height);
        let mut counts = vec![0];
        // Areas past u32::MAX continue after an empty background run.
        while remaining > u64::from(u32::MAX) {
            counts.extend([u32::MAX, 0]);
            remaining -= u64::from(u32::MAX);
        }
        counts.push(remaining as u32);
        Self {
            height,
            width,
            counts,
        }
    }

    /// Sum of all run lengths.
    pub fn total_len(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// Returns true if the runs cover exactly `height * width` pixels.
    pub fn is_consistent(&self) -> bool {
        self.total_len() == u64::from(self.height) * u64::from(self.width)
    }

    /// Number of foreground pixels (the odd-indexed runs).
    pub fn area(&self) -> u64 {
        self.counts
            .iter()
            .skip(1)
            .step_by(2)
            .map(|&c| u64::from(c))
            .sum()
    }
}

/// Encodes a mask into alternating run lengths in column-major order.
///
/// The result always holds at least one entry; an empty mask encodes as `[0]`.
pub fn encode(mask: &BinaryMask) -> Vec<u32> {
    let mut counts = Vec::new();
    let mut current = BACKGROUND;
    let mut run: u32 = 0;

    // `t()` walks the (height, width) array column by column.
    for &value in mask.view().t().iter() {
        if value != current {
            counts.push(run);
            run = 0;
            current = value;
        }
        run += 1;
    }
    counts.push(run);
    counts
}

/// Decodes alternating run lengths into a `height x width` mask.
///
/// Runs are written column-major starting with background. Runs past the end
/// of the buffer are truncated; if the runs are too short the remainder stays
/// background. Neither case is an error.
pub fn decode(counts: &[u32], height: u32, width: u32) -> BinaryMask {
    let h = height as usize;
    let w = width as usize;
    let n = h * w;

    let mut column_major = vec![BACKGROUND; n];
    let mut idx = 0usize;
    let mut value = BACKGROUND;
    for &count in counts {
        if idx >= n {
            break;
        }
        let end = idx.saturating_add(count as usize).min(n);
        column_major[idx..end].fill(value);
        idx = end;
        value = if value == BACKGROUND {
            FOREGROUND
        } else {
            BACKGROUND
        };
    }

    let data = Array2::from_shape_fn((h, w), |(y, x)| column_major[x * h + y]);
    BinaryMask::from_array(data)
}
