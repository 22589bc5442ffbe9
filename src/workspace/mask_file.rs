//! The auxiliary whole-image mask, stored as a single-channel PNG.

use std::fs;
use std::path::Path;

use crate::error::AnnotoolError;
use crate::mask::BinaryMask;

/// Gray level above which a pixel of the mask file is foreground.
pub const MASK_FILE_THRESHOLD: u8 = 127;

/// Decodes a mask file and binarizes it at [`MASK_FILE_THRESHOLD`].
///
/// Any raster format the `image` crate reads is accepted; color images are
/// converted to luma first.
pub fn read_mask_png(path: &Path) -> Result<BinaryMask, AnnotoolError> {
    let decoded = image::open(path).map_err(|source| AnnotoolError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BinaryMask::from_gray(&decoded.to_luma8(), MASK_FILE_THRESHOLD))
}

/// Encodes a mask as an 8-bit grayscale PNG (0 and 255), creating parent
/// directories as needed.
pub fn write_mask_png(path: &Path, mask: &BinaryMask) -> Result<(), AnnotoolError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(AnnotoolError::Io)?;
        }
    }
    mask.to_gray_image()
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|source| AnnotoolError::Image {
            path: path.to_path_buf(),
            source,
        })
}
