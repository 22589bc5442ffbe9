//! The image carrier: owns the decoded pixel buffer of the annotated image.
//!
//! Decoding and encoding are delegated to the `image` crate. The annotation
//! core only reads dimensions and hands an RGB view to the inference
//! pipeline.

use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbImage};

use crate::error::AnnotoolError;

/// File extensions accepted by [`ImageCarrier::open`].
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

/// A decoded image together with the path it was loaded from.
#[derive(Clone, Debug)]
pub struct ImageCarrier {
    path: PathBuf,
    image: DynamicImage,
}

impl ImageCarrier {
    /// Loads and decodes an image file.
    ///
    /// # Errors
    /// Returns [`AnnotoolError::UnsupportedImageFormat`] for unknown extensions,
    /// and [`AnnotoolError::Image`] if the file cannot be read or decoded.
    pub fn open(path: &Path) -> Result<Self, AnnotoolError> {
        check_extension(path)?;
        let image = image::open(path).map_err(|source| AnnotoolError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!(
            "Decoded {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Self {
            path: path.to_path_buf(),
            image,
        })
    }

    /// Wraps an already-decoded image. `path` is where it is considered to
    /// live; nothing is read from it.
    pub fn from_image(path: impl Into<PathBuf>, image: DynamicImage) -> Self {
        Self {
            path: path.into(),
            image,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Mutable access to the pixel buffer.
    pub fn pixels_mut(&mut self) -> &mut DynamicImage {
        &mut self.image
    }

    /// An 8-bit RGB copy of the pixels, the layout the inference engine takes.
    pub fn to_rgb8(&self) -> RgbImage {
        self.image.to_rgb8()
    }

    /// Encodes the image to `path`; the format follows the extension.
    pub fn save(&self, path: &Path) -> Result<(), AnnotoolError> {
        check_extension(path)?;
        self.image.save(path).map_err(|source| AnnotoolError::Image {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn check_extension(path: &Path) -> Result<(), AnnotoolError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(AnnotoolError::UnsupportedImageFormat(format!(
            "'{}'",
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_rejects_unknown_extension() {
        let err = ImageCarrier::open(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, AnnotoolError::UnsupportedImageFormat(_)));
    }

    #[test]
    fn test_open_missing_file_is_image_error() {
        let err = ImageCarrier::open(Path::new("definitely/missing.png")).unwrap_err();
        assert!(matches!(err, AnnotoolError::Image { .. }));
    }

    #[test]
    fn test_save_and_reopen() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("img.png");
        let mut carrier = ImageCarrier::from_image(&path, DynamicImage::new_rgb8(7, 5));
        if let DynamicImage::ImageRgb8(buffer) = carrier.pixels_mut() {
            buffer.put_pixel(3, 2, image::Rgb([200, 10, 10]));
        }
        carrier.save(&path).expect("save png");

        let reopened = ImageCarrier::open(&path).expect("open png");
        assert_eq!((reopened.width(), reopened.height()), (7, 5));
        assert_eq!(reopened.path(), path.as_path());
        assert_eq!(reopened.to_rgb8().get_pixel(3, 2).0, [200, 10, 10]);
    }
}
