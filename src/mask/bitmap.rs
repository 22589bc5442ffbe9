use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use ndarray::{s, Array2, ArrayView2};

/// Pixel value for background.
pub const BACKGROUND: u8 = 0;

/// Pixel value for foreground.
pub const FOREGROUND: u8 = 255;

/// A binary bitmap of `height` rows by `width` columns.
///
/// Every constructor normalizes its input, so pixels are exactly
/// [`BACKGROUND`] or [`FOREGROUND`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMask {
    data: Array2<u8>,
}

impl BinaryMask {
    /// Creates an all-background mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: Array2::zeros((height as usize, width as usize)),
        }
    }

    /// Creates an all-foreground mask.
    pub fn filled(width: u32, height: u32) -> Self {
        Self {
            data: Array2::from_elem((height as usize, width as usize), FOREGROUND),
        }
    }

    /// Builds a mask from row-major bytes. Any nonzero byte becomes foreground.
    ///
    /// Returns `None` if `data.len() != width * height`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let array = Array2::from_shape_vec((height as usize, width as usize), data).ok()?;
        Some(Self::from_array(array))
    }

    /// Builds a mask from a `(height, width)` array. Any nonzero value becomes
    /// foreground.
    pub fn from_array(array: Array2<u8>) -> Self {
        Self {
            data: array.mapv(normalize),
        }
    }

    /// Binarizes a grayscale raster: pixels strictly above `threshold` become
    /// foreground.
    pub fn from_gray(image: &GrayImage, threshold: u8) -> Self {
        let (width, height) = image.dimensions();
        let data = Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
            if image.get_pixel(x as u32, y as u32)[0] > threshold {
                FOREGROUND
            } else {
                BACKGROUND
            }
        });
        Self { data }
    }

    /// Renders the mask as an 8-bit grayscale raster.
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width(), self.height(), |x, y| {
            Luma([self.data[[y as usize, x as usize]]])
        })
    }

    /// Number of columns.
    pub fn width(&self) -> u32 {
        self.data.ncols() as u32
    }

    /// Number of rows.
    pub fn height(&self) -> u32 {
        self.data.nrows() as u32
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the mask has no pixels at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read-only view of the `(height, width)` pixel array.
    pub fn view(&self) -> ArrayView2<'_, u8> {
        self.data.view()
    }

    /// Returns whether `(x, y)` is foreground, or `None` outside the mask.
    pub fn get(&self, x: u32, y: u32) -> Option<bool> {
        self.data
            .get((y as usize, x as usize))
            .map(|&v| v == FOREGROUND)
    }

    /// Sets a single pixel. Returns false if `(x, y)` is outside the mask.
    pub fn set(&mut self, x: u32, y: u32, foreground: bool) -> bool {
        match self.data.get_mut((y as usize, x as usize)) {
            Some(slot) => {
                *slot = if foreground { FOREGROUND } else { BACKGROUND };
                true
            }
            None => false,
        }
    }

    /// Number of foreground pixels.
    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&v| v == FOREGROUND).count()
    }

    /// ORs `other` into this mask with its top-left corner at `(x, y)`.
    ///
    /// Parts of `other` falling outside this mask are ignored.
    pub fn paste(&mut self, other: &BinaryMask, x: u32, y: u32) {
        let x0 = (x as usize).min(self.data.ncols());
        let y0 = (y as usize).min(self.data.nrows());
        let x1 = (x0 + other.data.ncols()).min(self.data.ncols());
        let y1 = (y0 + other.data.nrows()).min(self.data.nrows());

        let mut target = self.data.slice_mut(s![y0..y1, x0..x1]);
        let source = other.data.slice(s![..(y1 - y0), ..(x1 - x0)]);
        target.zip_mut_with(&source, |dst, &src| *dst |= src);
    }

    /// Resizes with nearest-neighbour sampling, which keeps the mask binary.
    pub fn resize_nearest(&self, width: u32, height: u32) -> BinaryMask {
        if self.is_empty() || width == 0 || height == 0 {
            return BinaryMask::new(width, height);
        }
        let resized = imageops::resize(&self.to_gray_image(), width, height, FilterType::Nearest);
        BinaryMask::from_gray(&resized, BACKGROUND)
    }

    /// Returns the transposed mask (`width x height`).
    pub fn transposed(&self) -> BinaryMask {
        Self {
            data: self.data.t().to_owned(),
        }
    }
}

#[inline]
fn normalize(value: u8) -> u8 {
    if value == BACKGROUND {
        BACKGROUND
    } else {
        FOREGROUND
    }
}
