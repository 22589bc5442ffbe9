//! The boundary to the opaque forward pass.

use std::path::Path;

use image::RgbImage;
use ndarray::{Array2, Array3, ArrayD, Axis, Dimension, Ix2, Ix3};

use crate::error::AnnotoolError;

/// The two tensors one forward pass produces.
#[derive(Clone, Debug, PartialEq)]
pub struct RawOutput {
    /// `(4 + num_classes + num_coefficients) x num_candidates`. Rows 0..4 are
    /// the center-x, center-y, width, height of each candidate box in network
    /// input pixels.
    pub detections: Array2<f32>,

    /// `num_coefficients x grid_h x grid_w` mask basis.
    pub prototypes: Array3<f32>,
}

impl RawOutput {
    pub fn new(detections: Array2<f32>, prototypes: Array3<f32>) -> Self {
        Self {
            detections,
            prototypes,
        }
    }

    /// Builds an output from dynamically-shaped tensors, dropping leading
    /// batch axes of length one (`1 x F x N` and `1 x C x H x W` are accepted).
    pub fn from_dyn(detections: ArrayD<f32>, prototypes: ArrayD<f32>) -> Result<Self, AnnotoolError> {
        Ok(Self {
            detections: squeeze_into::<Ix2>(detections, "detection")?,
            prototypes: squeeze_into::<Ix3>(prototypes, "prototype")?,
        })
    }

    /// Reads both tensors from `.npy` files.
    pub fn read_npy(detections: &Path, prototypes: &Path) -> Result<Self, AnnotoolError> {
        Self::from_dyn(read_tensor(detections)?, read_tensor(prototypes)?)
    }

    /// Number of detection candidates (columns of the detection tensor).
    pub fn num_candidates(&self) -> usize {
        self.detections.ncols()
    }

    /// Length of one candidate's feature vector.
    pub fn feature_len(&self) -> usize {
        self.detections.nrows()
    }

    /// `(grid_width, grid_height)` of the prototype basis.
    pub fn grid_size(&self) -> (u32, u32) {
        let shape = self.prototypes.shape();
        (shape[2] as u32, shape[1] as u32)
    }
}

fn read_tensor(path: &Path) -> Result<ArrayD<f32>, AnnotoolError> {
    ndarray_npy::read_npy(path).map_err(|e| AnnotoolError::TensorRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn squeeze_into<D: Dimension>(
    mut array: ArrayD<f32>,
    what: &str,
) -> Result<ndarray::Array<f32, D>, AnnotoolError> {
    let wanted = D::NDIM.unwrap_or(array.ndim());
    while array.ndim() > wanted && array.shape()[0] == 1 {
        array = array.index_axis_move(Axis(0), 0);
    }
    let shape = array.shape().to_vec();
    array.into_dimensionality::<D>().map_err(|_| {
        AnnotoolError::InvalidTensorShape(format!(
            "{} tensor has shape {:?}, expected {} axes",
            what, shape, wanted
        ))
    })
}

/// An opaque forward pass over one letterboxed RGB image.
pub trait InferenceEngine {
    fn forward(&mut self, input: &RgbImage) -> Result<RawOutput, AnnotoolError>;
}

/// An engine that answers every call with the same precomputed tensors.
///
/// Used to post-process tensors exported from an external runtime.
#[derive(Clone, Debug)]
pub struct ReplayEngine {
    output: RawOutput,
}

impl ReplayEngine {
    pub fn new(output: RawOutput) -> Self {
        Self { output }
    }
}

impl InferenceEngine for ReplayEngine {
    fn forward(&mut self, input: &RgbImage) -> Result<RawOutput, AnnotoolError> {
        log::debug!(
            "Replaying {} precomputed candidate(s) for a {}x{} input",
            self.output.num_candidates(),
            input.width(),
            input.height()
        );
        Ok(self.output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    #[test]
    fn test_from_dyn_strips_batch_axes() {
        let det = ArrayD::<f32>::zeros(IxDyn(&[1, 38, 5]));
        let proto = ArrayD::<f32>::zeros(IxDyn(&[1, 32, 16, 20]));
        let raw = RawOutput::from_dyn(det, proto).unwrap();
        assert_eq!(raw.feature_len(), 38);
        assert_eq!(raw.num_candidates(), 5);
        assert_eq!(raw.grid_size(), (20, 16));
    }

    #[test]
    fn test_from_dyn_rejects_wrong_rank() {
        let det = ArrayD::<f32>::zeros(IxDyn(&[2, 38, 5]));
        let proto = ArrayD::<f32>::zeros(IxDyn(&[32, 16, 16]));
        let err = RawOutput::from_dyn(det, proto).unwrap_err();
        assert!(matches!(err, AnnotoolError::InvalidTensorShape(_)));
    }

    #[test]
    fn test_read_npy_missing_file() {
        let err = RawOutput::read_npy(Path::new("missing_det.npy"), Path::new("missing_proto.npy"))
            .unwrap_err();
        assert!(matches!(err, AnnotoolError::TensorRead { .. }));
    }
}
