//! Segmentation post-processing: raw tensors to mask shapes.

use ndarray::{s, Array2, ArrayView1, ArrayView3};

use super::config::ProcessorConfig;
use super::engine::RawOutput;
use super::letterbox::LetterboxInfo;
use super::nms::nms_boxes;
use crate::error::AnnotoolError;
use crate::geometry::{MaskGrid, Pixel, Rect};
use crate::mask::{BinaryMask, BACKGROUND, FOREGROUND};
use crate::shape::{InstanceMask, SegmentMeta, Shape, ShapeKind};

/// The result of post-processing one forward pass.
#[derive(Clone, Debug)]
pub struct InferenceOutput {
    /// One mask shape per surviving detection, highest confidence first.
    pub shapes: Vec<Shape>,
    /// Union of all instance masks at image resolution.
    pub binary_mask: BinaryMask,
}

/// A detection that passed the confidence threshold, before NMS.
#[derive(Clone, Debug)]
struct Candidate {
    class_id: u32,
    confidence: f32,
    image_box: Rect<Pixel>,
    grid_box: Rect<MaskGrid>,
    coefficients: Vec<f32>,
}

/// Converts raw detection and prototype tensors into mask shapes.
#[derive(Clone, Debug, Default)]
pub struct SegmentationPostProcess {
    config: ProcessorConfig,
}

impl SegmentationPostProcess {
    pub fn new(config: ProcessorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Runs extraction, NMS, mask decoding and shape construction.
    ///
    /// `letterbox` describes how the source image was fitted into the network
    /// input; boxes are mapped back through it and clipped to the source
    /// image. A detection tensor with no candidates yields no shapes.
    ///
    /// # Errors
    /// Returns [`AnnotoolError::InvalidTensorShape`] when the tensors do not
    /// match the configured coefficient count, and
    /// [`AnnotoolError::InvalidArgument`] for an unusable configuration or
    /// letterbox.
    pub fn process(
        &self,
        raw: &RawOutput,
        letterbox: &LetterboxInfo,
    ) -> Result<InferenceOutput, AnnotoolError> {
        self.config.check()?;
        if !(letterbox.scale.is_finite() && letterbox.scale > 0.0) {
            return Err(AnnotoolError::InvalidArgument(format!(
                "letterbox scale must be positive, got {}",
                letterbox.scale
            )));
        }
        let mut binary_mask = BinaryMask::new(letterbox.source_width, letterbox.source_height);
        if raw.num_candidates() == 0 || raw.feature_len() == 0 {
            log::info!("Detection tensor is empty; no shapes produced");
            return Ok(InferenceOutput {
                shapes: Vec::new(),
                binary_mask,
            });
        }
        self.check_layout(raw)?;

        let candidates = self.extract_candidates(raw, letterbox);
        let boxes: Vec<Rect<Pixel>> = candidates.iter().map(|c| c.image_box).collect();
        let scores: Vec<f32> = candidates.iter().map(|c| c.confidence).collect();
        let keep = nms_boxes(
            &boxes,
            &scores,
            self.config.confidence_threshold,
            self.config.nms_threshold,
        );
        log::info!(
            "{} of {} candidate(s) above confidence {}, {} kept after NMS",
            candidates.len(),
            raw.num_candidates(),
            self.config.confidence_threshold,
            keep.len()
        );

        let prototypes = raw.prototypes.view();
        let mut shapes = Vec::with_capacity(keep.len());
        for index in keep {
            let candidate = &candidates[index];
            let mask = self.decode_mask(candidate, prototypes);
            binary_mask.paste(&mask, candidate.image_box.x, candidate.image_box.y);
            shapes.push(self.build_shape(candidate, mask));
        }

        Ok(InferenceOutput {
            shapes,
            binary_mask,
        })
    }

    fn check_layout(&self, raw: &RawOutput) -> Result<(), AnnotoolError> {
        let coefficients = self.config.mask_coefficients;
        let features = raw.feature_len();
        if features <= 4 + coefficients {
            return Err(AnnotoolError::InvalidTensorShape(format!(
                "detection rows have {} features; need 4 box values, at least one class score and {} mask coefficients",
                features, coefficients
            )));
        }
        let basis = raw.prototypes.shape()[0];
        if basis != coefficients {
            return Err(AnnotoolError::InvalidTensorShape(format!(
                "prototype tensor has {} planes, expected {}",
                basis, coefficients
            )));
        }
        Ok(())
    }

    fn extract_candidates(&self, raw: &RawOutput, letterbox: &LetterboxInfo) -> Vec<Candidate> {
        let features = raw.feature_len();
        let class_end = features - self.config.mask_coefficients;
        let (grid_width, grid_height) = raw.grid_size();
        let grid_sx = grid_width as f32 / self.config.input_width as f32;
        let grid_sy = grid_height as f32 / self.config.input_height as f32;

        let mut candidates = Vec::new();
        for (column, row) in raw.detections.columns().into_iter().enumerate() {
            let Some((class_id, confidence)) = best_class(row.slice(s![4..class_end])) else {
                continue;
            };
            if confidence <= self.config.confidence_threshold {
                continue;
            }

            let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
            if ![cx, cy, w, h].iter().all(|v| v.is_finite()) {
                log::debug!("Dropping candidate {}: non-finite box values", column);
                continue;
            }
            let (scx, scy) = letterbox.to_source(cx, cy);
            let image_box = Rect::<Pixel>::from_center(
                scx,
                scy,
                letterbox.length_to_source(w),
                letterbox.length_to_source(h),
                letterbox.source_width,
                letterbox.source_height,
            );
            // The prototype crop is the clipped source box mapped forward
            // through the letterbox.
            let (ix0, iy0) = letterbox.to_input(image_box.x as f32, image_box.y as f32);
            let (ix1, iy1) = letterbox.to_input(image_box.right() as f32, image_box.bottom() as f32);
            let grid_box = Rect::<MaskGrid>::from_corners(
                ix0 * grid_sx,
                iy0 * grid_sy,
                ix1 * grid_sx,
                iy1 * grid_sy,
                grid_width,
                grid_height,
            );
            if image_box.is_empty() || grid_box.is_empty() {
                log::debug!(
                    "Dropping candidate {} (class {}, {:.3}): box is empty after clipping",
                    column,
                    class_id,
                    confidence
                );
                continue;
            }

            candidates.push(Candidate {
                class_id,
                confidence,
                image_box,
                grid_box,
                coefficients: row.slice(s![class_end..]).to_vec(),
            });
        }
        candidates
    }

    /// Projects the candidate's coefficients onto the prototype window under
    /// its grid box, binarizes the sigmoid and scales to the pixel box.
    fn decode_mask(&self, candidate: &Candidate, prototypes: ArrayView3<'_, f32>) -> BinaryMask {
        let gb = candidate.grid_box;
        let window = prototypes.slice(s![
            ..,
            gb.y as usize..gb.bottom() as usize,
            gb.x as usize..gb.right() as usize
        ]);

        let mut logits = Array2::<f32>::zeros((gb.height as usize, gb.width as usize));
        for (&coefficient, plane) in candidate.coefficients.iter().zip(window.outer_iter()) {
            logits.scaled_add(coefficient, &plane);
        }

        let threshold = self.config.mask_threshold;
        let crop = logits.mapv(|v| {
            if sigmoid(v) > threshold {
                FOREGROUND
            } else {
                BACKGROUND
            }
        });
        BinaryMask::from_array(crop)
            .resize_nearest(candidate.image_box.width, candidate.image_box.height)
    }

    fn build_shape(&self, candidate: &Candidate, mask: BinaryMask) -> Shape {
        let label = self.config.names.resolve(candidate.class_id);
        let kind = ShapeKind::Mask(InstanceMask::Bitmap(mask).compact());
        let mut shape = Shape::new(label, kind).with_segment(SegmentMeta {
            class_id: candidate.class_id,
            confidence: candidate.confidence,
            bbox: candidate.image_box,
        });
        shape.set_points(candidate.image_box.corners().to_vec());
        shape
    }
}

/// Index and value of the highest score; the first one wins ties. NaN
/// scores are skipped.
fn best_class(scores: ArrayView1<'_, f32>) -> Option<(u32, f32)> {
    let mut best: Option<(u32, f32)> = None;
    for (index, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((index as u32, score)),
        }
    }
    best
}

#[inline]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
