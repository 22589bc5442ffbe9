//! Letterbox, forward pass and post-processing chained behind one call.

use image::RgbImage;

use super::config::ProcessorConfig;
use super::engine::InferenceEngine;
use super::letterbox::letterbox;
use super::postprocess::{InferenceOutput, SegmentationPostProcess};
use crate::error::AnnotoolError;

/// Anything that can turn an image into mask shapes.
///
/// [`Workspace::run_model_processor`](crate::workspace::Workspace::run_model_processor)
/// accepts any implementation, so tests can substitute canned results.
pub trait ModelProcessor {
    fn infer(&mut self, image: &RgbImage) -> Result<InferenceOutput, AnnotoolError>;
}

/// The instance-segmentation pipeline around an [`InferenceEngine`].
#[derive(Debug)]
pub struct SegmentationPipeline<E> {
    engine: E,
    postprocess: SegmentationPostProcess,
}

impl<E: InferenceEngine> SegmentationPipeline<E> {
    pub fn new(engine: E, config: ProcessorConfig) -> Self {
        Self {
            engine,
            postprocess: SegmentationPostProcess::new(config),
        }
    }

    pub fn config(&self) -> &ProcessorConfig {
        self.postprocess.config()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

impl<E: InferenceEngine> ModelProcessor for SegmentationPipeline<E> {
    fn infer(&mut self, image: &RgbImage) -> Result<InferenceOutput, AnnotoolError> {
        let config = self.postprocess.config();
        config.check()?;
        let (input, info) = letterbox(image, config.input_width, config.input_height, config.pad_value);
        log::debug!(
            "Letterboxed {}x{} into {}x{} (scale {:.4}, pad {}x{})",
            info.source_width,
            info.source_height,
            info.target_width,
            info.target_height,
            info.scale,
            info.pad_left,
            info.pad_top
        );
        let raw = self.engine.forward(&input)?;
        self.postprocess.process(&raw, &info)
    }
}
