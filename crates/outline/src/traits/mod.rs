use image::RgbImage;
use scope_common::Point2D;

use crate::{
    error::Result,
    types::{BinaryMask, Boundary},
};

/// Normalised classifier input: CHW `f32` tensor of `size`x`size` pixels,
/// channel values in `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierInput {
    pub size: u32,
    pub tensor: Vec<f32>,
}

/// Opaque binary classifier: normalised RGB tensor in, per-pixel
/// foreground probability map of the same size out (row-major)
pub trait MaskClassifier: Send {
    fn infer(&mut self, input: &ClassifierInput) -> Result<Vec<f32>>;

    /// Name used in logs
    fn name(&self) -> &str {
        "classifier"
    }
}

/// Turns a binary mask into boundary pixel coordinates
pub trait BoundaryExtractor: Send + Sync {
    fn extract_boundary(&self, mask: &BinaryMask) -> Vec<Point2D>;
}

/// Finds the boundary pixels of the region around a seed point
pub trait SeededSegmenter {
    fn boundary(&self, image: &RgbImage, seed: Point2D) -> Result<Boundary>;
}
