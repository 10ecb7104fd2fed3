use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Tunables for the segmentation engine. The point-count and pixel-count
/// thresholds are empirical and meant to be adjusted per data set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Side length of the square classifier input and output
    #[schemars(range(min = 8, max = 2048))]
    pub inference_size: u32,
    /// Probabilities strictly above this are foreground
    pub threshold: f32,
    /// Radius around the seed (in mask pixels) used to select boundary
    /// points. Defaults to half the inference size.
    pub seed_radius: Option<f64>,
    /// Fewer surviving points than this falls back to the whole boundary
    pub min_seed_points: usize,
    /// A polygon is only computed when more pixels than this are on
    pub min_significant_pixels: usize,
    /// Simplification epsilon for single-click segmentation
    pub interactive_epsilon: f64,
    /// Simplification epsilon for whole-video scanning
    pub batch_epsilon: f64,
    /// Default colour tolerance for region growing
    pub tolerance: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            inference_size: 256,
            threshold: 0.5,
            seed_radius: None,
            min_seed_points: 11,
            min_significant_pixels: 20,
            interactive_epsilon: 2.0,
            batch_epsilon: 3.0,
            tolerance: 32.0,
        }
    }
}

impl SegmentationConfig {
    pub fn seed_radius(&self) -> f64 {
        self.seed_radius
            .unwrap_or(self.inference_size as f64 / 2.0)
    }
}
