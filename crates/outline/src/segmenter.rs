use image::RgbImage;
use schemars::JsonSchema;
use scope_common::Point2D;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};
use tracing::{debug, info};

use crate::{
    algorithms::RegionGrowSegmenter,
    classifier::ClassifierHandle,
    config::SegmentationConfig,
    error::{OutlineError, Result},
    mask_segmenter::MaskSegmenter,
    resolver::FramePolygonResolver,
    traits::SeededSegmenter,
    types::{AreaMeasurement, Boundary, Polygon},
};

#[derive(
    Debug, Clone,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq
)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SegmentCommand {
    /// Grow a region of similar colour from the seed point
    BySeed {
        x: f64,
        y: f64,
        /// Colour to match, defaults to the seed pixel's colour
        target: Option<[u8; 3]>,
        /// Maximum RGB distance, defaults to the configured tolerance
        tolerance: Option<f64>,
        epsilon: Option<f64>,
    },

    /// Outline the classifier region nearest the seed point
    ByMask {
        x: f64,
        y: f64,
        epsilon: Option<f64>,
    },

    /// Measure the classifier region over the whole frame
    WholeFrame,
}

impl SegmentCommand {
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(SegmentCommand)
    }

    pub fn command_names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::BySeed { .. } => "Colour-similarity flood fill from the seed, traced to a convex polygon",
            Self::ByMask { .. } => "Classifier mask boundary near the seed, traced to a convex polygon",
            Self::WholeFrame => "Classifier foreground area over the whole frame with an optional outline",
        }
    }
}

/// Result of [`Segmenter::execute`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentOutcome {
    Polygon { polygon: Polygon },
    Measurement { measurement: AreaMeasurement },
}

impl SegmentOutcome {
    pub fn polygon(&self) -> &Polygon {
        match self {
            Self::Polygon { polygon } => polygon,
            Self::Measurement { measurement } => &measurement.polygon,
        }
    }
}

/// Entry point for single-frame segmentation. Every call works on the
/// image it is given and keeps nothing from it afterwards; one failed call
/// does not affect the next.
#[derive(Debug, Clone)]
pub struct Segmenter {
    config: SegmentationConfig,
    masks: MaskSegmenter,
}

impl Segmenter {
    pub fn new(classifier: ClassifierHandle, config: SegmentationConfig) -> Self {
        Self {
            masks: MaskSegmenter::new(classifier, config.clone()),
            config,
        }
    }

    /// Region growing only, no classifier
    pub fn without_classifier(config: SegmentationConfig) -> Self {
        Self::new(ClassifierHandle::unavailable("no classifier configured"), config)
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    pub fn mask_segmenter(&self) -> &MaskSegmenter {
        &self.masks
    }

    pub fn segment_by_seed(
        &self,
        image: &RgbImage,
        seed: Point2D,
        target: Option<[u8; 3]>,
        tolerance: f64,
        epsilon: f64,
    ) -> Result<Polygon> {
        let grower = RegionGrowSegmenter {
            tolerance,
            target,
            ..RegionGrowSegmenter::default()
        };
        let boundary = grower.boundary(image, seed)?;
        let polygon = resolve_region(&boundary, epsilon)?;
        debug!(boundary = boundary.points.len(), vertices = polygon.len(), "seed segmentation");
        Ok(polygon)
    }

    pub fn segment_by_mask(&self, image: &RgbImage, seed: Point2D, epsilon: f64) -> Result<Polygon> {
        let boundary = self.masks.boundary(image, seed)?;
        let polygon = resolve_region(&boundary, epsilon)?;
        debug!(boundary = boundary.points.len(), vertices = polygon.len(), "mask segmentation");
        Ok(polygon)
    }

    pub fn scan_whole_frame(&self, image: &RgbImage) -> Result<AreaMeasurement> {
        self.masks
            .scan_whole_frame(image, &FramePolygonResolver::new(self.config.batch_epsilon))
    }

    pub fn execute(&self, image: &RgbImage, command: SegmentCommand) -> Result<SegmentOutcome> {
        info!(command = %command, "executing segment command");
        match command {
            SegmentCommand::BySeed { x, y, target, tolerance, epsilon } => {
                let polygon = self.segment_by_seed(
                    image,
                    Point2D::new(x, y),
                    target,
                    tolerance.unwrap_or(self.config.tolerance),
                    epsilon.unwrap_or(self.config.interactive_epsilon),
                )?;
                Ok(SegmentOutcome::Polygon { polygon })
            }
            SegmentCommand::ByMask { x, y, epsilon } => {
                let polygon = self.segment_by_mask(
                    image,
                    Point2D::new(x, y),
                    epsilon.unwrap_or(self.config.interactive_epsilon),
                )?;
                Ok(SegmentOutcome::Polygon { polygon })
            }
            SegmentCommand::WholeFrame => {
                let measurement = self.scan_whole_frame(image)?;
                Ok(SegmentOutcome::Measurement { measurement })
            }
        }
    }
}

/// Collinear boundaries collapse to fewer than 3 hull vertices
fn resolve_region(boundary: &Boundary, epsilon: f64) -> Result<Polygon> {
    let polygon = FramePolygonResolver::new(epsilon).resolve(boundary);
    if polygon.len() < 3 {
        return Err(OutlineError::DegenerateRegion { points: polygon.len() });
    }
    Ok(polygon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{classifier::FnClassifier, traits::ClassifierInput};
    use image::Rgb;

    fn scene() -> RgbImage {
        RgbImage::from_fn(64, 64, |x, y| {
            if (16..48).contains(&x) && (16..40).contains(&y) {
                Rgb([220, 30, 30])
            } else {
                Rgb([20, 20, 20])
            }
        })
    }

    fn red_segmenter() -> Segmenter {
        let handle = ClassifierHandle::ready(FnClassifier::new("red", |input: &ClassifierInput| {
            let plane = (input.size * input.size) as usize;
            Ok((0..plane).map(|i| if input.tensor[i] > 0.5 { 1.0 } else { 0.0 }).collect())
        }));
        Segmenter::new(
            handle,
            SegmentationConfig {
                inference_size: 32,
                ..SegmentationConfig::default()
            },
        )
    }

    #[test]
    fn test_segment_by_seed_outlines_block() {
        let segmenter = Segmenter::without_classifier(SegmentationConfig::default());
        let polygon = segmenter
            .segment_by_seed(&scene(), Point2D::new(30.0, 30.0), None, 10.0, 1.0)
            .unwrap();
        assert_eq!(polygon.len(), 4);
        // Hull of pixel centres 16..=47 x 16..=39
        assert_eq!(polygon.area(), 31.0 * 23.0);
    }

    #[test]
    fn test_collinear_region_is_degenerate() {
        // One pixel high line: every pixel is on the boundary, the hull is a segment
        let image = RgbImage::from_fn(20, 6, |x, y| {
            if y == 2 && (2..18).contains(&x) { Rgb([255, 255, 255]) } else { Rgb([0, 0, 0]) }
        });
        let segmenter = Segmenter::without_classifier(SegmentationConfig::default());
        let result = segmenter.segment_by_seed(&image, Point2D::new(5.0, 2.0), None, 10.0, 1.0);
        assert!(matches!(result, Err(OutlineError::DegenerateRegion { points: 2 })));
    }

    #[test]
    fn test_region_grow_works_without_classifier() {
        let segmenter = Segmenter::without_classifier(SegmentationConfig::default());
        assert!(segmenter.segment_by_mask(&scene(), Point2D::new(30.0, 30.0), 1.0).is_err());
        assert!(segmenter.segment_by_seed(&scene(), Point2D::new(30.0, 30.0), None, 10.0, 1.0).is_ok());
    }

    #[test]
    fn test_failed_call_does_not_poison_next() {
        let segmenter = Segmenter::without_classifier(SegmentationConfig::default());
        let bad = segmenter.segment_by_seed(&scene(), Point2D::new(5.0, 5.0), Some([0, 0, 255]), 5.0, 1.0);
        assert!(matches!(bad, Err(OutlineError::NoMatch(_))));
        let good = segmenter.segment_by_seed(&scene(), Point2D::new(30.0, 30.0), None, 10.0, 1.0);
        assert!(good.is_ok());
    }

    #[test]
    fn test_segment_by_mask_maps_back_to_source() {
        let polygon = red_segmenter()
            .segment_by_mask(&scene(), Point2D::new(30.0, 30.0), 0.5)
            .unwrap();
        let bbox = polygon.bounding_box().unwrap();
        // Mask is half resolution, outline lands around the red block
        assert!(bbox.min.x >= 14.0 && bbox.max.x <= 50.0);
        assert!(bbox.min.y >= 14.0 && bbox.max.y <= 42.0);
    }

    #[test]
    fn test_execute_whole_frame() {
        let outcome = red_segmenter().execute(&scene(), SegmentCommand::WholeFrame).unwrap();
        let SegmentOutcome::Measurement { measurement } = outcome else {
            panic!("expected a measurement");
        };
        // 16x12 mask pixels at 2x2 source pixels each
        assert_eq!(measurement.area, 16.0 * 12.0 * 4.0);
        assert!(!measurement.polygon.is_empty());
    }

    #[test]
    fn test_execute_by_seed_uses_config_defaults() {
        let segmenter = Segmenter::without_classifier(SegmentationConfig::default());
        let outcome = segmenter
            .execute(
                &scene(),
                SegmentCommand::BySeed { x: 20.0, y: 20.0, target: None, tolerance: None, epsilon: None },
            )
            .unwrap();
        assert_eq!(outcome.polygon().len(), 4);
    }

    #[test]
    fn test_command_serialization() {
        let command = SegmentCommand::ByMask { x: 1.0, y: 2.0, epsilon: Some(1.5) };
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json["type"], "by_mask");
        assert_eq!(json["params"]["epsilon"], 1.5);
        let parsed: SegmentCommand = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, command);
    }

    #[test]
    fn test_command_names() {
        assert_eq!(SegmentCommand::command_names(), &["by_seed", "by_mask", "whole_frame"]);
        assert_eq!(SegmentCommand::WholeFrame.to_string(), "whole_frame");
        assert!(!SegmentCommand::WholeFrame.description().is_empty());
    }
}
