//! # Region Outline Extraction Library
//!
//! Extracts a closed region boundary around a point of interest in a still
//! frame, either by growing a region of similar colour from a seed pixel or
//! from the binary mask of an external classifier, and reduces it to a
//! simplified convex polygon in source-pixel coordinates.
//!
//! ## Core Features
//!
//! - **Geometry kernel**: shoelace area, centroid, monotone-chain convex hull,
//!   Ramer-Douglas-Peucker simplification, point/segment distances
//! - **Region growing**: colour-tolerance flood fill with seed relocation
//! - **Mask segmentation**: seeded and whole-frame modes over an injected
//!   classifier handle
//! - **GeoJSON and overlay export** of the resulting outlines
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use outline::{Segmenter, SegmentationConfig};
//! use scope_common::Point2D;
//!
//! let image = image::open("frame.png")?.to_rgb8();
//! let segmenter = Segmenter::without_classifier(SegmentationConfig::default());
//!
//! let polygon = segmenter.segment_by_seed(&image, Point2D::new(120.0, 80.0), None, 30.0, 2.0)?;
//! println!("{}", polygon.to_geojson_string()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Classifier
//!
//! ```rust,no_run
//! use outline::{ClassifierHandle, ClassifierInput, FnClassifier, Segmenter, SegmentationConfig};
//!
//! let handle = ClassifierHandle::ready(FnClassifier::new("bright", |input: &ClassifierInput| {
//!     let plane = (input.size * input.size) as usize;
//!     Ok(input.tensor[..plane].iter().map(|&r| if r > 0.8 { 1.0 } else { 0.0 }).collect())
//! }));
//! let segmenter = Segmenter::new(handle, SegmentationConfig::default());
//!
//! let image = image::open("frame.png")?.to_rgb8();
//! let measurement = segmenter.scan_whole_frame(&image)?;
//! println!("area: {}", measurement.area);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod config;
pub mod classifier;
pub mod resolver;
pub mod mask_segmenter;
pub mod segmenter;
pub mod io;

// Re-exports for convenience
pub use error::{OutlineError, Result};
pub use types::{AreaMeasurement, BinaryMask, Boundary, BoundingBox, Polygon, ScaleFactors};
pub use traits::*;
pub use algorithms::*;
pub use config::SegmentationConfig;
pub use classifier::{ClassifierHandle, ClassifierStatus, CommandClassifier, FnClassifier};
pub use resolver::FramePolygonResolver;
pub use mask_segmenter::MaskSegmenter;
pub use segmenter::{SegmentCommand, SegmentOutcome, Segmenter};
pub use io::{OutlineProperties, draw_polygon, render_overlay};

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use scope_common::Point2D;

    /// Dark frame with a bright disc
    fn create_test_image() -> RgbImage {
        RgbImage::from_fn(100, 100, |x, y| {
            let dx = x as f64 - 50.0;
            let dy = y as f64 - 45.0;
            if dx * dx + dy * dy <= 25.0 * 25.0 {
                Rgb([240, 200, 180])
            } else {
                Rgb([15, 10, 10])
            }
        })
    }

    #[test]
    fn test_seed_polygon_approximates_disc() {
        let segmenter = Segmenter::without_classifier(SegmentationConfig::default());
        let polygon = segmenter
            .segment_by_seed(&create_test_image(), Point2D::new(50.0, 45.0), None, 20.0, 1.0)
            .expect("Should outline the disc");

        let disc = std::f64::consts::PI * 25.0 * 25.0;
        assert!(polygon.area() > disc * 0.85 && polygon.area() < disc);

        let centre = polygon.centroid().expect("Polygon has vertices");
        assert!(centre.distance_to(Point2D::new(50.0, 45.0)) < 2.0);
    }

    #[test]
    fn test_interactive_epsilon_is_finer_than_batch() {
        let config = SegmentationConfig::default();
        assert!(config.interactive_epsilon < config.batch_epsilon);

        let segmenter = Segmenter::without_classifier(config.clone());
        let image = create_test_image();
        let seed = Point2D::new(50.0, 45.0);
        let fine = segmenter
            .segment_by_seed(&image, seed, None, 20.0, config.interactive_epsilon)
            .unwrap();
        let coarse = segmenter
            .segment_by_seed(&image, seed, None, 20.0, config.batch_epsilon)
            .unwrap();
        assert!(coarse.len() <= fine.len());
    }

    #[test]
    fn test_geojson_export() {
        let segmenter = Segmenter::without_classifier(SegmentationConfig::default());
        let polygon = segmenter
            .segment_by_seed(&create_test_image(), Point2D::new(50.0, 45.0), None, 20.0, 2.0)
            .unwrap();
        let feature = polygon.to_feature().expect("Should create GeoJSON");
        assert!(feature.geometry.is_some());
    }
}
