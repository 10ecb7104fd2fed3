use image::RgbImage;
use scope_common::Point2D;
use tracing::debug;

use crate::{
    algorithms::InteriorEdgeExtractor,
    classifier::ClassifierHandle,
    config::SegmentationConfig,
    error::{OutlineError, Result},
    resolver::FramePolygonResolver,
    traits::{BoundaryExtractor, SeededSegmenter},
    types::{AreaMeasurement, BinaryMask, Boundary, Polygon, ScaleFactors},
};

/// Segmentation driven by the external classifier's mask
#[derive(Debug, Clone)]
pub struct MaskSegmenter<E = InteriorEdgeExtractor> {
    classifier: ClassifierHandle,
    extractor: E,
    config: SegmentationConfig,
}

impl MaskSegmenter<InteriorEdgeExtractor> {
    pub fn new(classifier: ClassifierHandle, config: SegmentationConfig) -> Self {
        Self::with_extractor(classifier, InteriorEdgeExtractor, config)
    }
}

impl<E: BoundaryExtractor> MaskSegmenter<E> {
    pub fn with_extractor(classifier: ClassifierHandle, extractor: E, config: SegmentationConfig) -> Self {
        Self {
            classifier,
            extractor,
            config,
        }
    }

    pub fn classifier(&self) -> &ClassifierHandle {
        &self.classifier
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// Run the classifier and pair its mask with the factors that map mask
    /// pixels back onto the frame
    pub fn mask(&self, image: &RgbImage) -> Result<(BinaryMask, ScaleFactors)> {
        let mask = self
            .classifier
            .classify(image, self.config.inference_size, self.config.threshold)?;
        let scale = ScaleFactors::between(image.dimensions(), mask.dimensions());
        Ok((mask, scale))
    }

    /// Keep boundary points near the seed, falling back to the full
    /// boundary when too few survive
    pub fn select_near_seed(&self, boundary: Vec<Point2D>, seed: Point2D, scale: ScaleFactors) -> Vec<Point2D> {
        let seed_in_mask = seed.scale(1.0 / scale.x, 1.0 / scale.y);
        let radius = self.config.seed_radius();

        let near: Vec<Point2D> = boundary
            .iter()
            .copied()
            .filter(|p| p.distance_to(seed_in_mask) < radius)
            .collect();

        if near.len() < self.config.min_seed_points {
            debug!(
                near = near.len(),
                total = boundary.len(),
                "too few boundary points near seed, using the whole boundary"
            );
            boundary
        } else {
            near
        }
    }

    /// Area from the raw on-pixel count scaled to source pixels. A polygon
    /// is only traced when the detection is above the significance
    /// threshold; otherwise it is left empty.
    pub fn scan_whole_frame(&self, image: &RgbImage, resolver: &FramePolygonResolver) -> Result<AreaMeasurement> {
        let (mask, scale) = self.mask(image)?;
        Ok(self.measure(&mask, scale, resolver))
    }

    /// Whole-frame measurement on an already computed mask
    pub fn measure(&self, mask: &BinaryMask, scale: ScaleFactors, resolver: &FramePolygonResolver) -> AreaMeasurement {
        let on = mask.count_on();
        let area = on as f64 * scale.pixel_area();

        if on <= self.config.min_significant_pixels {
            return AreaMeasurement {
                area,
                polygon: Polygon::empty(),
            };
        }

        let points = self.extractor.extract_boundary(mask);
        let polygon = if points.len() >= 3 {
            resolver.resolve(&Boundary { points, scale })
        } else {
            Polygon::empty()
        };

        AreaMeasurement { area, polygon }
    }
}

impl<E: BoundaryExtractor> SeededSegmenter for MaskSegmenter<E> {
    fn boundary(&self, image: &RgbImage, seed: Point2D) -> Result<Boundary> {
        let (mask, scale) = self.mask(image)?;
        let boundary = self.extractor.extract_boundary(&mask);
        if boundary.is_empty() {
            return Err(OutlineError::NoMatch("no region detected in mask".to_string()));
        }

        let points = self.select_near_seed(boundary, seed, scale);
        if points.len() < 3 {
            return Err(OutlineError::DegenerateRegion { points: points.len() });
        }
        Ok(Boundary { points, scale })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::FnClassifier;
    use crate::traits::{ClassifierInput, MaskClassifier};
    use image::Rgb;
    use std::sync::{Arc, Mutex};

    const SIZE: u32 = 32;

    /// Reports a fixed mask and counts calls
    struct FixedMask {
        probs: Vec<f32>,
        calls: Arc<Mutex<usize>>,
    }

    impl MaskClassifier for FixedMask {
        fn infer(&mut self, _input: &ClassifierInput) -> Result<Vec<f32>> {
            *self.calls.lock().unwrap() += 1;
            Ok(self.probs.clone())
        }
    }

    fn block_probs(x0: u32, y0: u32, x1: u32, y1: u32) -> Vec<f32> {
        (0..SIZE * SIZE)
            .map(|i| {
                let (x, y) = (i % SIZE, i / SIZE);
                if x >= x0 && x < x1 && y >= y0 && y < y1 { 1.0 } else { 0.0 }
            })
            .collect()
    }

    fn config() -> SegmentationConfig {
        SegmentationConfig {
            inference_size: SIZE,
            ..SegmentationConfig::default()
        }
    }

    fn segmenter(probs: Vec<f32>) -> MaskSegmenter {
        let calls = Arc::new(Mutex::new(0));
        MaskSegmenter::new(ClassifierHandle::ready(FixedMask { probs, calls }), config())
    }

    #[test]
    fn test_whole_frame_all_zero_mask() {
        let segmenter = segmenter(vec![0.0; (SIZE * SIZE) as usize]);
        let image = RgbImage::new(64, 64);
        let result = segmenter.scan_whole_frame(&image, &FramePolygonResolver::new(3.0)).unwrap();
        assert_eq!(result.area, 0.0);
        assert!(result.polygon.is_empty());
    }

    #[test]
    fn test_whole_frame_area_scales_pixel_count() {
        // 10x10 block in a 32x32 mask, frame is 64x96
        let segmenter = segmenter(block_probs(5, 5, 15, 15));
        let image = RgbImage::new(64, 96);
        let result = segmenter.scan_whole_frame(&image, &FramePolygonResolver::new(1.0)).unwrap();
        assert_eq!(result.area, 100.0 * 2.0 * 3.0);
        assert_eq!(result.polygon.len(), 4);
        // Hull of boundary pixel centres is smaller than the pixel count
        assert!(result.polygon.area() < result.area);
    }

    #[test]
    fn test_whole_frame_below_significance_has_no_polygon() {
        // 4x5 = 20 pixels, not more than the threshold
        let segmenter = segmenter(block_probs(5, 5, 9, 10));
        let image = RgbImage::new(32, 32);
        let result = segmenter.scan_whole_frame(&image, &FramePolygonResolver::new(1.0)).unwrap();
        assert_eq!(result.area, 20.0);
        assert!(result.polygon.is_empty());
    }

    #[test]
    fn test_seeded_keeps_points_near_seed() {
        let mut probs = block_probs(2, 2, 8, 8);
        for (i, p) in block_probs(20, 20, 30, 30).into_iter().enumerate() {
            probs[i] = probs[i].max(p);
        }
        let mut cfg = config();
        cfg.seed_radius = Some(6.0);
        cfg.min_seed_points = 5;
        let segmenter = MaskSegmenter::new(
            ClassifierHandle::ready(FixedMask { probs, calls: Arc::new(Mutex::new(0)) }),
            cfg,
        );
        let image = RgbImage::new(32, 32);
        let boundary = segmenter.boundary(&image, Point2D::new(5.0, 5.0)).unwrap();
        assert!(boundary.points.iter().all(|p| p.x < 10.0 && p.y < 10.0));
    }

    #[test]
    fn test_seeded_falls_back_to_all_points() {
        let segmenter = segmenter(block_probs(2, 2, 8, 8));
        let image = RgbImage::new(32, 32);
        let all = InteriorEdgeExtractor.extract_boundary(&segmenter.mask(&image).unwrap().0);

        let mut cfg = config();
        cfg.seed_radius = Some(1.0);
        let narrow = MaskSegmenter::new(segmenter.classifier().clone(), cfg);
        let boundary = narrow.boundary(&image, Point2D::new(25.0, 25.0)).unwrap();
        assert_eq!(boundary.points, all);
    }

    fn near_and_far(near: usize) -> Vec<Point2D> {
        let mut points = vec![Point2D::new(1.0, 1.0); near];
        points.extend(vec![Point2D::new(30.0, 30.0); 5]);
        points
    }

    #[test]
    fn test_ten_near_points_fall_back() {
        let mut cfg = config();
        cfg.seed_radius = Some(5.0);
        let segmenter = MaskSegmenter::new(ClassifierHandle::unavailable("unused"), cfg);
        let kept = segmenter.select_near_seed(near_and_far(10), Point2D::new(0.0, 0.0), ScaleFactors::identity());
        assert_eq!(kept.len(), 15);
    }

    #[test]
    fn test_eleven_near_points_are_kept() {
        let mut cfg = config();
        cfg.seed_radius = Some(5.0);
        let segmenter = MaskSegmenter::new(ClassifierHandle::unavailable("unused"), cfg);
        let kept = segmenter.select_near_seed(near_and_far(11), Point2D::new(0.0, 0.0), ScaleFactors::identity());
        assert_eq!(kept.len(), 11);
        assert!(kept.iter().all(|p| *p == Point2D::new(1.0, 1.0)));
    }

    #[test]
    fn test_seed_is_mapped_into_mask_space() {
        let segmenter = segmenter(block_probs(2, 2, 8, 8));
        let scale = ScaleFactors { x: 10.0, y: 10.0 };
        let mut boundary = vec![Point2D::new(2.0, 2.0); 12];
        boundary.push(Point2D::new(31.0, 31.0));
        // Source (50, 50) is mask (5, 5): the twelve near points survive,
        // the far corner is dropped
        let kept = segmenter.select_near_seed(boundary, Point2D::new(50.0, 50.0), scale);
        assert_eq!(kept.len(), 12);
    }

    #[test]
    fn test_seeded_empty_mask_is_no_match() {
        let segmenter = segmenter(vec![0.0; (SIZE * SIZE) as usize]);
        let image = RgbImage::new(32, 32);
        assert!(matches!(
            segmenter.boundary(&image, Point2D::new(3.0, 3.0)),
            Err(OutlineError::NoMatch(_))
        ));
    }

    #[test]
    fn test_unavailable_classifier_is_surfaced() {
        let segmenter = MaskSegmenter::new(ClassifierHandle::unavailable("no weights"), config());
        let image = RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]));
        assert!(matches!(
            segmenter.scan_whole_frame(&image, &FramePolygonResolver::new(1.0)),
            Err(OutlineError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_closure_backend() {
        let handle = ClassifierHandle::ready(FnClassifier::new("ones", |input: &ClassifierInput| {
            Ok(vec![1.0; (input.size * input.size) as usize])
        }));
        let segmenter = MaskSegmenter::new(handle, config());
        let image = RgbImage::new(32, 32);
        let result = segmenter.scan_whole_frame(&image, &FramePolygonResolver::new(1.0)).unwrap();
        assert_eq!(result.area, (SIZE * SIZE) as f64);
        // Every interior pixel has on neighbours, nothing to trace
        assert!(result.polygon.is_empty());
    }
}
