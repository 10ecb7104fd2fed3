use geo_types::{Coord, LineString};
use schemars::JsonSchema;
use scope_common::Point2D;
use serde::{Deserialize, Serialize};

use crate::algorithms::geometry;
use crate::error::{OutlineError, Result};

/// Ordered, implicitly closed sequence of vertices. Order defines the edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Polygon {
    pub points: Vec<Point2D>,
}

impl Polygon {
    pub fn new(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Unsigned shoelace area, 0 for fewer than three vertices
    pub fn area(&self) -> f64 {
        geometry::polygon_area(&self.points)
    }

    pub fn centroid(&self) -> Option<Point2D> {
        geometry::centroid(&self.points)
    }

    /// Convert to geo-types Polygon for geometric operations
    pub fn to_geo(&self) -> geo_types::Polygon<f64> {
        let coords: Vec<Coord<f64>> = self
            .points
            .iter()
            .map(|p| Coord { x: p.x, y: p.y })
            .collect();
        geo_types::Polygon::new(LineString::new(coords), vec![])
    }

    /// Axis-aligned bounds of the vertices
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        use geo::BoundingRect;
        self.to_geo().bounding_rect().map(|rect| BoundingBox {
            min: Point2D::new(rect.min().x, rect.min().y),
            max: Point2D::new(rect.max().x, rect.max().y),
        })
    }
}

impl From<Vec<Point2D>> for Polygon {
    fn from(points: Vec<Point2D>) -> Self {
        Self { points }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    pub min: Point2D,
    pub max: Point2D,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }
}

/// Mask-space to source-space multipliers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScaleFactors {
    pub x: f64,
    pub y: f64,
}

impl ScaleFactors {
    pub fn identity() -> Self {
        Self { x: 1.0, y: 1.0 }
    }

    /// `(source_width / mask_width, source_height / mask_height)`
    pub fn between(source: (u32, u32), mask: (u32, u32)) -> Self {
        Self {
            x: source.0 as f64 / mask.0.max(1) as f64,
            y: source.1 as f64 / mask.1.max(1) as f64,
        }
    }

    /// Area of one mask pixel in source pixels
    pub fn pixel_area(&self) -> f64 {
        self.x * self.y
    }
}

impl Default for ScaleFactors {
    fn default() -> Self {
        Self::identity()
    }
}

/// Rectangular binary mask, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl BinaryMask {
    pub fn new(width: u32, height: u32, data: Vec<bool>) -> Result<Self> {
        if data.len() != (width as usize) * (height as usize) {
            return Err(OutlineError::InvalidMask(format!(
                "expected {}x{} = {} cells, got {}",
                width,
                height,
                width as usize * height as usize,
                data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    pub fn filled(width: u32, height: u32, value: bool) -> Self {
        Self {
            width,
            height,
            data: vec![value; width as usize * height as usize],
        }
    }

    /// Binarize a probability map: a cell is on when its value exceeds
    /// `threshold`
    pub fn from_probabilities(width: u32, height: u32, probs: &[f32], threshold: f32) -> Result<Self> {
        Self::new(width, height, probs.iter().map(|&p| p > threshold).collect())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Out-of-bounds reads are off
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.data[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x < self.width && y < self.height {
            self.data[(y * self.width + x) as usize] = value;
        }
    }

    pub fn count_on(&self) -> usize {
        self.data.iter().filter(|&&on| on).count()
    }
}

/// Boundary pixels of a region plus the factors that map them back to the
/// source frame
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub points: Vec<Point2D>,
    pub scale: ScaleFactors,
}

/// Whole-frame scan result. `area` comes from the raw mask pixel count and
/// is not derived from `polygon`; the two are not expected to agree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AreaMeasurement {
    pub area: f64,
    pub polygon: Polygon,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_rejects_wrong_length() {
        assert!(BinaryMask::new(3, 3, vec![true; 8]).is_err());
    }

    #[test]
    fn test_mask_binarizes_strictly_above_threshold() {
        let mask = BinaryMask::from_probabilities(2, 2, &[0.5, 0.51, 0.0, 1.0], 0.5).unwrap();
        assert!(!mask.get(0, 0));
        assert!(mask.get(1, 0));
        assert_eq!(mask.count_on(), 2);
        assert!(!mask.get(5, 5));
    }

    #[test]
    fn test_scale_factors() {
        let scale = ScaleFactors::between((512, 128), (256, 256));
        assert_eq!(scale.x, 2.0);
        assert_eq!(scale.y, 0.5);
        assert_eq!(scale.pixel_area(), 1.0);
    }

    #[test]
    fn test_polygon_bounding_box() {
        let polygon = Polygon::new(vec![
            Point2D::new(1.0, 2.0),
            Point2D::new(5.0, 2.0),
            Point2D::new(3.0, 7.0),
        ]);
        let bbox = polygon.bounding_box().unwrap();
        assert_eq!(bbox.min, Point2D::new(1.0, 2.0));
        assert_eq!(bbox.max, Point2D::new(5.0, 7.0));
        assert_eq!(bbox.area(), 20.0);
        assert!(Polygon::empty().bounding_box().is_none());
    }
}
