use scope_common::Point2D;

use crate::{traits::BoundaryExtractor, types::BinaryMask};

/// Marks every on pixel that has an off 4-neighbour. Only the interior is
/// scanned: the outermost ring of the mask never yields a boundary pixel,
/// so a region touching the border is open on that side.
///
/// Output is in row-major scan order, not traced along the contour.
#[derive(Debug, Clone, Copy, Default)]
pub struct InteriorEdgeExtractor;

impl BoundaryExtractor for InteriorEdgeExtractor {
    fn extract_boundary(&self, mask: &BinaryMask) -> Vec<Point2D> {
        let (width, height) = mask.dimensions();
        if width < 3 || height < 3 {
            return Vec::new();
        }

        let mut boundary = Vec::new();
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                if !mask.get(x, y) {
                    continue;
                }
                let edge = !mask.get(x, y - 1)
                    || !mask.get(x, y + 1)
                    || !mask.get(x - 1, y)
                    || !mask.get(x + 1, y);
                if edge {
                    boundary.push(Point2D::new(x as f64, y as f64));
                }
            }
        }
        boundary
    }
}
