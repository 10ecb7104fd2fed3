use crate::{
    algorithms::{convex_hull, simplify},
    types::{Boundary, Polygon},
};

/// Shared finishing step for both segmenters: hull, simplify, then map to
/// source resolution. The epsilon is a caller policy: finer for interactive
/// selection, coarser for batch scanning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePolygonResolver {
    epsilon: f64,
}

impl FramePolygonResolver {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn resolve(&self, boundary: &Boundary) -> Polygon {
        let hull = convex_hull(&boundary.points);
        let simplified = simplify(&hull, self.epsilon);
        let scale = boundary.scale;
        Polygon::new(
            simplified
                .into_iter()
                .map(|p| p.scale(scale.x, scale.y))
                .collect(),
        )
    }
}
