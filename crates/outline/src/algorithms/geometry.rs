//! Pure geometric primitives over pixel coordinates. Nothing here allocates
//! state or fails on well-formed input.

use std::cmp::Ordering;

use scope_common::Point2D;

/// Z component of `(a - o) x (b - o)`. Positive for a left turn.
pub fn cross(o: Point2D, a: Point2D, b: Point2D) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Shoelace area with orientation: positive for counter-clockwise input
/// in a y-up frame, negative when the sequence is reversed.
pub fn signed_area(points: &[Point2D]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice += p.x * q.y - q.x * p.y;
    }
    twice / 2.0
}

/// Unsigned shoelace area, 0 for fewer than three points
pub fn polygon_area(points: &[Point2D]) -> f64 {
    signed_area(points).abs()
}

/// Arithmetic mean of the points. `None` on empty input.
pub fn centroid(points: &[Point2D]) -> Option<Point2D> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point2D::new(sx / n, sy / n))
}

/// Distance from `p` to the closed segment `a..b`
pub fn point_to_segment_distance(p: Point2D, a: Point2D, b: Point2D) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(Point2D::new(a.x + t * dx, a.y + t * dy))
}

/// Distance from `p` to the infinite line through `a` and `b`, computed as
/// twice the triangle area over the base. A zero-length chord degenerates
/// to the distance to `a`.
pub fn perpendicular_distance(p: Point2D, a: Point2D, b: Point2D) -> f64 {
    let base = a.distance_to(b);
    if base == 0.0 {
        return p.distance_to(a);
    }
    cross(a, b, p).abs() / base
}

/// Total order on points: by x, then by y
fn lexicographic(a: &Point2D, b: &Point2D) -> Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}

/// Andrew's monotone chain. Inputs with fewer than three points come back
/// unchanged. Collinear points are dropped (`cross <= 0` pops), and the
/// output does not repeat its first vertex.
pub fn convex_hull(points: &[Point2D]) -> Vec<Point2D> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut sorted = points.to_vec();
    sorted.sort_by(lexicographic);

    let mut lower: Vec<Point2D> = Vec::with_capacity(sorted.len());
    for &p in &sorted {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Point2D> = Vec::with_capacity(sorted.len());
    for &p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}
