use scope_common::Point2D;

use super::geometry::perpendicular_distance;

/// Ramer-Douglas-Peucker over an immutable slice. Each call works on its own
/// sub-slice and returns a fresh vector, so the two halves of a split are
/// independent. The first and last input points are always kept.
pub fn simplify(points: &[Point2D], epsilon: f64) -> Vec<Point2D> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let first = points[0];
    let last = points[points.len() - 1];

    let (split, max_distance) = points[1..points.len() - 1]
        .iter()
        .enumerate()
        .map(|(i, &p)| (i + 1, perpendicular_distance(p, first, last)))
        .fold((0, 0.0), |best, candidate| if candidate.1 > best.1 { candidate } else { best });

    if max_distance > epsilon {
        let mut left = simplify(&points[..=split], epsilon);
        let right = simplify(&points[split..], epsilon);
        // The split point ends `left` and starts `right`
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point2D> {
        coords.iter().map(|&(x, y)| Point2D::new(x, y)).collect()
    }

    #[test]
    fn test_base_cases() {
        assert!(simplify(&[], 1.0).is_empty());
        let two = pts(&[(0.0, 0.0), (5.0, 5.0)]);
        assert_eq!(simplify(&two, 1.0), two);
    }

    #[test]
    fn test_collapses_nearly_straight_line() {
        let line = pts(&[(0.0, 0.0), (1.0, 0.1), (2.0, -0.1), (3.0, 0.05), (4.0, 0.0)]);
        assert_eq!(simplify(&line, 0.5), pts(&[(0.0, 0.0), (4.0, 0.0)]));
    }

    #[test]
    fn test_keeps_significant_corner() {
        let corner = pts(&[(0.0, 0.0), (2.0, 0.0), (4.0, 0.0), (4.0, 2.0), (4.0, 4.0)]);
        assert_eq!(simplify(&corner, 0.5), pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0)]));
    }

    #[test]
    fn test_endpoints_always_retained() {
        let wavy: Vec<Point2D> = (0..50)
            .map(|i| Point2D::new(i as f64, ((i as f64) * 0.7).sin() * 3.0))
            .collect();
        for epsilon in [0.0, 0.5, 2.0, 100.0] {
            let out = simplify(&wavy, epsilon);
            assert_eq!(out.first(), wavy.first());
            assert_eq!(out.last(), wavy.last());
        }
    }

    #[test]
    fn test_larger_epsilon_is_coarser() {
        let wavy: Vec<Point2D> = (0..80)
            .map(|i| Point2D::new(i as f64, ((i as f64) * 0.3).sin() * 10.0))
            .collect();
        let fine = simplify(&wavy, 0.5);
        let coarse = simplify(&wavy, 3.0);
        assert!(coarse.len() <= fine.len());
        assert!(fine.len() < wavy.len());
    }

    #[test]
    fn test_zero_epsilon_drops_only_collinear_points() {
        let square = pts(&[(0.0, 0.0), (2.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        assert_eq!(
            simplify(&square, 0.0),
            pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)])
        );
    }

    #[test]
    fn test_zero_length_chord_uses_point_distance() {
        // Closed ring: first == last, chord has zero length
        let ring = pts(&[(0.0, 0.0), (3.0, 0.0), (3.0, 3.0), (0.0, 0.0)]);
        let out = simplify(&ring, 1.0);
        assert_eq!(out.first(), Some(&Point2D::new(0.0, 0.0)));
        assert_eq!(out.last(), Some(&Point2D::new(0.0, 0.0)));
        assert!(out.contains(&Point2D::new(3.0, 3.0)));
    }
}
