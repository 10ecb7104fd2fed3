use std::collections::VecDeque;

use image::RgbImage;
use scope_common::Point2D;
use tracing::debug;

use super::preprocessing::color_distance;
use crate::{
    error::{OutlineError, Result},
    traits::SeededSegmenter,
    types::{Boundary, ScaleFactors},
};

const NEIGHBOURS: [(i64, i64); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// Colour-similarity flood fill from a seed pixel
#[derive(Debug, Clone)]
pub struct RegionGrowSegmenter {
    /// Maximum Euclidean RGB distance from the target colour
    pub tolerance: f64,
    /// Colour to match. `None` uses the seed pixel's colour.
    pub target: Option<[u8; 3]>,
    /// Half-width of the relocation window searched when the seed itself
    /// does not match (2 gives a 5x5 window)
    pub search_radius: i64,
}

impl Default for RegionGrowSegmenter {
    fn default() -> Self {
        Self {
            tolerance: 32.0,
            target: None,
            search_radius: 2,
        }
    }
}

/// Pixels absorbed by a flood fill
#[derive(Debug, Clone)]
pub struct GrownRegion {
    pub width: u32,
    pub height: u32,
    /// Start pixel after relocation
    pub origin: (u32, u32),
    pub pixels: Vec<(u32, u32)>,
    in_region: Vec<bool>,
}

impl GrownRegion {
    pub fn contains(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.in_region[(y as usize) * (self.width as usize) + x as usize]
    }

    /// Absorbed pixels with at least one 4-neighbour outside the region or
    /// outside the image
    pub fn boundary(&self) -> Vec<Point2D> {
        self.pixels
            .iter()
            .filter(|&&(x, y)| {
                NEIGHBOURS
                    .iter()
                    .any(|&(dx, dy)| !self.contains(x as i64 + dx, y as i64 + dy))
            })
            .map(|&(x, y)| Point2D::new(x as f64, y as f64))
            .collect()
    }
}

impl RegionGrowSegmenter {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }

    pub fn with_target(mut self, target: [u8; 3]) -> Self {
        self.target = Some(target);
        self
    }

    fn matches(&self, image: &RgbImage, x: i64, y: i64, target: [u8; 3]) -> bool {
        if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
            return false;
        }
        color_distance(image.get_pixel(x as u32, y as u32).0, target) <= self.tolerance
    }

    /// First matching pixel in the relocation window, rows top to bottom
    fn relocate(&self, image: &RgbImage, sx: i64, sy: i64, target: [u8; 3]) -> Option<(u32, u32)> {
        if self.matches(image, sx, sy, target) {
            return Some((sx as u32, sy as u32));
        }
        let r = self.search_radius;
        for y in sy - r..=sy + r {
            for x in sx - r..=sx + r {
                if self.matches(image, x, y, target) {
                    return Some((x as u32, y as u32));
                }
            }
        }
        None
    }

    /// Breadth-first 4-connected fill
    pub fn grow(&self, image: &RgbImage, seed: Point2D) -> Result<GrownRegion> {
        let (sx, sy) = seed.round();
        let in_bounds = sx >= 0 && sy >= 0 && sx < image.width() as i64 && sy < image.height() as i64;

        let target = match (self.target, in_bounds) {
            (Some(target), _) => target,
            (None, true) => image.get_pixel(sx as u32, sy as u32).0,
            (None, false) => {
                return Err(OutlineError::NoMatch(format!("seed ({}, {}) is outside the frame", sx, sy)));
            }
        };

        let origin = self.relocate(image, sx, sy, target).ok_or_else(|| {
            OutlineError::NoMatch(format!(
                "no pixel within {} of {:?} near ({}, {})",
                self.tolerance, target, sx, sy
            ))
        })?;

        let width = image.width();
        let height = image.height();
        let mut in_region = vec![false; width as usize * height as usize];
        let mut pixels = Vec::new();
        let mut queue = VecDeque::new();

        in_region[origin.1 as usize * width as usize + origin.0 as usize] = true;
        queue.push_back(origin);

        while let Some((x, y)) = queue.pop_front() {
            pixels.push((x, y));
            for (dx, dy) in NEIGHBOURS {
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if !self.matches(image, nx, ny, target) {
                    continue;
                }
                let idx = ny as usize * width as usize + nx as usize;
                if in_region[idx] {
                    continue;
                }
                in_region[idx] = true;
                queue.push_back((nx as u32, ny as u32));
            }
        }

        debug!(pixels = pixels.len(), ?origin, "region grown");

        Ok(GrownRegion {
            width,
            height,
            origin,
            pixels,
            in_region,
        })
    }
}

impl SeededSegmenter for RegionGrowSegmenter {
    fn boundary(&self, image: &RgbImage, seed: Point2D) -> Result<Boundary> {
        let region = self.grow(image, seed)?;
        let points = region.boundary();
        if points.len() < 3 {
            return Err(OutlineError::DegenerateRegion { points: points.len() });
        }
        Ok(Boundary {
            points,
            scale: ScaleFactors::identity(),
        })
    }
}
