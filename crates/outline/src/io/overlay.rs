use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_cross_mut, draw_line_segment_mut};
use scope_common::Point2D;

use crate::types::Polygon;

/// Draw the closed outline of `polygon` onto `canvas`
pub fn draw_polygon(canvas: &mut RgbImage, polygon: &Polygon, color: Rgb<u8>) {
    let n = polygon.len();
    if n < 2 {
        return;
    }
    for i in 0..n {
        let a = polygon.points[i];
        let b = polygon.points[(i + 1) % n];
        draw_line_segment_mut(canvas, (a.x as f32, a.y as f32), (b.x as f32, b.y as f32), color);
    }
}

/// Mark the seed point with a small cross
pub fn draw_seed(canvas: &mut RgbImage, seed: Point2D, color: Rgb<u8>) {
    draw_cross_mut(canvas, color, seed.x.round() as i32, seed.y.round() as i32);
}

/// Copy of `image` with the outline and seed drawn on top
pub fn render_overlay(image: &RgbImage, polygon: &Polygon, seed: Option<Point2D>) -> RgbImage {
    let mut canvas = image.clone();
    draw_polygon(&mut canvas, polygon, Rgb([0, 255, 0]));
    if let Some(seed) = seed {
        draw_seed(&mut canvas, seed, Rgb([255, 0, 0]));
    }
    canvas
}
