use image::{RgbImage, imageops::FilterType};

use crate::traits::ClassifierInput;

/// Resize the frame to `size`x`size` and lay it out as a CHW tensor with
/// channel values divided by 255.
pub fn prepare_input(image: &RgbImage, size: u32) -> ClassifierInput {
    let resized = image::imageops::resize(image, size, size, FilterType::Triangle);
    let plane = (size as usize) * (size as usize);
    let mut tensor = vec![0.0f32; plane * 3];

    for (i, pixel) in resized.pixels().enumerate() {
        for c in 0..3 {
            tensor[c * plane + i] = pixel.0[c] as f32 / 255.0;
        }
    }

    ClassifierInput { size, tensor }
}

/// Euclidean RGB distance
pub fn color_distance(a: [u8; 3], b: [u8; 3]) -> f64 {
    let dr = a[0] as f64 - b[0] as f64;
    let dg = a[1] as f64 - b[1] as f64;
    let db = a[2] as f64 - b[2] as f64;
    (dr * dr + dg * dg + db * db).sqrt()
}
