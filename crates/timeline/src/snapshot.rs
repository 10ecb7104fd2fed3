use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, RgbImage};
use sampling::VideoSource;

use crate::error::{Result, TimelineError};

pub const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Encode a frame as a JPEG `data:` URL
pub fn encode_data_url(image: &RgbImage) -> Result<String> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Jpeg)
        .map_err(|e| TimelineError::Snapshot(e.to_string()))?;
    Ok(format!("{JPEG_DATA_URL_PREFIX}{}", STANDARD.encode(buffer.into_inner())))
}

/// Seek `source` to `time` and encode what it shows
pub fn capture_snapshot<S: VideoSource + ?Sized>(source: &mut S, time: f64) -> Result<String> {
    source.seek(time)?;
    let frame = source.capture()?;
    encode_data_url(&frame)
}
