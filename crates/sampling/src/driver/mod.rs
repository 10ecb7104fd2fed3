#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;

pub mod memory;

use image::RgbImage;
use scope_common::VideoMetadata;

use crate::Result;

/// A decodable media handle. Each backend owns one current-frame position:
/// `seek` blocks until the position has settled and `capture` decodes the
/// frame at that position. Callers must not interleave seeks from several
/// threads on the same source.
pub trait VideoSource: Send {
    /// Duration, native size and frame rate
    fn metadata(&self) -> &VideoMetadata;

    /// Move to `timestamp`, returning the position actually reached. A
    /// target past the last decodable frame is clamped onto it.
    fn seek(&mut self, timestamp: f64) -> Result<f64>;

    /// Decode the frame at the current position
    fn capture(&mut self) -> Result<RgbImage>;

    /// Get a human-readable description of this source
    fn description(&self) -> String;
}

impl<S: VideoSource + ?Sized> VideoSource for Box<S> {
    fn metadata(&self) -> &VideoMetadata {
        (**self).metadata()
    }

    fn seek(&mut self, timestamp: f64) -> Result<f64> {
        (**self).seek(timestamp)
    }

    fn capture(&mut self) -> Result<RgbImage> {
        (**self).capture()
    }

    fn description(&self) -> String {
        (**self).description()
    }
}

/// Clamp a seek target into `[0, last_frame_time]`
pub fn clamp_seek(metadata: &VideoMetadata, timestamp: f64) -> f64 {
    timestamp.clamp(0.0, metadata.last_frame_time())
}
