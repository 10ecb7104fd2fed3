use image::RgbImage;
use scope_common::VideoMetadata;

use crate::driver::{VideoSource, clamp_seek};
use crate::{Result, SampleError};

/// Frames held in memory at a constant frame rate. Useful for tests and for
/// image sequences that have already been decoded.
#[derive(Debug, Clone)]
pub struct MemorySource {
    metadata: VideoMetadata,
    frames: Vec<RgbImage>,
    unreadable: Vec<usize>,
    position: Option<usize>,
    seeks: Vec<f64>,
}

impl MemorySource {
    pub fn new(frames: Vec<RgbImage>, framerate: f64) -> Result<Self> {
        let first = frames
            .first()
            .ok_or_else(|| SampleError::Initialization("memory source needs at least one frame".to_string()))?;
        if !(framerate.is_finite() && framerate > 0.0) {
            return Err(SampleError::InvalidRate(framerate));
        }

        let metadata = VideoMetadata {
            duration: frames.len() as f64 / framerate,
            width: first.width(),
            height: first.height(),
            framerate,
            codec: None,
        };

        Ok(Self {
            metadata,
            frames,
            unreadable: Vec::new(),
            position: None,
            seeks: Vec::new(),
        })
    }

    /// Build `count` frames from a function of the frame timestamp
    pub fn from_fn<F>(count: usize, framerate: f64, render: F) -> Result<Self>
    where
        F: Fn(f64) -> RgbImage,
    {
        let frames = (0..count).map(|i| render(i as f64 / framerate)).collect();
        Self::new(frames, framerate)
    }

    /// Mark frames whose seek fails, addressed by frame index
    pub fn with_unreadable(mut self, frames: impl IntoIterator<Item = usize>) -> Self {
        self.unreadable.extend(frames);
        self
    }

    /// Every timestamp that has been requested, in call order
    pub fn seek_history(&self) -> &[f64] {
        &self.seeks
    }

    fn index_of(&self, timestamp: f64) -> usize {
        let index = (timestamp * self.metadata.framerate + 1e-9).floor() as usize;
        index.min(self.frames.len() - 1)
    }
}

impl VideoSource for MemorySource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn seek(&mut self, timestamp: f64) -> Result<f64> {
        self.seeks.push(timestamp);
        if !timestamp.is_finite() {
            return Err(SampleError::MediaSeek {
                time: timestamp,
                reason: "timestamp is not finite".to_string(),
            });
        }

        let index = self.index_of(clamp_seek(&self.metadata, timestamp));
        if self.unreadable.contains(&index) {
            self.position = None;
            return Err(SampleError::MediaSeek {
                time: timestamp,
                reason: format!("frame {index} is unreadable"),
            });
        }

        self.position = Some(index);
        Ok(index as f64 / self.metadata.framerate)
    }

    fn capture(&mut self) -> Result<RgbImage> {
        let index = self
            .position
            .ok_or_else(|| SampleError::Capture("no frame selected, seek first".to_string()))?;
        Ok(self.frames[index].clone())
    }

    fn description(&self) -> String {
        format!(
            "Memory Source: {} frames at {} fps",
            self.frames.len(),
            self.metadata.framerate
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(count: usize) -> MemorySource {
        MemorySource::from_fn(count, 2.0, |t| RgbImage::from_pixel(4, 4, Rgb([(t * 10.0) as u8, 0, 0]))).unwrap()
    }

    #[test]
    fn test_metadata_from_frames() {
        let source = gradient(6);
        let metadata = source.metadata();
        assert_eq!(metadata.duration, 3.0);
        assert_eq!(metadata.width, 4);
        assert_eq!(metadata.last_frame_time(), 2.5);
    }

    #[test]
    fn test_seek_then_capture() {
        let mut source = gradient(6);
        assert_eq!(source.seek(1.0).unwrap(), 1.0);
        assert_eq!(source.capture().unwrap().get_pixel(0, 0)[0], 10);
    }

    #[test]
    fn test_seek_past_end_clamps() {
        let mut source = gradient(6);
        assert_eq!(source.seek(100.0).unwrap(), 2.5);
        assert_eq!(source.capture().unwrap().get_pixel(0, 0)[0], 25);
    }

    #[test]
    fn test_capture_without_seek() {
        let mut source = gradient(2);
        assert!(matches!(source.capture(), Err(SampleError::Capture(_))));
    }

    #[test]
    fn test_unreadable_frame() {
        let mut source = gradient(4).with_unreadable([1]);
        assert!(matches!(source.seek(0.5), Err(SampleError::MediaSeek { .. })));
        assert!(source.capture().is_err());
        assert!(source.seek(1.0).is_ok());
        assert_eq!(source.seek_history(), &[0.5, 1.0]);
    }

    #[test]
    fn test_rejects_empty_and_bad_rate() {
        assert!(MemorySource::new(Vec::new(), 1.0).is_err());
        assert!(matches!(
            MemorySource::new(vec![RgbImage::new(1, 1)], 0.0),
            Err(SampleError::InvalidRate(_))
        ));
    }
}
