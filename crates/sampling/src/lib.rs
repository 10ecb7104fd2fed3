pub mod driver;

use image::RgbImage;
use schemars::JsonSchema;
use scope_common::{CommonError, RetryPolicy, TimestampRange};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr, VariantNames};
use thiserror::Error;
use tracing::{debug, warn};

pub use driver::VideoSource;
pub use driver::memory::MemorySource;
#[cfg(feature = "ffmpeg")]
pub use driver::ffmpeg::FfmpegSource;

#[derive(Error, Debug)]
pub enum SampleError {
    #[error("Seek to {time:.3}s failed: {reason}")]
    MediaSeek { time: f64, reason: String },

    #[error("Frame capture failed: {0}")]
    Capture(String),

    #[error("Failed to initialize source: {0}")]
    Initialization(String),

    #[error("Probe failed: {0}")]
    Probe(String),

    #[error("Sampling rate must be positive, got {0}")]
    InvalidRate(f64),

    #[error("Frame decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Malformed probe output: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("Frame at {time:.3}s unavailable: {source}")]
    Frame {
        time: f64,
        source: Box<SampleError>,
    },
}

impl SampleError {
    /// Timestamp the failure refers to, when known
    pub fn time(&self) -> Option<f64> {
        match self {
            Self::Frame { time, .. } | Self::MediaSeek { time, .. } => Some(*time),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SampleError>;

/// Part of the video that is sampled
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, VariantNames, IntoStaticStr,
    PartialEq
)]
#[serde(tag = "mode", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScanWindow {
    /// The whole video
    #[default]
    Full,
    /// Skip the first and last 5%, where intros and fades usually sit
    Auto,
    /// A caller supplied range; falls back to `Auto` when `end <= start`
    Explicit { start: f64, end: f64 },
}

impl ScanWindow {
    const AUTO_MARGIN: f64 = 0.05;

    /// Concrete range for a video of the given duration
    pub fn resolve(&self, duration: f64) -> TimestampRange {
        let duration = duration.max(0.0);
        match *self {
            Self::Full => TimestampRange { start: 0.0, end: duration },
            Self::Auto => TimestampRange {
                start: duration * Self::AUTO_MARGIN,
                end: duration * (1.0 - Self::AUTO_MARGIN),
            },
            Self::Explicit { start, end } if end > start => TimestampRange {
                start: start.clamp(0.0, duration),
                end: end.clamp(0.0, duration),
            },
            Self::Explicit { .. } => Self::Auto.resolve(duration),
        }
    }
}

/// One decoded frame and the grid timestamp it was sampled for
#[derive(Debug, Clone)]
pub struct SampledFrame {
    pub timestamp: f64,
    pub image: RgbImage,
}

/// Lazy, ordered walk over a video at a fixed rate. Timestamps lie on the
/// grid `k / rate` up to and including the duration, restricted to the scan
/// window. Each frame is seeked and captured only when the iterator is
/// advanced; nothing is decoded ahead.
///
/// A frame that cannot be read yields `SampleError::Frame` carrying its grid
/// timestamp and the walk continues. A failure
/// past the last decodable frame ends the walk instead.
pub struct VideoFrameSampler<'a, S: VideoSource + ?Sized> {
    source: &'a mut S,
    rate: f64,
    retry: RetryPolicy,
    next_index: u64,
    last_index: Option<u64>,
    finished: bool,
}

impl<'a, S: VideoSource + ?Sized> VideoFrameSampler<'a, S> {
    pub fn new(source: &'a mut S, rate: f64) -> Result<Self> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(SampleError::InvalidRate(rate));
        }
        let mut sampler = Self {
            source,
            rate,
            retry: RetryPolicy::none(),
            next_index: 0,
            last_index: None,
            finished: false,
        };
        sampler.set_window(ScanWindow::Full);
        Ok(sampler)
    }

    pub fn with_window(mut self, window: ScanWindow) -> Self {
        self.set_window(window);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn set_window(&mut self, window: ScanWindow) {
        const EPS: f64 = 1e-9;
        let range = window.resolve(self.source.metadata().duration);
        let first = (range.start * self.rate - EPS).ceil().max(0.0) as u64;
        let last = (range.end * self.rate + EPS).floor();
        self.next_index = first;
        self.last_index = (last >= first as f64).then_some(last as u64);
    }

    /// Timestamps still to be sampled
    pub fn remaining(&self) -> usize {
        match self.last_index {
            Some(last) if !self.finished && self.next_index <= last => (last - self.next_index + 1) as usize,
            _ => 0,
        }
    }

    fn timestamp(&self, index: u64) -> f64 {
        index as f64 / self.rate
    }

    fn read(&mut self, timestamp: f64) -> Result<RgbImage> {
        let source = &mut *self.source;
        self.retry.run("seek", |_| {
            source.seek(timestamp)?;
            source.capture()
        })
    }
}

impl<S: VideoSource + ?Sized> Iterator for VideoFrameSampler<'_, S> {
    type Item = Result<SampledFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        let last = self.last_index?;
        if self.finished || self.next_index > last {
            return None;
        }

        let timestamp = self.timestamp(self.next_index);
        self.next_index += 1;

        match self.read(timestamp) {
            Ok(image) => Some(Ok(SampledFrame { timestamp, image })),
            Err(error) if timestamp > self.source.metadata().last_frame_time() => {
                debug!(time = timestamp, %error, "no frame past the end of the video, stopping");
                self.finished = true;
                None
            }
            Err(error) => {
                warn!(time = timestamp, %error, "could not read frame");
                Some(Err(SampleError::Frame {
                    time: timestamp,
                    source: Box::new(error),
                }))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining()))
    }
}
