//! # Scope Common - Shared Types and Utilities
//!
//! Value types shared by the outline, sampling and timeline crates: pixel
//! coordinates, time ranges, video metadata, the cooperative cancel flag and
//! the retry policy applied at the stalling boundaries (classifier calls and
//! video seeks).
//!
//! ## Example
//!
//! ```rust
//! use scope_common::{Point2D, TimestampRange};
//!
//! let range = TimestampRange::new(1.0, 4.5).unwrap();
//! assert!(range.contains(2.0));
//!
//! let p = Point2D::new(3.0, 4.0);
//! assert_eq!(p.distance_to(Point2D::new(0.0, 0.0)), 5.0);
//! ```

pub mod process;
pub mod retry;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use retry::RetryPolicy;

/// Result type for shared helpers
pub type Result<T> = std::result::Result<T, CommonError>;

#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Invalid time range: start {start} >= end {end}")]
    InvalidTimeRange { start: f64, end: f64 },

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },

    #[error("Process timed out after {millis} ms: {program}")]
    Timeout { program: String, millis: u128 },

    #[error("Process {program} exited with {status}: {stderr}")]
    ProcessFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// A time range with start and end timestamps in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimestampRange {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
}

impl TimestampRange {
    pub fn new(start: f64, end: f64) -> Result<Self> {
        if start >= end {
            return Err(CommonError::InvalidTimeRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Inclusive on both ends
    pub fn contains(&self, timestamp: f64) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}

/// Floating-point pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Multiply each axis independently, used to move between mask space
    /// and source-pixel space
    pub fn scale(self, sx: f64, sy: f64) -> Self {
        Self {
            x: self.x * sx,
            y: self.y * sy,
        }
    }

    /// Nearest integer pixel
    pub fn round(self) -> (i64, i64) {
        (self.x.round() as i64, self.y.round() as i64)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Video metadata information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoMetadata {
    /// Duration in seconds
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    /// Frame rate (frames per second)
    pub framerate: f64,
    /// Video codec (e.g., "h264", "hevc")
    pub codec: Option<String>,
}

impl VideoMetadata {
    /// Timestamp of the last decodable frame
    pub fn last_frame_time(&self) -> f64 {
        if self.framerate > 0.0 {
            (self.duration - 1.0 / self.framerate).max(0.0)
        } else {
            self.duration
        }
    }
}

/// Cooperative cancellation flag shared between a running scan and whoever
/// wants to stop it. Polled once per sampled frame.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Utility functions for time formatting
pub mod utils {
    use super::*;

    /// Format seconds as HH:MM:SS.mmm
    pub fn format_timestamp(seconds: f64) -> String {
        let total_seconds = seconds as u64;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let secs = total_seconds % 60;
        let millis = ((seconds - total_seconds as f64) * 1000.0).round() as u32;

        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
    }

    /// Parse timestamp from HH:MM:SS(.mmm), MM:SS or plain seconds
    pub fn parse_timestamp(timestamp: &str) -> Result<f64> {
        let parts: Vec<&str> = timestamp.split(':').collect();
        let field = |s: &str, what: &str| -> Result<f64> {
            s.trim()
                .parse::<f64>()
                .map_err(|_| CommonError::Parse(format!("Invalid {}: {}", what, s)))
        };

        match parts.as_slice() {
            [secs] => field(secs, "seconds"),
            [mins, secs] => Ok(field(mins, "minutes")? * 60.0 + field(secs, "seconds")?),
            [hours, mins, secs] => Ok(field(hours, "hours")? * 3600.0
                + field(mins, "minutes")? * 60.0
                + field(secs, "seconds")?),
            _ => Err(CommonError::Parse(
                "Invalid timestamp format. Expected HH:MM:SS, MM:SS or seconds".to_string(),
            )),
        }
    }

    /// Round to a fixed number of decimals
    pub fn round_to(value: f64, decimals: i32) -> f64 {
        let factor = 10f64.powi(decimals);
        (value * factor).round() / factor
    }
}
