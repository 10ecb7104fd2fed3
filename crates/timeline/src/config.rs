use std::fs;
use std::path::Path;

use outline::SegmentationConfig;
use sampling::ScanWindow;
use schemars::JsonSchema;
use scope_common::RetryPolicy;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TimelineError};

/// Every tunable of a video scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ScanConfig {
    /// Samples per second of video
    pub sample_rate: f64,
    /// Width of the centred rolling mean in the report, in samples
    pub smoothing_window: usize,
    /// Re-read the smallest and largest frames and embed them as JPEG
    pub capture_snapshots: bool,
    pub window: ScanWindow,
    pub segmentation: SegmentationConfig,
    /// Applied at the classifier call and the video seek
    pub retry: RetryPolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            sample_rate: 1.0,
            smoothing_window: 15,
            capture_snapshots: true,
            window: ScanWindow::default(),
            segmentation: SegmentationConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(TimelineError::InvalidConfig(format!(
                "sample_rate must be positive, got {}",
                self.sample_rate
            )));
        }
        let threshold = self.segmentation.threshold;
        if !(0.0..1.0).contains(&threshold) {
            return Err(TimelineError::InvalidConfig(format!(
                "threshold must be in [0, 1), got {threshold}"
            )));
        }
        if self.segmentation.inference_size < 3 {
            return Err(TimelineError::InvalidConfig(
                "inference_size must be at least 3".to_string(),
            ));
        }
        Ok(())
    }

    /// Load from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ScanConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        let config: ScanConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&fs::read_to_string(path)?),
            Some("json") => Self::from_json(&fs::read_to_string(path)?),
            _ => Err(TimelineError::UnsupportedFileFormat),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ScanConfig)
    }
}
