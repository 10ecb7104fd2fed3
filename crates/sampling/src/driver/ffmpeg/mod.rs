use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use image::{ImageFormat, RgbImage};
use scope_common::{VideoMetadata, process::run_with_deadline};
use serde::Deserialize;
use tracing::debug;

use crate::driver::{VideoSource, clamp_seek};
use crate::{Result, SampleError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Video file decoded one frame at a time by spawning FFmpeg. Metadata is
/// read once with ffprobe when the source is opened.
#[derive(Debug, Clone)]
pub struct FfmpegSource {
    path: PathBuf,
    ffmpeg_path: String,
    metadata: VideoMetadata,
    position: f64,
    timeout: Duration,
}

impl FfmpegSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let ffmpeg_path = find_executable("ffmpeg")?;
        let ffprobe_path = find_executable("ffprobe")?;
        Self::open_with(path, ffmpeg_path, ffprobe_path)
    }

    pub fn open_with(
        path: impl AsRef<Path>,
        ffmpeg_path: impl Into<String>,
        ffprobe_path: impl AsRef<str>,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(SampleError::Initialization(format!(
                "Input file not found: {}",
                path.display()
            )));
        }

        let metadata = probe(ffprobe_path.as_ref(), &path, DEFAULT_TIMEOUT)?;
        debug!(
            path = %path.display(),
            duration = metadata.duration,
            width = metadata.width,
            height = metadata.height,
            "opened video"
        );

        Ok(Self {
            path,
            ffmpeg_path: ffmpeg_path.into(),
            metadata,
            position: 0.0,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Upper bound for a single frame decode
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn build_capture_command(&self) -> Command {
        let mut cmd = Command::new(&self.ffmpeg_path);
        // Input seeking: -ss before -i decodes from the nearest keyframe up
        // to the exact position
        cmd.args(["-v", "error", "-ss", &format!("{:.3}", self.position), "-i"])
            .arg(&self.path)
            .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "-"]);
        cmd
    }
}

impl VideoSource for FfmpegSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn seek(&mut self, timestamp: f64) -> Result<f64> {
        if !timestamp.is_finite() {
            return Err(SampleError::MediaSeek {
                time: timestamp,
                reason: "timestamp is not finite".to_string(),
            });
        }
        self.position = clamp_seek(&self.metadata, timestamp);
        Ok(self.position)
    }

    fn capture(&mut self) -> Result<RgbImage> {
        let time = self.position;
        let output = run_with_deadline(self.build_capture_command(), None, self.timeout).map_err(|e| {
            SampleError::MediaSeek {
                time,
                reason: e.to_string(),
            }
        })?;

        if output.stdout.is_empty() {
            return Err(SampleError::MediaSeek {
                time,
                reason: "no frame decoded at this position".to_string(),
            });
        }

        Ok(image::load_from_memory_with_format(&output.stdout, ImageFormat::Png)?.to_rgb8())
    }

    fn description(&self) -> String {
        format!("FFmpeg File Source: {}", self.path.display())
    }
}

/// Locate an FFmpeg tool, trying PATH first and then common install
/// locations
pub fn find_executable(name: &str) -> Result<String> {
    if let Ok(output) = Command::new("which").arg(name).output() {
        if output.status.success() {
            let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !path.is_empty() {
                return Ok(path);
            }
        }
    }

    for dir in ["/usr/bin", "/usr/local/bin", "/opt/homebrew/bin"] {
        let candidate = Path::new(dir).join(name);
        if candidate.exists() {
            return Ok(candidate.to_string_lossy().to_string());
        }
    }

    Err(SampleError::Initialization(format!(
        "{name} executable not found. Please install FFmpeg or specify the path."
    )))
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    codec_name: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

fn probe(ffprobe_path: &str, path: &Path, timeout: Duration) -> Result<VideoMetadata> {
    let mut cmd = Command::new(ffprobe_path);
    cmd.args([
        "-v", "error",
        "-select_streams", "v:0",
        "-show_entries", "stream=width,height,r_frame_rate,avg_frame_rate,codec_name,duration:format=duration",
        "-of", "json",
    ])
    .arg(path);

    let output = run_with_deadline(cmd, None, timeout)?;
    parse_probe(&output.stdout)
}

/// Turn ffprobe's JSON report into [`VideoMetadata`]
pub fn parse_probe(json: &[u8]) -> Result<VideoMetadata> {
    let report: ProbeOutput = serde_json::from_slice(json)?;
    let stream = report
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| SampleError::Probe("no video stream".to_string()))?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(SampleError::Probe("video stream has no dimensions".to_string())),
    };

    let duration = report
        .format
        .and_then(|f| f.duration)
        .or(stream.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| SampleError::Probe("unknown duration".to_string()))?;

    let framerate = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .unwrap_or(0.0);

    Ok(VideoMetadata {
        duration,
        width,
        height,
        framerate,
        codec: stream.codec_name,
    })
}

/// Parse an ffprobe rational such as `30000/1001` or a plain number
pub fn parse_frame_rate(value: &str) -> Option<f64> {
    let rate = match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => value.trim().parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("25/1"), Some(25.0));
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert_eq!(parse_frame_rate("24"), Some(24.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("abc"), None);
    }

    #[test]
    fn test_parse_probe() {
        let json = br#"{
            "programs": [],
            "streams": [{
                "codec_name": "h264",
                "width": 1280,
                "height": 720,
                "r_frame_rate": "30/1",
                "avg_frame_rate": "0/0"
            }],
            "format": { "duration": "12.480000" }
        }"#;
        let metadata = parse_probe(json).unwrap();
        assert_eq!(metadata.width, 1280);
        assert_eq!(metadata.height, 720);
        assert_eq!(metadata.duration, 12.48);
        assert_eq!(metadata.framerate, 30.0);
        assert_eq!(metadata.codec.as_deref(), Some("h264"));
    }

    #[test]
    fn test_parse_probe_stream_duration_fallback() {
        let json = br#"{"streams": [{"width": 2, "height": 2, "duration": "3.0"}]}"#;
        let metadata = parse_probe(json).unwrap();
        assert_eq!(metadata.duration, 3.0);
        assert_eq!(metadata.framerate, 0.0);
    }

    #[test]
    fn test_parse_probe_without_video() {
        let json = br#"{"streams": [], "format": {"duration": "1.0"}}"#;
        assert!(matches!(parse_probe(json), Err(SampleError::Probe(_))));
    }

    #[test]
    fn test_open_missing_file() {
        let result = FfmpegSource::open_with("/definitely/not/here.mp4", "ffmpeg", "ffprobe");
        assert!(matches!(result, Err(SampleError::Initialization(_))));
    }
}
