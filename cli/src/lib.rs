use std::fs;
use std::path::Path;
use std::time::Duration;

use outline::{ClassifierHandle, CommandClassifier, SegmentCommand};
use sampling::ScanWindow;
use scope_common::{CommonError, TimestampRange, utils::parse_timestamp};
use serde_json::json;
use thiserror::Error;
use timeline::{ScanConfig, TimelineError};

#[derive(Error, Debug)]
pub enum ScopeError {
    #[error(transparent)]
    Timeline(#[from] TimelineError),
    #[error(transparent)]
    Common(#[from] CommonError),
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Invalid colour '{0}', expected r,g,b with values 0-255")]
    InvalidColor(String),
    #[error("Empty classifier command")]
    EmptyCommand,
}

pub type Result<T> = std::result::Result<T, ScopeError>;

/// Parse `r,g,b`
pub fn parse_color(value: &str) -> Result<[u8; 3]> {
    let channels: Vec<u8> = value
        .split(',')
        .map(|c| c.trim().parse::<u8>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| ScopeError::InvalidColor(value.to_string()))?;
    channels
        .try_into()
        .map_err(|_| ScopeError::InvalidColor(value.to_string()))
}

/// Scan configuration from a `.toml`/`.json` file, or the defaults
pub fn load_scan_config(path: Option<&Path>) -> Result<ScanConfig> {
    match path {
        Some(path) => Ok(ScanConfig::from_file(path)?),
        None => Ok(ScanConfig::default()),
    }
}

/// Explicit scan window from two timestamps (`HH:MM:SS.mmm`, `MM:SS` or
/// seconds). Rejects an empty or inverted range.
pub fn parse_window(start: &str, end: &str) -> Result<ScanWindow> {
    let range = TimestampRange::new(parse_timestamp(start)?, parse_timestamp(end)?)?;
    Ok(ScanWindow::Explicit {
        start: range.start,
        end: range.end,
    })
}

/// Classifier handle for a whitespace-separated command line. A missing
/// command or program leaves the handle unavailable.
pub fn command_classifier(command: Option<&str>, timeout: Duration) -> ClassifierHandle {
    let Some(command) = command else {
        return ClassifierHandle::unavailable("no classifier command given (use --classifier)");
    };
    ClassifierHandle::load(|| {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| ScopeError::EmptyCommand.to_string())?;
        CommandClassifier::new(program, parts.collect(), timeout).map_err(|e| e.to_string())
    })
}

/// JSON schemas of the scan configuration and the segment command
pub fn schemas() -> serde_json::Value {
    json!({
        "scan_config": ScanConfig::schema(),
        "segment_command": SegmentCommand::schema(),
    })
}

/// Write `content` to `path`, creating parent directories
pub fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content)?;
    Ok(())
}
