use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimelineError {
    #[error("Need at least 2 records with a positive area, found {valid}")]
    InputExhausted { valid: usize },

    #[error(transparent)]
    Outline(#[from] outline::OutlineError),

    #[error(transparent)]
    Sample(#[from] sampling::SampleError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Snapshot failed: {0}")]
    Snapshot(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

pub type Result<T> = std::result::Result<T, TimelineError>;
