use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutlineError {
    /// The seed color or the mask has no matching region
    #[error("No matching region: {0}")]
    NoMatch(String),

    /// Fewer than three boundary points, no polygon can be formed
    #[error("No closed region: only {points} boundary points")]
    DegenerateRegion { points: usize },

    /// The classifier failed to initialise; fatal to mask-based modes only
    #[error("Classifier unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Invalid mask: {0}")]
    InvalidMask(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] scope_common::CommonError),
}

pub type Result<T> = std::result::Result<T, OutlineError>;
