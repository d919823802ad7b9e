use thiserror::Error;

use crate::core::video::VideoError;

#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("Unknown suggestion method: {0}")]
    UnknownStrategy(String),
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),
    #[error("Invalid value for parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("Requested {requested} frames but video only has {available}")]
    InsufficientFrames { requested: usize, available: usize },
    #[error("Degenerate stride: {frame_count} frames cannot be split into {divisor} samples")]
    DegenerateStride { frame_count: usize, divisor: usize },
    #[error("No features extracted from sampled frames")]
    EmptyFeatureStack,
    #[error("Too few samples ({samples}) for {clusters} clusters")]
    TooFewSamples { samples: usize, clusters: usize },
    #[error("Method requires a labeled dataset")]
    MissingLabels,
    #[error("Feature matrix error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("Video error: {0}")]
    Video(#[from] VideoError),
}

impl SuggestionError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        SuggestionError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
