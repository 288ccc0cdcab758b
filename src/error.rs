use std::io;

use tch::TchError;
use thiserror::Error;

/// Main library error type.
#[derive(Error, Debug)]
pub enum AdaptError {
    /// A backbone or head name that the registry does not know.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// The number of tensors passed to a multi-input layer does not match
    /// the number of sources it was built for.
    #[error("expected {expected} input tensors, got {actual}")]
    InputCount { expected: usize, actual: usize },

    /// A multi-input layer was called without any input.
    #[error("at least one input tensor is required")]
    EmptyInput,

    /// I/O error.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Configuration (de)serialization error.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors returned by tch / the Torch C++ API.
    #[error(transparent)]
    Torch(#[from] TchError),
}

pub type Result<T> = std::result::Result<T, AdaptError>;
