//! Structured error type for the data preparation operations.

use thiserror::Error;

/// Result type for batch assembly and embedding construction.
pub type PrepResult<T> = Result<T, PrepError>;

#[derive(Error, Debug)]
pub enum PrepError {
    /// The corpus holds no examples, so there is no sequence length to pad to.
    #[error("Corpus contains no examples")]
    EmptyCorpus,

    /// A corpus label key that does not parse as a class index.
    #[error("Invalid label key {key:?}: expected a non-negative class index")]
    MalformedLabel { key: String },

    /// Label keys are not the consecutive range `0..K`.
    #[error("Corpus has no examples for class {missing}; labels must be consecutive from 0")]
    LabelGap { missing: usize },

    /// The pretrained table has no entry for a vocabulary token.
    #[error("No pretrained vector for token {token:?}")]
    MissingVector { token: String },

    /// A pretrained vector whose length differs from the embedding width.
    #[error("Vector for {token:?} has {actual} dimensions, expected {expected}")]
    DimensionMismatch {
        token: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid array shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
}
