use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the training pipeline, the artifact store and the detector.
#[derive(Debug, Error)]
pub enum SpamError {
    #[error("dataset not found at {0:?}")]
    DatasetNotFound(PathBuf),

    #[error("malformed dataset: {0}")]
    DatasetFormatError(String),

    #[error("artifact missing at {0:?}")]
    ArtifactMissing(PathBuf),

    #[error("artifact at {path:?} is corrupt: {reason}")]
    ArtifactCorrupt { path: PathBuf, reason: String },

    #[error("vectorizer produced an empty vocabulary")]
    EmptyVocabulary,

    #[error("invalid training input: {0}")]
    InvalidTraining(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Encode(#[from] rmp_serde::encode::Error),

    #[error(transparent)]
    Linfa(#[from] linfa::Error),
}

pub type Result<T> = std::result::Result<T, SpamError>;
