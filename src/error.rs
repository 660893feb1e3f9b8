//! Typed failures of the processing stages
//!
//! The stages return these instead of aborting; only the pipeline decides
//! which ones are fatal for a run.

use thiserror::Error;

/// Cover normalization failure. Callers treat the cover as absent.
#[derive(Debug, Error)]
pub enum ImageProcessingError {
    #[error("thumbnail request failed: {0}")]
    Fetch(String),

    #[error("failed to read thumbnail: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to decode thumbnail: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode cover: {0}")]
    Encode(#[source] image::ImageError),

    #[error("thumbnail is empty")]
    Empty,
}

/// Container tagging failure for the textual tags
#[derive(Debug, Error)]
pub enum TagWriteError {
    #[error("unreadable audio container: {0}")]
    Open(#[source] lofty::error::LoftyError),

    #[error("container does not support {0} tags")]
    Unsupported(String),

    #[error("failed to save tags: {0}")]
    Save(#[source] lofty::error::LoftyError),
}

/// Run-level failure. The message is user-facing and never names scratch paths.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("acquisition failed: {0}")]
    Acquisition(String),

    #[error("tagging failed: {0}")]
    TagWrite(#[from] TagWriteError),

    #[error("could not finalize output file: {0}")]
    Finalize(String),
}
