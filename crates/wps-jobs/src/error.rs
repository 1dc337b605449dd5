//! Error types for the WPS job crate.

use thiserror::Error;
use wps_protocol::TemplateError;

/// Why a job could not be submitted.
///
/// Submission never panics or propagates a transport error: every failure
/// mode ends up as one of these values, with credentials already redacted.
#[derive(Error, Debug)]
pub enum SubmissionFailure {
    #[error("failed to render payload: {0}")]
    Render(#[from] TemplateError),

    #[error("WPS submission raised a connection error: {0}")]
    Transport(String),

    #[error("WPS submission response is not successful: status {status}")]
    Status { status: u16, body: String },

    #[error("WPS server responded with an exception: {0}")]
    ServiceException(String),

    #[error("WPS submission response carries no executionId: {0}")]
    MissingExecutionId(String),
}

/// Failure while extracting or renaming a downloaded result.
#[derive(Error, Debug)]
pub enum PostProcessError {
    #[error("downloaded file is missing")]
    MissingDownload,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Failure of the batch runner itself, as opposed to one of its jobs.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write job log: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for batch operations.
pub type Result<T> = std::result::Result<T, JobError>;
